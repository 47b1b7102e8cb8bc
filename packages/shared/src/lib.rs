//! Utilities shared by the Beacon server and client crates.

pub mod buffer;
pub mod logger;
pub mod time;
