//! Beacon client: connection session with automatic reconnection, plus the
//! interactive CLI built on top of it.

pub mod backoff;
mod command;
pub mod error;
mod formatter;
mod runner;
pub mod session;
pub mod status;
pub mod transport;
mod ui;

pub use backoff::ReconnectPolicy;
pub use error::ClientError;
pub use runner::{ClientConfig, run_client};
pub use session::{ClientSession, SessionConfig, SessionEvent};
pub use status::{ConnectionStatus, SessionState};
