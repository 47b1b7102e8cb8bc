//! Beacon push-notification relay server.
//!
//! Keeps a registry of live WebSocket connections and their group memberships,
//! generates status messages in the background and fans them out to every
//! connection (or to the members of a named group).

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
