//! UI layer: axum router, WebSocket and HTTP handlers, server lifecycle.

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::Server;
pub use state::AppState;
