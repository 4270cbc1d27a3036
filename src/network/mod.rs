//! Network module.
//!
//! Contains the Gateway (TCP listener) and the per-connection I/O pair.

mod connection;
mod gateway;

pub use connection::{Connection, ConnectionHandle};
pub use gateway::Gateway;
