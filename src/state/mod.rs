//! State management module.
//!
//! Everything here is owned by the dispatcher: connection phases, sessions,
//! their output buffers and the world they play in.

mod machine;
pub mod names;
mod output;
mod session;
mod tables;
mod uid;
mod world;

pub use machine::ConnectionState;
pub use output::{OutputBuffer, Overflow};
pub use session::Session;
pub use tables::{Choice, ChoiceTable, Tables};
pub use uid::{ConnectionId, ConnectionIdGenerator};
pub use world::{Room, World};

#[cfg(test)]
pub(crate) use session::sample_session;
#[cfg(test)]
pub(crate) use tables::sample_tables;
#[cfg(test)]
pub(crate) use world::sample_world;
