//! Core handler infrastructure: the handler trait, its context and the
//! registry that maps command words to handlers.

pub mod context;
pub mod registry;

pub use context::{Context, Handler, HandlerError, HandlerResult};
pub use registry::Registry;
