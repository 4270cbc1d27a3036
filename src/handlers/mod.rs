//! Command handlers.
//!
//! Once a connection is `Playing`, every line it sends is interpreted here:
//! the first word picks a handler from the [`Registry`] and the rest of the
//! line becomes its arguments. Handlers run synchronously inside the
//! dispatcher and write to sessions through the [`Context`].

mod comm;
mod core;
mod info;
mod session;
#[cfg(test)]
mod testing;

pub use self::core::{Context, Handler, HandlerError, HandlerResult, Registry};
