//! Command handler context and core types.

use std::collections::VecDeque;

use crate::config::Texts;
use crate::dispatcher::{Delegate, InboundEvent};
use crate::state::{ConnectionId, Session, World};

pub use crate::error::{HandlerError, HandlerResult};

/// A command handler.
///
/// Handlers run inside the dispatcher and must not block; anything slow
/// goes through [`Context::work`].
pub trait Handler: Send + Sync {
    fn handle(&self, ctx: &mut Context<'_>, args: &str) -> HandlerResult;
}

/// Everything a handler may touch while interpreting one command.
pub struct Context<'a> {
    /// Connection the command arrived on.
    pub conn: ConnectionId,
    /// World key of the acting session.
    pub actor: &'a str,
    pub world: &'a mut World,
    pub work: &'a Delegate,
    pub texts: &'a Texts,
    /// Visible command names, for `help`.
    pub commands: &'a [&'static str],
    /// Events to process after this one, in order.
    pub followups: &'a mut VecDeque<InboundEvent>,
}

impl Context<'_> {
    /// The acting session.
    pub fn session(&self) -> Result<&Session, HandlerError> {
        self.world.session(self.actor).ok_or(HandlerError::NoSession)
    }

    /// Buffer text for the acting session.
    pub fn reply(&mut self, text: &str) {
        self.world.send(self.actor, text);
    }
}
