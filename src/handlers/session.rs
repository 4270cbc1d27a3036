//! Session commands: save and quit.

use super::{Context, Handler, HandlerResult};
use crate::dispatcher::InboundEvent;

/// `save`: persist the current location. `Saved.` arrives when the write
/// completes.
pub struct SaveHandler;

impl Handler for SaveHandler {
    fn handle(&self, ctx: &mut Context<'_>, _args: &str) -> HandlerResult {
        let session = ctx.session()?;
        ctx.work
            .save_location(ctx.conn, session.identity_id, session.room_id);
        Ok(())
    }
}

/// `quit`: leave the game. The dispatcher does the rest once this command
/// has finished.
pub struct QuitHandler;

impl Handler for QuitHandler {
    fn handle(&self, ctx: &mut Context<'_>, _args: &str) -> HandlerResult {
        ctx.followups.push_back(InboundEvent::QuitRequested(ctx.conn));
        Ok(())
    }
}
