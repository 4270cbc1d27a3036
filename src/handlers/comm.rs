//! Talking to other players.

use super::{Context, Handler, HandlerError, HandlerResult};

/// `say <text>`: speak to the room.
pub struct SayHandler;

impl Handler for SayHandler {
    fn handle(&self, ctx: &mut Context<'_>, args: &str) -> HandlerResult {
        if args.is_empty() {
            return Err(HandlerError::MissingArgument("Say what?"));
        }
        let session = ctx.session()?;
        let room_id = session.room_id;
        let heard = format!("{} says, '{args}'\r\n", session.name);

        ctx.reply(&format!("You say, '{args}'\r\n"));
        ctx.world.send_to_room(room_id, Some(ctx.actor), &heard);
        Ok(())
    }
}

/// `ooc <text>`: out-of-character chat to everyone in the world.
pub struct OocHandler;

impl Handler for OocHandler {
    fn handle(&self, ctx: &mut Context<'_>, args: &str) -> HandlerResult {
        if args.is_empty() {
            return Err(HandlerError::MissingArgument("Say what on the OOC channel?"));
        }
        let line = format!("[OOC] {}: {args}\r\n", ctx.session()?.name);
        ctx.world.send_to_all(None, &line);
        Ok(())
    }
}
