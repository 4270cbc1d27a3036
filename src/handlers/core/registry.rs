//! Command handler registry and dispatch.

use std::collections::HashMap;

use tracing::debug;

use super::context::{Context, Handler, HandlerResult};
use crate::handlers::{
    comm::{OocHandler, SayHandler},
    info::{HelpHandler, LookHandler, ScoreHandler, TimeHandler, WhoHandler},
    session::{QuitHandler, SaveHandler},
};
use crate::telemetry::{CommandTimer, spans};

/// Registry of command handlers.
pub struct Registry {
    handlers: HashMap<&'static str, Box<dyn Handler>>,
    /// Hidden short forms, mapped to the command they stand for.
    aliases: HashMap<&'static str, &'static str>,
    /// Visible command names, sorted.
    names: Vec<&'static str>,
}

impl Registry {
    /// Create a new registry with all handlers registered.
    pub fn new() -> Self {
        let mut handlers: HashMap<&'static str, Box<dyn Handler>> = HashMap::new();

        // Information
        handlers.insert("look", Box::new(LookHandler));
        handlers.insert("who", Box::new(WhoHandler));
        handlers.insert("score", Box::new(ScoreHandler));
        handlers.insert("time", Box::new(TimeHandler));
        handlers.insert("help", Box::new(HelpHandler));

        // Communication
        handlers.insert("say", Box::new(SayHandler));
        handlers.insert("ooc", Box::new(OocHandler));

        // Session
        handlers.insert("save", Box::new(SaveHandler));
        handlers.insert("quit", Box::new(QuitHandler));

        let aliases = HashMap::from([("l", "look")]);

        let mut names: Vec<_> = handlers.keys().copied().collect();
        names.sort_unstable();

        Self {
            handlers,
            aliases,
            names,
        }
    }

    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    /// Resolve a lower-cased token to a command name and its handler.
    fn resolve(&self, token: &str) -> Option<(&'static str, &dyn Handler)> {
        let token = self.aliases.get(token).copied().unwrap_or(token);
        self.handlers
            .get_key_value(token)
            .map(|(name, handler)| (*name, handler.as_ref()))
    }

    /// Interpret one line: the first word picks the handler, the rest are
    /// its arguments joined by single spaces.
    pub fn dispatch(&self, ctx: &mut Context<'_>, line: &str) -> HandlerResult {
        let mut words = line.split_whitespace();
        let Some(first) = words.next() else {
            return Ok(());
        };
        let token = first.to_lowercase();
        let args = words.collect::<Vec<_>>().join(" ");

        let Some((name, handler)) = self.resolve(&token) else {
            ctx.reply(&format!("Alas, there is no such command: {token}.\r\n"));
            crate::metrics::record_command_error("unknown", "unknown_command");
            return Ok(());
        };

        let _span = spans::command(name, ctx.actor).entered();
        let _timer = CommandTimer::new(name);

        let result = handler.handle(ctx, &args);

        if let Err(ref e) = result {
            crate::metrics::record_command_error(name, e.error_code());
            debug!(command = name, error = %e, "Command error");
            if let Some(reply) = e.to_reply() {
                ctx.reply(&reply);
            }
        }

        result
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
