//! Shared fixture for handler tests.

use std::collections::VecDeque;

use tokio::sync::mpsc;

use super::{Context, Registry};
use crate::config::Texts;
use crate::db::Database;
use crate::dispatcher::{Delegate, InboundEvent};
use crate::security::cheap_credentials;
use crate::state::{ConnectionId, World, sample_world};

pub(crate) struct Fixture {
    pub world: World,
    pub work: Delegate,
    pub texts: Texts,
    pub registry: Registry,
    pub followups: VecDeque<InboundEvent>,
    pub events: mpsc::Receiver<InboundEvent>,
    pub conn: ConnectionId,
}

impl Fixture {
    pub async fn new() -> Self {
        let db = Database::new(":memory:").await.unwrap();
        let (tx, events) = mpsc::channel(16);
        Self {
            world: sample_world(),
            work: Delegate::new(db, cheap_credentials(), tx),
            texts: Texts::default(),
            registry: Registry::new(),
            followups: VecDeque::new(),
            events,
            conn: ConnectionId::from_raw(1),
        }
    }

    /// Interpret `line` as `actor` and return what the actor was sent.
    pub fn run(&mut self, actor: &str, line: &str) -> String {
        let mut ctx = Context {
            conn: self.conn,
            actor,
            world: &mut self.world,
            work: &self.work,
            texts: &self.texts,
            commands: self.registry.names(),
            followups: &mut self.followups,
        };
        let _ = self.registry.dispatch(&mut ctx, line);
        self.output(actor)
    }

    /// Drain buffered output for `key`.
    pub fn output(&mut self, key: &str) -> String {
        self.world
            .session_mut(key)
            .and_then(|s| s.output.take_all())
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .unwrap_or_default()
    }
}
