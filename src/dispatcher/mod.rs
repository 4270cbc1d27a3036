//! Dispatcher - the single actor that owns all mutable world state.
//!
//! Connection loops, the flush timer, delegated work and the signal handler
//! feed one [`InboundEvent`] channel. The dispatcher processes events one at
//! a time, so the connection registry, the nanny's per-connection drafts
//! and every session in the [`World`] are touched by exactly one task.
//!
//! ```text
//!  inbound loops ──┐
//!  delegated work ─┼──► inbox ──► Dispatcher ──► ConnectionHandle::send
//!  signal handler ─┘                 ▲
//!                   interval tick ───┘
//! ```

mod events;
mod nanny;
mod work;

pub use events::{Disconnect, InboundEvent, Outcome};
pub use nanny::NAME_PROMPT;
pub use work::Delegate;

use std::collections::{HashMap, VecDeque};
use std::ops::ControlFlow;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use self::nanny::{Draft, Effect, Lobby, Nanny, Transition};
use crate::config::{LimitsConfig, Texts};
use crate::db::Database;
use crate::handlers::{Context, Registry};
use crate::network::ConnectionHandle;
use crate::security::Credentials;
use crate::state::{ConnectionId, ConnectionState, OutputBuffer, Session, Tables, World, names};

/// Appended after every flush of regular session output.
const PROMPT: &str = "\r\n> ";

/// One registered connection.
struct Client {
    handle: ConnectionHandle,
    state: ConnectionState,
    draft: Draft,
    /// World key of the session this connection drives.
    session: Option<String>,
    /// Delegated jobs whose outcome the nanny is waiting on.
    busy: usize,
    /// Lines that arrived while busy, replayed in order.
    deferred: VecDeque<String>,
    connected_at: Instant,
}

impl Client {
    fn new(handle: ConnectionHandle) -> Self {
        Self {
            handle,
            state: ConnectionState::default(),
            draft: Draft::default(),
            session: None,
            busy: 0,
            deferred: VecDeque::new(),
            connected_at: Instant::now(),
        }
    }

    /// True when this connection plays or is logging in as `key`.
    fn bound_to(&self, key: &str) -> bool {
        self.session.as_deref() == Some(key) || self.claims(key)
    }

    fn claims(&self, key: &str) -> bool {
        self.state.holds_name()
            && self
                .draft
                .name
                .as_deref()
                .is_some_and(|name| names::key(name) == key)
    }
}

/// The nanny's read-only view of everyone else.
struct LobbyView<'a> {
    clients: &'a HashMap<ConnectionId, Client>,
    world: &'a World,
}

impl Lobby for LobbyView<'_> {
    fn name_claimed(&self, key: &str, by: ConnectionId) -> bool {
        self.clients
            .iter()
            .any(|(id, client)| *id != by && client.claims(key))
    }

    fn session_live(&self, key: &str) -> bool {
        self.world.contains(key)
    }
}

pub struct Dispatcher {
    inbox: mpsc::Receiver<InboundEvent>,
    /// Events raised while handling another, processed before the next
    /// inbox event.
    followups: VecDeque<InboundEvent>,
    clients: HashMap<ConnectionId, Client>,
    world: World,
    tables: Tables,
    texts: Texts,
    registry: Registry,
    work: Delegate,
    limits: LimitsConfig,
    flush_period: Duration,
}

impl Dispatcher {
    /// Create the dispatcher and the sender every producer uses to reach it.
    pub fn new(
        limits: LimitsConfig,
        flush_period: Duration,
        world: World,
        tables: Tables,
        texts: Texts,
        db: Database,
        credentials: Credentials,
    ) -> (Self, mpsc::Sender<InboundEvent>) {
        let (tx, inbox) = mpsc::channel(limits.inbox_capacity.max(1));
        let dispatcher = Self {
            inbox,
            followups: VecDeque::new(),
            clients: HashMap::new(),
            world,
            tables,
            texts,
            registry: Registry::new(),
            work: Delegate::new(db, credentials, tx.clone()),
            limits,
            flush_period,
        };
        (dispatcher, tx)
    }

    /// Process events until `Shutdown`, then save and close everything.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.flush_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(period_ms = self.flush_period.as_millis() as u64, "Dispatcher started");

        loop {
            let event = tokio::select! {
                event = self.inbox.recv() => event.unwrap_or(InboundEvent::Shutdown),
                _ = ticker.tick() => InboundEvent::Tick,
            };
            if self.process(event).is_break() {
                break;
            }
        }

        self.shutdown().await;
    }

    /// Handle one event and everything it queued behind it.
    fn process(&mut self, event: InboundEvent) -> ControlFlow<()> {
        self.handle(event)?;
        while let Some(next) = self.followups.pop_front() {
            self.handle(next)?;
        }
        self.close_overflowed();
        ControlFlow::Continue(())
    }

    fn handle(&mut self, event: InboundEvent) -> ControlFlow<()> {
        match event {
            InboundEvent::Registered(handle) => self.register(handle),
            InboundEvent::Unregistered(id, reason) => self.unregister(id, reason),
            InboundEvent::LineReceived(id, line) => self.on_line(id, line),
            InboundEvent::Tick => self.flush(),
            InboundEvent::QuitRequested(id) => self.quit(id),
            InboundEvent::Completed(id, outcome) => self.on_completed(id, outcome),
            InboundEvent::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    fn register(&mut self, handle: ConnectionHandle) {
        let id = handle.id();
        debug!(%id, addr = %handle.addr(), "Connection registered");
        let mut client = Client::new(handle);
        client
            .handle
            .send_text(&format!("{}{NAME_PROMPT}", self.texts.greeting));
        client.state = ConnectionState::AwaitingName;
        self.clients.insert(id, client);
    }

    fn unregister(&mut self, id: ConnectionId, reason: Disconnect) {
        let Some(client) = self.clients.remove(&id) else {
            debug!(%id, reason = reason.as_str(), "Connection already dropped");
            return;
        };

        if reason == Disconnect::LineTooLong {
            if let Some(bytes) = client
                .session
                .as_deref()
                .and_then(|key| self.world.session_mut(key))
                .and_then(|session| session.output.take_all())
            {
                client.handle.send(bytes);
            }
            client.handle.send_text("\r\nLine too long.\r\n");
        }
        client.handle.close();
        crate::metrics::record_disconnect(reason.as_str());

        let name = client
            .session
            .as_deref()
            .and_then(|key| self.world.session(key))
            .map(|session| session.name.clone())
            .or_else(|| client.draft.name.clone());
        info!(
            %id,
            addr = %client.handle.addr(),
            name = name.as_deref().unwrap_or("-"),
            reason = reason.as_str(),
            connected_secs = client.connected_at.elapsed().as_secs(),
            "Lost connection"
        );

        self.release_session(id, &client);
    }

    /// Leave the client's session in the world with no connection.
    fn release_session(&mut self, id: ConnectionId, client: &Client) {
        let Some(key) = client.session.as_deref() else {
            return;
        };
        let Some(session) = self.world.session_mut(key) else {
            return;
        };
        if session.connection != Some(id) {
            return;
        }
        session.detach();
        let (identity_id, room_id) = (session.identity_id, session.room_id);
        self.work.persist_location(identity_id, room_id);
    }

    fn on_line(&mut self, id: ConnectionId, line: String) {
        let Some(client) = self.clients.get_mut(&id) else {
            debug!(%id, "Line from unknown connection");
            return;
        };

        if client.busy > 0 {
            if client.deferred.len() < self.limits.pending_lines {
                client.deferred.push_back(line);
            } else {
                warn!(%id, pending = client.deferred.len(), "Input queue full, line dropped");
            }
            return;
        }

        if client.state.is_playing() {
            let key = client.session.clone();
            match key {
                Some(key) => self.on_playing_line(id, &key, &line),
                None => warn!(%id, "Playing connection without a session"),
            }
        } else {
            self.run_nanny(id, |nanny, client| {
                nanny.on_line(client.handle.id(), client.state, &mut client.draft, &line)
            });
        }
    }

    fn on_playing_line(&mut self, id: ConnectionId, key: &str, line: &str) {
        if let Some(session) = self.world.session_mut(key)
            && session.output.is_paging()
        {
            if line.trim().is_empty() {
                session.output.request_next_page();
                return;
            }
            session.output.abandon_pages();
        }
        self.interpret(id, key, line);
    }

    fn interpret(&mut self, id: ConnectionId, key: &str, line: &str) {
        let mut ctx = Context {
            conn: id,
            actor: key,
            world: &mut self.world,
            work: &self.work,
            texts: &self.texts,
            commands: self.registry.names(),
            followups: &mut self.followups,
        };
        // Errors are already reported to the player by the registry.
        let _ = self.registry.dispatch(&mut ctx, line);
    }

    fn on_completed(&mut self, id: ConnectionId, outcome: Outcome) {
        let Some(client) = self.clients.get_mut(&id) else {
            debug!(%id, ?outcome, "Outcome for a departed connection dropped");
            return;
        };
        if outcome.blocks_input() {
            client.busy = client.busy.saturating_sub(1);
        }

        match outcome {
            Outcome::Saved(result) => {
                let key = client.session.clone();
                match result {
                    Ok(()) => {
                        if let Some(key) = key {
                            self.world.send(&key, "Saved.\r\n");
                        }
                    }
                    Err(e) => {
                        warn!(%id, error = %e, "Location save failed");
                        if let Some(key) = key {
                            self.world.send(&key, "Unable to save right now.\r\n");
                        }
                    }
                }
            }
            outcome => self.run_nanny(id, |nanny, client| {
                nanny.on_outcome(client.handle.id(), client.state, &mut client.draft, outcome)
            }),
        }

        self.replay_deferred(id);
    }

    fn replay_deferred(&mut self, id: ConnectionId) {
        loop {
            let Some(client) = self.clients.get_mut(&id) else {
                return;
            };
            if client.busy > 0 {
                return;
            }
            let Some(line) = client.deferred.pop_front() else {
                return;
            };
            self.on_line(id, line);
        }
    }

    /// Run one nanny step for `id` and carry out what it asks for.
    fn run_nanny<F>(&mut self, id: ConnectionId, step: F)
    where
        F: FnOnce(&Nanny<'_>, &mut Client) -> Transition,
    {
        let Some(mut client) = self.clients.remove(&id) else {
            return;
        };

        let transition = {
            let lobby = LobbyView {
                clients: &self.clients,
                world: &self.world,
            };
            let nanny = Nanny {
                tables: &self.tables,
                texts: &self.texts,
                lobby: &lobby,
            };
            step(&nanny, &mut client)
        };

        let Transition {
            next,
            output,
            effects,
        } = transition;
        if client.state != next {
            debug!(%id, from = %client.state, to = %next, "State change");
        }
        client.state = next;
        client.handle.send_text(&output);

        let mut keep = true;
        for effect in effects {
            keep &= self.apply(&mut client, effect);
        }
        if keep {
            self.clients.insert(id, client);
        }
    }

    /// Carry out one effect. Returns false when the connection is done.
    fn apply(&mut self, client: &mut Client, effect: Effect) -> bool {
        let id = client.handle.id();
        if effect.is_delegated() {
            client.busy += 1;
        }

        match effect {
            Effect::LookupIdentity(name) => self.work.lookup_identity(id, name),
            Effect::HashPassword(password) => self.work.hash_password(id, password),
            Effect::VerifyPassword { hash, password } => {
                self.work.verify_password(id, hash, password)
            }
            Effect::CreateIdentity(new) => self.work.create_identity(id, new),
            Effect::EvictOthers(key) => self.evict_others(id, &key),
            Effect::Reattach(key) => return self.reattach(client, key),
            Effect::EnterWorld => return self.enter_world(client),
            Effect::Disconnect => {
                client.handle.close();
                crate::metrics::record_disconnect("login_failed");
                info!(%id, name = ?client.draft.name, "Closing connection from login");
                return false;
            }
        }
        true
    }

    /// Close every other connection bound to `key`.
    fn evict_others(&mut self, id: ConnectionId, key: &str) {
        let victims: Vec<ConnectionId> = self
            .clients
            .iter()
            .filter(|(other, client)| **other != id && client.bound_to(key))
            .map(|(other, _)| *other)
            .collect();

        for victim in victims {
            let Some(client) = self.clients.remove(&victim) else {
                continue;
            };
            info!(%victim, by = %id, name = %key, "Connection displaced by a new login");
            client
                .handle
                .send_text("This character has been claimed by another connection.\r\n");
            client.handle.close();
            crate::metrics::record_disconnect("displaced");
        }
    }

    fn reattach(&mut self, client: &mut Client, key: String) -> bool {
        let id = client.handle.id();
        let Some(session) = self.world.session_mut(&key) else {
            warn!(%id, name = %key, "Session gone before reattach, entering fresh");
            return self.enter_world(client);
        };

        let previous = session.attach(id);
        let (name, room_id, identity_id) = (session.name.clone(), session.room_id, session.identity_id);
        info!(%id, name = %name, previous = ?previous, "Reconnected to session");

        client.session = Some(key.clone());
        client.draft.reset();
        self.world
            .send(&key, "Reconnecting to a session in progress.\r\n");
        self.world
            .send_to_room(room_id, Some(&key), &format!("\r\n{name} has reconnected.\r\n"));
        self.work.touch_login(identity_id);
        true
    }

    fn enter_world(&mut self, client: &mut Client) -> bool {
        let id = client.handle.id();
        let Some(identity) = client.draft.identity.take() else {
            warn!(%id, "Entering the world without an identity");
            client.handle.send_text("\r\nSomething went wrong.\r\n");
            client.handle.close();
            return false;
        };

        let race = self.tables.races.name_of(identity.race_id).unwrap_or("unknown");
        let class = self
            .tables
            .classes
            .name_of(identity.class_id)
            .unwrap_or("unknown");
        let output = OutputBuffer::new(self.limits.output_buffer_capacity, self.limits.page_lines);
        let session = Session::new(&identity, race, class, identity.room_id, id, output);
        let key = self.world.insert(session);
        let room_id = self
            .world
            .session(&key)
            .map_or(self.world.start_room(), |s| s.room_id);

        info!(%id, name = %identity.name, room = room_id, "Entered the game");
        client.session = Some(key.clone());
        client.draft.reset();

        self.world.send_to_room(
            room_id,
            Some(&key),
            &format!("{} has entered the game.\r\n", identity.name),
        );
        self.world.send(
            &key,
            &format!("\r\nYou have entered the world of {}.\r\n", self.texts.world_name),
        );
        self.interpret(id, &key, "look");
        self.work.touch_login(identity.id);
        true
    }

    fn quit(&mut self, id: ConnectionId) {
        let Some(client) = self.clients.remove(&id) else {
            return;
        };

        if let Some(mut session) = client.session.as_deref().and_then(|key| self.world.remove(key)) {
            info!(%id, name = %session.name, "Quit");
            self.work
                .persist_location(session.identity_id, session.room_id);
            self.world.send_to_room(
                session.room_id,
                None,
                &format!("{} has left the game.\r\n", session.name),
            );
            if let Some(bytes) = session.output.take_all() {
                client.handle.send(bytes);
            }
        }

        client
            .handle
            .send_text("\r\nFarewell, and may your travels be safe.\r\n");
        client.handle.close();
        crate::metrics::record_disconnect("quit");
    }

    /// Drain every connected session's buffered output.
    fn flush(&mut self) {
        for session in self.world.sessions_mut() {
            let Some(conn) = session.connection else {
                continue;
            };
            if !session.output.has_pending() {
                continue;
            }
            let Some(client) = self.clients.get(&conn) else {
                continue;
            };
            if client.handle.is_closed() {
                continue;
            }
            if let Some(bytes) = session.output.take_flush(PROMPT) {
                client.handle.send(bytes);
                crate::metrics::output_flushed();
            }
        }
        crate::metrics::set_playing_sessions(self.world.playing_count());
    }

    /// Close connections whose session output overflowed.
    fn close_overflowed(&mut self) {
        for conn in self.world.take_overflowed() {
            let Some(client) = self.clients.remove(&conn) else {
                continue;
            };
            warn!(%conn, addr = %client.handle.addr(), "Closing connection after output overflow");
            client.handle.close();
            crate::metrics::record_disconnect("output_overflow");
            self.release_session(conn, &client);
        }
    }

    async fn shutdown(&mut self) {
        info!(
            connections = self.clients.len(),
            sessions = self.world.sessions().count(),
            "Dispatcher shutting down"
        );

        let locations: Vec<(i64, i64)> = self
            .world
            .sessions()
            .map(|s| (s.identity_id, s.room_id))
            .collect();
        if let Err(e) = self.work.save_all(locations).await {
            error!(error = %e, "Failed to save locations at shutdown");
        }

        for session in self.world.sessions_mut() {
            if let Some(conn) = session.connection
                && let Some(client) = self.clients.get(&conn)
                && let Some(bytes) = session.output.take_all()
            {
                client.handle.send(bytes);
            }
        }
        for (_, client) in self.clients.drain() {
            client
                .handle
                .send_text("\r\nThe world is shutting down. Farewell.\r\n");
            client.handle.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::cheap_credentials;
    use bytes::Bytes;
    use std::net::SocketAddr;
    use tokio::sync::mpsc::UnboundedReceiver;

    const PASSWORD: &str = "hunter22";

    struct Peer {
        id: ConnectionId,
        handle: ConnectionHandle,
        rx: UnboundedReceiver<Bytes>,
    }

    impl Peer {
        /// Everything queued for the wire so far.
        fn drain(&mut self) -> String {
            let mut out = String::new();
            while let Ok(bytes) = self.rx.try_recv() {
                out.push_str(&String::from_utf8_lossy(&bytes));
            }
            out
        }
    }

    async fn dispatcher_with(limits: LimitsConfig) -> Dispatcher {
        let db = Database::new(":memory:").await.unwrap();
        let repo = db.world();
        let world = World::new(repo.load_rooms().await.unwrap(), 1);
        let tables = Tables {
            races: crate::state::ChoiceTable::new(repo.load_races().await.unwrap()),
            classes: crate::state::ChoiceTable::new(repo.load_classes().await.unwrap()),
            start_room: 1,
        };
        let (dispatcher, _tx) = Dispatcher::new(
            limits,
            Duration::from_millis(50),
            world,
            tables,
            Texts::default(),
            db,
            cheap_credentials(),
        );
        dispatcher
    }

    async fn dispatcher() -> Dispatcher {
        dispatcher_with(LimitsConfig::default()).await
    }

    fn connect(d: &mut Dispatcher, n: u64) -> Peer {
        let addr: SocketAddr = format!("127.0.0.1:{}", 40000 + n).parse().unwrap();
        let (handle, rx) = ConnectionHandle::new(ConnectionId::from_raw(n), addr);
        let id = handle.id();
        let _ = d.process(InboundEvent::Registered(handle.clone()));
        Peer { id, handle, rx }
    }

    fn send(d: &mut Dispatcher, peer: &Peer, line: &str) {
        let _ = d.process(InboundEvent::LineReceived(peer.id, line.to_string()));
    }

    /// Feed the next delegated outcome back in.
    async fn settle(d: &mut Dispatcher) {
        let event = tokio::time::timeout(Duration::from_secs(5), d.inbox.recv())
            .await
            .expect("delegated work timed out")
            .expect("inbox closed");
        assert!(matches!(event, InboundEvent::Completed(..)));
        let _ = d.process(event);
    }

    /// Settle until nothing is outstanding for `peer`.
    async fn settle_all(d: &mut Dispatcher, peer: &Peer) {
        while d.clients.get(&peer.id).is_some_and(|c| c.busy > 0) {
            settle(d).await;
        }
    }

    fn tick(d: &mut Dispatcher) {
        let _ = d.process(InboundEvent::Tick);
    }

    /// Walk a fresh connection through character creation into the game.
    async fn create(d: &mut Dispatcher, peer: &Peer, name: &str) {
        send(d, peer, name);
        settle_all(d, peer).await;
        send(d, peer, "y");
        send(d, peer, PASSWORD);
        send(d, peer, PASSWORD);
        settle_all(d, peer).await;
        send(d, peer, "elf");
        send(d, peer, "y");
        send(d, peer, "mage");
        send(d, peer, "y");
        settle_all(d, peer).await;
        send(d, peer, "");
        assert!(d.world.contains(&names::key(name)));
    }

    /// Log an existing identity in on a fresh connection.
    async fn login(d: &mut Dispatcher, peer: &Peer, name: &str) {
        send(d, peer, name);
        settle_all(d, peer).await;
        send(d, peer, PASSWORD);
        settle_all(d, peer).await;
    }

    #[test]
    fn unregistered_clients_start_in_none() {
        let addr: SocketAddr = "127.0.0.1:40000".parse().unwrap();
        let (handle, _rx) = ConnectionHandle::new(ConnectionId::from_raw(1), addr);
        let client = Client::new(handle);
        assert_eq!(client.state, ConnectionState::None);
        assert!(!client.claims("aria"));
    }

    #[tokio::test]
    async fn registration_sends_greeting_and_name_prompt() {
        let mut d = dispatcher().await;
        let mut peer = connect(&mut d, 1);
        let out = peer.drain();
        assert!(out.starts_with(&Texts::default().greeting));
        assert!(out.ends_with(NAME_PROMPT));
        assert_eq!(d.clients[&peer.id].state, ConnectionState::AwaitingName);
    }

    #[tokio::test]
    async fn creation_flow_reaches_the_world() {
        let mut d = dispatcher().await;
        let mut peer = connect(&mut d, 1);
        create(&mut d, &peer, "aria").await;

        let login = peer.drain();
        assert!(login.contains("No adventurer with that name exists.  Create Aria? [y/N] "));
        assert!(login.contains("Creating new character Aria.\r\nPlease choose a password: "));
        assert!(login.contains("Please confirm your password: "));
        assert!(login.contains("Please choose a race from the following options:\r\n"));
        assert!(login.contains("Are you sure you want to be a mage? [y/N] "));
        assert!(login.contains("[ Press return to continue ]"));

        tick(&mut d);
        let entered = peer.drain();
        assert!(entered.starts_with("\r\nYou have entered the world of Golem.\r\n"));
        assert!(entered.contains("Town Square"));
        assert!(entered.ends_with(PROMPT));

        let session = d.world.session("aria").unwrap();
        assert_eq!(session.race, "elf");
        assert_eq!(session.class, "mage");
        assert_eq!(session.connection, Some(peer.id));
    }

    #[tokio::test]
    async fn tick_without_pending_output_writes_nothing() {
        let mut d = dispatcher().await;
        let mut peer = connect(&mut d, 1);
        create(&mut d, &peer, "aria").await;
        tick(&mut d);
        peer.drain();

        tick(&mut d);
        tick(&mut d);
        assert!(peer.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn chunks_flush_in_write_order() {
        let mut d = dispatcher().await;
        let mut peer = connect(&mut d, 1);
        create(&mut d, &peer, "aria").await;
        tick(&mut d);
        peer.drain();

        d.world.send("aria", "X1 X2\r\n");
        d.world.send("aria", "Y1 Y2\r\n");
        tick(&mut d);
        assert_eq!(peer.drain(), format!("X1 X2\r\nY1 Y2\r\n{PROMPT}"));
    }

    #[tokio::test]
    async fn lines_wait_while_work_is_outstanding() {
        let mut d = dispatcher().await;
        let mut peer = connect(&mut d, 1);
        peer.drain();

        send(&mut d, &peer, "aria");
        assert_eq!(d.clients[&peer.id].busy, 1);
        send(&mut d, &peer, "y");
        assert_eq!(d.clients[&peer.id].deferred.len(), 1);
        assert_eq!(peer.drain(), "");

        settle_all(&mut d, &peer).await;
        let out = peer.drain();
        assert!(out.contains("Create Aria? [y/N] "));
        assert!(out.ends_with("Please choose a password: "));
        assert_eq!(d.clients[&peer.id].state, ConnectionState::NewPassword);
    }

    #[tokio::test]
    async fn deferred_lines_beyond_the_limit_are_dropped() {
        let limits = LimitsConfig {
            pending_lines: 2,
            ..LimitsConfig::default()
        };
        let mut d = dispatcher_with(limits).await;
        let peer = connect(&mut d, 1);

        send(&mut d, &peer, "aria");
        for line in ["one", "two", "three"] {
            send(&mut d, &peer, line);
        }
        assert_eq!(
            d.clients[&peer.id].deferred,
            VecDeque::from(["one".to_string(), "two".to_string()])
        );
    }

    #[tokio::test]
    async fn claimed_name_is_refused_on_another_connection() {
        let mut d = dispatcher().await;
        let first = connect(&mut d, 1);
        let mut second = connect(&mut d, 2);
        second.drain();

        send(&mut d, &first, "aria");
        send(&mut d, &second, "ARIA");
        assert_eq!(
            second.drain(),
            format!("That name is already in use, please try another.\r\n\r\n{NAME_PROMPT}")
        );
        assert_eq!(d.clients[&second.id].state, ConnectionState::AwaitingName);
        assert_eq!(d.clients[&second.id].busy, 0);
    }

    #[tokio::test]
    async fn unregister_leaves_session_link_dead() {
        let mut d = dispatcher().await;
        let mut peer = connect(&mut d, 1);
        create(&mut d, &peer, "aria").await;

        let _ = d.process(InboundEvent::Unregistered(peer.id, Disconnect::PeerClosed));
        assert!(peer.handle.is_closed());
        assert!(!d.clients.contains_key(&peer.id));
        assert!(d.world.session("aria").unwrap().is_link_dead());

        // A late unregister for the same id is ignored.
        let _ = d.process(InboundEvent::Unregistered(peer.id, Disconnect::Closed));
    }

    #[tokio::test]
    async fn reconnect_takes_over_a_live_session() {
        let mut d = dispatcher().await;
        let mut a = connect(&mut d, 1);
        create(&mut d, &a, "aria").await;
        let mut watcher = connect(&mut d, 3);
        create(&mut d, &watcher, "bran").await;
        tick(&mut d);
        a.drain();
        watcher.drain();

        let mut b = connect(&mut d, 2);
        login(&mut d, &b, "aria").await;

        assert!(a.handle.is_closed());
        assert!(a.drain().contains("This character has been claimed by another connection.\r\n"));
        assert_eq!(d.clients[&b.id].state, ConnectionState::Playing);
        assert_eq!(d.world.session("aria").unwrap().connection, Some(b.id));

        tick(&mut d);
        let out = b.drain();
        assert!(out.contains("Password: "));
        assert!(out.contains("Reconnecting to a session in progress.\r\n"));
        assert!(!out.contains("Please choose a race"));
        assert_eq!(watcher.drain().matches("has reconnected").count(), 1);

        // The displaced connection's unregister must not detach the new one.
        let _ = d.process(InboundEvent::Unregistered(a.id, Disconnect::Closed));
        assert_eq!(d.world.session("aria").unwrap().connection, Some(b.id));
    }

    #[tokio::test]
    async fn wrong_password_returns_to_name_entry() {
        let mut d = dispatcher().await;
        let mut a = connect(&mut d, 1);
        create(&mut d, &a, "aria").await;

        let mut b = connect(&mut d, 2);
        send(&mut d, &b, "aria");
        settle_all(&mut d, &b).await;
        send(&mut d, &b, "wrong");
        settle_all(&mut d, &b).await;
        assert!(b.drain().ends_with(&format!("Wrong password.\r\n\r\n{NAME_PROMPT}")));
        assert!(!a.handle.is_closed());
    }

    #[tokio::test]
    async fn line_too_long_gets_a_notice_then_close() {
        let mut d = dispatcher().await;
        let mut peer = connect(&mut d, 1);
        peer.drain();

        let _ = d.process(InboundEvent::Unregistered(peer.id, Disconnect::LineTooLong));
        assert_eq!(peer.drain(), "\r\nLine too long.\r\n");
        assert!(peer.handle.is_closed());
    }

    #[tokio::test]
    async fn quit_removes_the_session_and_closes() {
        let mut d = dispatcher().await;
        let mut peer = connect(&mut d, 1);
        create(&mut d, &peer, "aria").await;
        tick(&mut d);
        peer.drain();

        send(&mut d, &peer, "quit");
        assert!(peer.handle.is_closed());
        assert!(!d.world.contains("aria"));
        assert!(!d.clients.contains_key(&peer.id));
        assert!(peer.drain().contains("Farewell"));
    }

    #[tokio::test]
    async fn output_overflow_closes_the_connection() {
        let limits = LimitsConfig {
            output_buffer_capacity: 64,
            ..LimitsConfig::default()
        };
        let mut d = dispatcher_with(limits).await;
        let mut peer = connect(&mut d, 1);
        create(&mut d, &peer, "aria").await;

        assert!(peer.handle.is_closed());
        assert!(!d.clients.contains_key(&peer.id));
        assert!(d.world.session("aria").unwrap().is_link_dead());
    }

    #[tokio::test]
    async fn long_output_pages_and_blank_line_continues() {
        let limits = LimitsConfig {
            page_lines: 2,
            ..LimitsConfig::default()
        };
        let mut d = dispatcher_with(limits).await;
        let mut peer = connect(&mut d, 1);
        create(&mut d, &peer, "aria").await;
        tick(&mut d);

        let first = peer.drain();
        assert!(first.contains("[ Press return to continue ("));
        assert!(d.world.session("aria").unwrap().output.is_paging());

        send(&mut d, &peer, "");
        tick(&mut d);
        assert!(!peer.drain().is_empty());
    }

    #[tokio::test]
    async fn shutdown_says_farewell_and_closes_everyone() {
        let mut d = dispatcher().await;
        let mut peer = connect(&mut d, 1);
        peer.drain();

        assert!(d.process(InboundEvent::Shutdown).is_break());
        d.shutdown().await;
        assert!(peer.drain().contains("The world is shutting down. Farewell."));
        assert!(peer.handle.is_closed());
        assert!(d.clients.is_empty());
    }
}
