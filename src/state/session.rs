//! Authenticated sessions.
//!
//! A session outlives the connection that created it: when the connection
//! drops, the session stays in the world link-dead until the same identity
//! logs in again and reattaches it.

use chrono::{DateTime, Utc};

use super::output::{OutputBuffer, Overflow};
use super::uid::ConnectionId;
use crate::db::IdentityRecord;

/// An identity playing in the world.
#[derive(Debug)]
pub struct Session {
    pub identity_id: i64,
    /// Display name, canonical case.
    pub name: String,
    pub race: String,
    pub class: String,
    pub level: i64,
    pub room_id: i64,
    /// The connection driving this session; `None` while link-dead.
    pub connection: Option<ConnectionId>,
    pub output: OutputBuffer,
    pub logged_in_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        identity: &IdentityRecord,
        race: &str,
        class: &str,
        room_id: i64,
        connection: ConnectionId,
        output: OutputBuffer,
    ) -> Self {
        Self {
            identity_id: identity.id,
            name: identity.name.clone(),
            race: race.to_string(),
            class: class.to_string(),
            level: identity.level,
            room_id,
            connection: Some(connection),
            output,
            logged_in_at: Utc::now(),
        }
    }

    pub fn is_link_dead(&self) -> bool {
        self.connection.is_none()
    }

    /// Buffer text for the next flush. Text for a link-dead session is
    /// dropped.
    pub fn write(&mut self, text: &str) -> Result<(), Overflow> {
        if self.connection.is_none() {
            return Ok(());
        }
        self.output.write(text)
    }

    /// Bind a new connection, discarding anything meant for the old one.
    ///
    /// Held pages belong to the old connection and are dropped here along
    /// with the buffer. This and [`Session::detach`] are the only resets of
    /// pagination outside a flush.
    pub fn attach(&mut self, connection: ConnectionId) -> Option<ConnectionId> {
        self.output.clear();
        self.connection.replace(connection)
    }

    /// Drop the connection binding, leaving the session link-dead.
    ///
    /// Pending pages are dropped too; nobody is left to page through them.
    pub fn detach(&mut self) {
        self.output.clear();
        self.connection = None;
    }
}

#[cfg(test)]
pub(crate) fn sample_session(name: &str, conn: u64, room_id: i64) -> Session {
    let identity = IdentityRecord {
        id: conn as i64,
        name: name.to_string(),
        password_hash: String::new(),
        race_id: 1,
        class_id: 1,
        level: 1,
        room_id,
        created_at: 0,
        last_login_at: None,
    };
    Session::new(
        &identity,
        "human",
        "warrior",
        room_id,
        ConnectionId::from_raw(conn),
        OutputBuffer::new(4096, 50),
    )
}
