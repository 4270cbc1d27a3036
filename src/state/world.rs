//! The live world: rooms and the sessions in them.
//!
//! Owned by the dispatcher and mutated only there. Sessions are keyed by
//! the case-folded name; room occupancy lists those keys.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::warn;

use super::names;
use super::session::Session;
use super::uid::ConnectionId;
use crate::db::RoomRecord;

#[derive(Debug)]
pub struct Room {
    pub id: i64,
    pub name: String,
    pub description: String,
    occupants: BTreeSet<String>,
}

impl Room {
    /// Keys of the sessions in this room.
    pub fn occupants(&self) -> impl Iterator<Item = &str> {
        self.occupants.iter().map(String::as_str)
    }
}

#[derive(Debug)]
pub struct World {
    rooms: BTreeMap<i64, Room>,
    sessions: HashMap<String, Session>,
    start_room: i64,
    /// Connections whose session output overflowed since the last check.
    overflowed: Vec<ConnectionId>,
}

impl World {
    pub fn new(rooms: Vec<RoomRecord>, start_room: i64) -> Self {
        let rooms = rooms
            .into_iter()
            .map(|r| {
                (
                    r.id,
                    Room {
                        id: r.id,
                        name: r.name,
                        description: r.description,
                        occupants: BTreeSet::new(),
                    },
                )
            })
            .collect();
        Self {
            rooms,
            sessions: HashMap::new(),
            start_room,
            overflowed: Vec::new(),
        }
    }

    pub fn start_room(&self) -> i64 {
        self.start_room
    }

    pub fn room(&self, id: i64) -> Option<&Room> {
        self.rooms.get(&id)
    }

    /// A room that exists: `id` if it does, the start room otherwise.
    pub fn resolve_room(&self, id: i64) -> i64 {
        if self.rooms.contains_key(&id) {
            id
        } else {
            self.start_room
        }
    }

    pub fn session(&self, key: &str) -> Option<&Session> {
        self.sessions.get(key)
    }

    pub fn session_mut(&mut self, key: &str) -> Option<&mut Session> {
        self.sessions.get_mut(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.sessions.contains_key(key)
    }

    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    pub fn sessions_mut(&mut self) -> impl Iterator<Item = &mut Session> {
        self.sessions.values_mut()
    }

    /// Sessions with a connection attached.
    pub fn playing_count(&self) -> usize {
        self.sessions.values().filter(|s| !s.is_link_dead()).count()
    }

    /// Put a session into the world, in its room. Returns its key.
    pub fn insert(&mut self, mut session: Session) -> String {
        session.room_id = self.resolve_room(session.room_id);
        let key = names::key(&session.name);
        if let Some(room) = self.rooms.get_mut(&session.room_id) {
            room.occupants.insert(key.clone());
        }
        if let Some(old) = self.sessions.insert(key.clone(), session) {
            warn!(name = %old.name, "Replaced a session already in the world");
        }
        key
    }

    /// Take a session out of the world and its room.
    pub fn remove(&mut self, key: &str) -> Option<Session> {
        let session = self.sessions.remove(key)?;
        if let Some(room) = self.rooms.get_mut(&session.room_id) {
            room.occupants.remove(key);
        }
        Some(session)
    }

    /// Buffer text for one session.
    pub fn send(&mut self, key: &str, text: &str) {
        if let Some(session) = self.sessions.get_mut(key) {
            write_or_flag(session, text, &mut self.overflowed);
        }
    }

    /// Buffer text for everyone in a room except `except`.
    pub fn send_to_room(&mut self, room_id: i64, except: Option<&str>, text: &str) {
        let Some(room) = self.rooms.get(&room_id) else {
            return;
        };
        for key in &room.occupants {
            if Some(key.as_str()) == except {
                continue;
            }
            if let Some(session) = self.sessions.get_mut(key) {
                write_or_flag(session, text, &mut self.overflowed);
            }
        }
    }

    /// Buffer text for every session except `except`.
    pub fn send_to_all(&mut self, except: Option<&str>, text: &str) {
        for (key, session) in self.sessions.iter_mut() {
            if Some(key.as_str()) == except {
                continue;
            }
            write_or_flag(session, text, &mut self.overflowed);
        }
    }

    /// Connections whose output overflowed since the last call.
    pub fn take_overflowed(&mut self) -> Vec<ConnectionId> {
        std::mem::take(&mut self.overflowed)
    }
}

fn write_or_flag(session: &mut Session, text: &str, overflowed: &mut Vec<ConnectionId>) {
    if session.write(text).is_err() {
        warn!(name = %session.name, "Output buffer overflow");
        if let Some(conn) = session.connection {
            overflowed.push(conn);
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_world() -> World {
    World::new(
        vec![
            RoomRecord {
                id: 1,
                name: "Town Square".to_string(),
                description: "A wide cobbled square.".to_string(),
            },
            RoomRecord {
                id: 2,
                name: "The Void".to_string(),
                description: "Nothing at all.".to_string(),
            },
        ],
        1,
    )
}
