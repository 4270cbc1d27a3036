//! Login and character creation.
//!
//! The nanny is a pure transition function over [`ConnectionState`]. It
//! never touches the registry, the world or the database itself; it returns
//! the next state, text for the connection and a list of [`Effect`]s that
//! the dispatcher carries out. Slow work (lookups, hashing) comes back later
//! as an [`Outcome`] through [`Nanny::on_outcome`].

use tracing::{debug, info, warn};

use super::events::Outcome;
use crate::config::Texts;
use crate::db::{IdentityRecord, NewIdentity};
use crate::security::Plaintext;
use crate::state::{Choice, ConnectionId, ConnectionState, Tables, names};

pub const NAME_PROMPT: &str = "By what name do you wish to be known? ";
const PASSWORD_PROMPT: &str = "Please choose a password: ";
const RACE_HEADER: &str = "Please choose a race from the following options:\r\n";
const CLASS_HEADER: &str = "\r\nPlease choose a class from the following options:\r\n";
const CONTINUE: &str = "[ Press return to continue ]";

/// Work the dispatcher performs on behalf of a transition.
#[derive(Debug)]
pub enum Effect {
    LookupIdentity(String),
    HashPassword(Plaintext),
    VerifyPassword { hash: String, password: Plaintext },
    CreateIdentity(NewIdentity),
    /// Close every other connection bound to this name.
    EvictOthers(String),
    /// Attach this connection to the live session with this name.
    Reattach(String),
    /// Create a session from the draft identity and bind it into the world.
    EnterWorld,
    Disconnect,
}

impl Effect {
    /// True for effects whose result re-enters as an [`Outcome`].
    pub fn is_delegated(&self) -> bool {
        matches!(
            self,
            Self::LookupIdentity(_)
                | Self::HashPassword(_)
                | Self::VerifyPassword { .. }
                | Self::CreateIdentity(_)
        )
    }
}

/// Result of feeding one line or outcome to the nanny.
#[derive(Debug)]
pub struct Transition {
    pub next: ConnectionState,
    pub output: String,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(next: ConnectionState, output: impl Into<String>) -> Self {
        Self {
            next,
            output: output.into(),
            effects: Vec::new(),
        }
    }

    fn stay(state: ConnectionState) -> Self {
        Self::to(state, String::new())
    }

    fn with(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    fn disconnect(state: ConnectionState, output: impl Into<String>) -> Self {
        Self::to(state, output).with(Effect::Disconnect)
    }
}

/// Identity being logged in or created on one connection.
#[derive(Debug, Default)]
pub struct Draft {
    pub name: Option<String>,
    pub identity: Option<IdentityRecord>,
    pub password_hash: Option<String>,
    pub race: Option<Choice>,
    pub class: Option<Choice>,
}

impl Draft {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// What the nanny may ask about other connections.
pub trait Lobby {
    /// True when another connection is logging in or creating this name.
    fn name_claimed(&self, key: &str, by: ConnectionId) -> bool;
    /// True when a session with this name is in the world, connected or not.
    fn session_live(&self, key: &str) -> bool;
}

pub struct Nanny<'a> {
    pub tables: &'a Tables,
    pub texts: &'a Texts,
    pub lobby: &'a dyn Lobby,
}

impl Nanny<'_> {
    /// Handle one input line in a login phase.
    pub fn on_line(
        &self,
        conn: ConnectionId,
        state: ConnectionState,
        draft: &mut Draft,
        line: &str,
    ) -> Transition {
        use ConnectionState::{
            AwaitingName, AwaitingPassword, ChooseClass, ChooseRace, ConfirmClass, ConfirmName,
            ConfirmPassword, ConfirmRace, MessageOfTheDay, NewPassword, Playing,
        };

        match state {
            AwaitingName => self.name_entered(conn, draft, line),

            AwaitingPassword => {
                let Some(identity) = &draft.identity else {
                    return back_to_name(draft, "");
                };
                Transition::stay(AwaitingPassword).with(Effect::VerifyPassword {
                    hash: identity.password_hash.clone(),
                    password: Plaintext::new(line),
                })
            }

            ConfirmName => {
                if !affirmative(line) {
                    return back_to_name(draft, "\r\n");
                }
                let name = draft.name.as_deref().unwrap_or_default();
                Transition::to(
                    NewPassword,
                    format!("Creating new character {name}.\r\n{PASSWORD_PROMPT}"),
                )
            }

            NewPassword => {
                let password = Plaintext::new(line);
                if password.is_empty() {
                    return Transition::to(NewPassword, PASSWORD_PROMPT);
                }
                draft.password_hash = None;
                Transition::to(ConfirmPassword, "Please confirm your password: ")
                    .with(Effect::HashPassword(password))
            }

            ConfirmPassword => match &draft.password_hash {
                Some(hash) => Transition::stay(ConfirmPassword).with(Effect::VerifyPassword {
                    hash: hash.clone(),
                    password: Plaintext::new(line),
                }),
                None => password_mismatch(draft),
            },

            ChooseRace => match self.tables.races.find_playable(line) {
                Some(race) => {
                    let prompt = format!("\r\nAre you sure you want to be a {}? [y/N] ", race.name);
                    draft.race = Some(race);
                    Transition::to(ConfirmRace, prompt)
                }
                None => Transition::to(
                    ChooseRace,
                    "\r\nInvalid choice for race, please choose another: ",
                ),
            },

            ConfirmRace => {
                if affirmative(line) {
                    Transition::to(ChooseClass, self.tables.classes.render(CLASS_HEADER))
                } else {
                    draft.race = None;
                    Transition::to(ChooseRace, self.tables.races.render(RACE_HEADER))
                }
            }

            ChooseClass => match self.tables.classes.find_playable(line) {
                Some(class) => {
                    let prompt =
                        format!("\r\nAre you sure you want to be a {}? [y/N] ", class.name);
                    draft.class = Some(class);
                    Transition::to(ConfirmClass, prompt)
                }
                None => Transition::to(
                    ChooseClass,
                    "\r\nInvalid choice for class, please choose another: ",
                ),
            },

            ConfirmClass => {
                if !affirmative(line) {
                    draft.class = None;
                    return Transition::to(ChooseClass, self.tables.classes.render(CLASS_HEADER));
                }
                match self.new_identity(draft) {
                    Some(new) => Transition::stay(ConfirmClass).with(Effect::CreateIdentity(new)),
                    None => {
                        warn!(%conn, "Character draft incomplete at creation");
                        Transition::disconnect(ConfirmClass, "\r\nSomething went wrong.\r\n")
                    }
                }
            }

            MessageOfTheDay => Transition::stay(Playing).with(Effect::EnterWorld),

            ConnectionState::None | Playing => {
                debug!(%conn, %state, "Line outside the login flow ignored");
                Transition::stay(state)
            }
        }
    }

    /// Handle the result of delegated work.
    pub fn on_outcome(
        &self,
        conn: ConnectionId,
        state: ConnectionState,
        draft: &mut Draft,
        outcome: Outcome,
    ) -> Transition {
        use ConnectionState::{
            AwaitingName, AwaitingPassword, ChooseRace, ConfirmClass, ConfirmName,
            ConfirmPassword, MessageOfTheDay, Playing,
        };

        match (state, outcome) {
            (AwaitingName, Outcome::IdentityLookup(result)) => match result {
                Ok(Some(identity)) => {
                    draft.name = Some(identity.name.clone());
                    draft.identity = Some(identity);
                    Transition::to(AwaitingPassword, "Password: ")
                }
                Ok(None) => {
                    let name = draft.name.as_deref().unwrap_or_default();
                    Transition::to(
                        ConfirmName,
                        format!("No adventurer with that name exists.  Create {name}? [y/N] "),
                    )
                }
                Err(e) => {
                    warn!(%conn, error = %e, "Identity lookup failed");
                    Transition::disconnect(AwaitingName, "\r\nThe world is unavailable right now.\r\n")
                }
            },

            (AwaitingPassword, Outcome::PasswordChecked(result)) => match result {
                Ok(true) => {
                    let name = draft.name.clone().unwrap_or_default();
                    let key = names::key(&name);
                    info!(%conn, name = %name, "Password accepted");
                    let evict = Effect::EvictOthers(key.clone());
                    if self.lobby.session_live(&key) {
                        Transition::stay(Playing)
                            .with(evict)
                            .with(Effect::Reattach(key))
                    } else {
                        Transition::to(MessageOfTheDay, format!("{}{CONTINUE}", self.texts.motd))
                            .with(evict)
                    }
                }
                Ok(false) => {
                    info!(%conn, name = ?draft.name, "Wrong password");
                    back_to_name(draft, "Wrong password.\r\n\r\n")
                }
                Err(e) => {
                    warn!(%conn, error = %e, "Password verification failed");
                    Transition::disconnect(AwaitingPassword, "\r\nSomething went wrong.\r\n")
                }
            },

            (ConfirmPassword, Outcome::PasswordHashed(result)) => match result {
                Ok(hash) => {
                    draft.password_hash = Some(hash);
                    Transition::stay(ConfirmPassword)
                }
                Err(e) => {
                    warn!(%conn, error = %e, "Password hashing failed");
                    Transition::disconnect(ConfirmPassword, "\r\nSomething went wrong.\r\n")
                }
            },

            (ConfirmPassword, Outcome::PasswordChecked(result)) => match result {
                Ok(true) => Transition::to(ChooseRace, self.tables.races.render(RACE_HEADER)),
                Ok(false) => password_mismatch(draft),
                Err(e) => {
                    warn!(%conn, error = %e, "Password verification failed");
                    Transition::disconnect(ConfirmPassword, "\r\nSomething went wrong.\r\n")
                }
            },

            (ConfirmClass, Outcome::IdentityCreated(result)) => match result {
                Ok(identity) => {
                    info!(%conn, name = %identity.name, id = identity.id, "New character created");
                    draft.identity = Some(identity);
                    draft.password_hash = None;
                    Transition::to(MessageOfTheDay, format!("{}{CONTINUE}", self.texts.motd))
                }
                Err(e) => {
                    warn!(%conn, name = ?draft.name, error = %e, "Unable to create character, dropping connection");
                    Transition::disconnect(
                        ConfirmClass,
                        "\r\nUnable to create your character right now.\r\n",
                    )
                }
            },

            (state, outcome) => {
                debug!(%conn, %state, ?outcome, "Stale outcome ignored");
                Transition::stay(state)
            }
        }
    }

    fn name_entered(&self, conn: ConnectionId, draft: &mut Draft, line: &str) -> Transition {
        let name = match names::canonical(line) {
            Ok(name) => name,
            Err(e) => {
                debug!(%conn, input = %line.trim(), reason = %e, "Invalid name");
                return back_to_name(draft, "Invalid name, please try another.\r\n\r\n");
            }
        };

        let key = names::key(&name);
        if self.lobby.name_claimed(&key, conn) {
            info!(%conn, name = %name, "Name already claimed by another connection");
            return back_to_name(draft, "That name is already in use, please try another.\r\n\r\n");
        }

        info!(%conn, name = %name, "Guest attempting to login");
        draft.reset();
        draft.name = Some(name.clone());
        Transition::stay(ConnectionState::AwaitingName).with(Effect::LookupIdentity(name))
    }

    fn new_identity(&self, draft: &Draft) -> Option<NewIdentity> {
        Some(NewIdentity {
            name: draft.name.clone()?,
            password_hash: draft.password_hash.clone()?,
            race_id: draft.race.as_ref()?.id,
            class_id: draft.class.as_ref()?.id,
            room_id: self.tables.start_room,
        })
    }
}

fn affirmative(line: &str) -> bool {
    line.trim_start()
        .chars()
        .next()
        .is_some_and(|c| c.eq_ignore_ascii_case(&'y'))
}

fn back_to_name(draft: &mut Draft, preamble: &str) -> Transition {
    draft.reset();
    Transition::to(
        ConnectionState::AwaitingName,
        format!("{preamble}{NAME_PROMPT}"),
    )
}

fn password_mismatch(draft: &mut Draft) -> Transition {
    draft.password_hash = None;
    Transition::to(
        ConnectionState::NewPassword,
        format!("Passwords didn't match.\r\n{PASSWORD_PROMPT}"),
    )
}
