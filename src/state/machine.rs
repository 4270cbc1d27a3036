//! Connection phases.
//!
//! ```text
//!  None ─► AwaitingName ─► ConfirmName ─► NewPassword ─► ConfirmPassword
//!               │                              ▲               │
//!               │                              └── mismatch ───┤
//!               │                                              ▼
//!               │          ChooseRace ◄─► ConfirmRace ─► ChooseClass ◄─► ConfirmClass
//!               │                                                            │
//!               ▼                                                            ▼
//!        AwaitingPassword ──────────────────────────────────────────► MessageOfTheDay ─► Playing
//!               │                                                                          ▲
//!               └───────────────────────── reconnect ──────────────────────────────────────┘
//! ```

use std::fmt;

/// The phase a connection is in. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// Accepted but not yet registered with the dispatcher.
    #[default]
    None,
    AwaitingName,
    ConfirmName,
    NewPassword,
    ConfirmPassword,
    ChooseRace,
    ConfirmRace,
    ChooseClass,
    ConfirmClass,
    MessageOfTheDay,
    Playing,
    /// Returning-identity branch off `AwaitingName`.
    AwaitingPassword,
}

impl ConnectionState {
    /// True once the connection drives a live session.
    pub fn is_playing(self) -> bool {
        self == Self::Playing
    }

    /// True while a name entered on this connection is being logged in
    /// or created.
    pub fn holds_name(self) -> bool {
        !matches!(self, Self::None | Self::Playing)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
