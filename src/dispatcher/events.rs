//! The dispatcher's event vocabulary.

use crate::db::IdentityRecord;
use crate::error::WorkError;
use crate::network::ConnectionHandle;
use crate::state::ConnectionId;

/// Everything that can happen to the dispatcher.
///
/// Connection loops, the flush timer, delegated work and the signal handler
/// all talk to the dispatcher through this enum and nothing else.
#[derive(Debug)]
pub enum InboundEvent {
    /// A transport link was accepted and its outbound loop is running.
    Registered(ConnectionHandle),
    /// The inbound loop ended.
    Unregistered(ConnectionId, Disconnect),
    LineReceived(ConnectionId, String),
    /// Flush buffered session output.
    Tick,
    QuitRequested(ConnectionId),
    /// Delegated work finished.
    Completed(ConnectionId, Outcome),
    /// Save everything, close every connection and stop.
    Shutdown,
}

/// Why an inbound loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disconnect {
    /// End of stream from the peer.
    PeerClosed,
    ReadError,
    /// The peer sent a line over the configured limit.
    LineTooLong,
    /// The close signal fired.
    Closed,
}

impl Disconnect {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PeerClosed => "peer_closed",
            Self::ReadError => "read_error",
            Self::LineTooLong => "line_too_long",
            Self::Closed => "closed",
        }
    }
}

/// Result of work run off the dispatcher.
#[derive(Debug)]
pub enum Outcome {
    IdentityLookup(Result<Option<IdentityRecord>, WorkError>),
    PasswordHashed(Result<String, WorkError>),
    PasswordChecked(Result<bool, WorkError>),
    IdentityCreated(Result<IdentityRecord, WorkError>),
    /// A location save requested by the player.
    Saved(Result<(), WorkError>),
}

impl Outcome {
    /// True when the nanny is waiting on this result.
    pub fn blocks_input(&self) -> bool {
        !matches!(self, Self::Saved(_))
    }
}
