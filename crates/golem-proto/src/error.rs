//! Error types for the telnet wire layer.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Errors raised while framing a telnet byte stream.
///
/// Option noise (unknown codes, truncated sequences) is never an error;
/// the codec logs and skips it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A line grew past the configured limit before its terminator arrived.
    #[error("line too long: {actual} bytes (limit: {limit})")]
    LineTooLong {
        /// Bytes buffered when the limit was hit.
        actual: usize,
        /// Configured maximum, terminator included.
        limit: usize,
    },
}

impl ProtocolError {
    /// True for errors that come from peer behaviour rather than the socket.
    pub fn is_policy_violation(&self) -> bool {
        matches!(self, Self::LineTooLong { .. })
    }
}
