//! Classification of read errors.

use std::io::ErrorKind;

use golem_proto::ProtocolError;

use crate::dispatcher::Disconnect;

/// Map a decoder error to the reason the inbound loop stops.
pub(super) fn classify_read_error(e: &ProtocolError) -> Disconnect {
    match e {
        ProtocolError::LineTooLong { .. } => Disconnect::LineTooLong,
        ProtocolError::Io(io) => match io.kind() {
            // Resets and aborts are how most clients hang up.
            ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::UnexpectedEof => {
                Disconnect::PeerClosed
            }
            _ => Disconnect::ReadError,
        },
        _ => Disconnect::ReadError,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn line_too_long_is_a_policy_violation() {
        let e = ProtocolError::LineTooLong {
            actual: 512,
            limit: 512,
        };
        assert_eq!(classify_read_error(&e), Disconnect::LineTooLong);
    }

    #[test]
    fn resets_count_as_peer_hangups() {
        let reset = ProtocolError::Io(io::Error::from(ErrorKind::ConnectionReset));
        assert_eq!(classify_read_error(&reset), Disconnect::PeerClosed);

        let other = ProtocolError::Io(io::Error::other("boom"));
        assert_eq!(classify_read_error(&other), Disconnect::ReadError);
    }
}
