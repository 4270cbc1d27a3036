//! The dispatcher's view of a connection.

use std::net::SocketAddr;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::state::ConnectionId;

/// Outbound queue and close signal of one connection.
///
/// Cloning is cheap; every clone feeds the same outbound loop.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    addr: SocketAddr,
    outbound: mpsc::UnboundedSender<Bytes>,
    close: CancellationToken,
}

impl ConnectionHandle {
    /// Create a handle and the receiving end of its outbound queue.
    pub fn new(id: ConnectionId, addr: SocketAddr) -> (Self, mpsc::UnboundedReceiver<Bytes>) {
        let (outbound, rx) = mpsc::unbounded_channel();
        let handle = Self {
            id,
            addr,
            outbound,
            close: CancellationToken::new(),
        };
        (handle, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Queue bytes for the wire. Returns false once the outbound loop has
    /// stopped.
    pub fn send(&self, bytes: Bytes) -> bool {
        self.outbound.send(bytes).is_ok()
    }

    pub fn send_text(&self, text: &str) -> bool {
        if text.is_empty() {
            return true;
        }
        self.send(Bytes::copy_from_slice(text.as_bytes()))
    }

    /// Signal both loops to stop. Already-queued bytes are still written.
    pub fn close(&self) {
        self.close.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.close.is_cancelled()
    }

    pub(super) fn close_signal(&self) -> CancellationToken {
        self.close.clone()
    }
}
