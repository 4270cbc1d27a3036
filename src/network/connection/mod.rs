//! Connection - the I/O pair for one accepted socket.
//!
//! Each connection runs two tasks that share a [`ConnectionHandle`]:
//!
//! ```text
//!   socket ──► FramedRead<TelnetCodec> ──► inbound ──► dispatcher inbox
//!                                            │
//!                                            │ negotiation refusals
//!                                            ▼
//!   socket ◄── FramedWrite<TelnetCodec> ◄── outbound ◄── handle.send()
//! ```
//!
//! Either side firing the close signal stops the other. The dispatcher hears
//! about the link exactly twice: `Registered` before the first line and
//! `Unregistered` after the last.

mod error_handling;
mod handle;
mod inbound;
mod outbound;

pub use handle::ConnectionHandle;

use std::net::SocketAddr;

use golem_proto::TelnetCodec;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{Instrument, debug, info};

use crate::dispatcher::InboundEvent;
use crate::state::ConnectionId;

/// One accepted transport link.
pub struct Connection {
    id: ConnectionId,
    stream: TcpStream,
    addr: SocketAddr,
    events: mpsc::Sender<InboundEvent>,
    max_line_len: usize,
}

impl Connection {
    pub fn new(
        id: ConnectionId,
        stream: TcpStream,
        addr: SocketAddr,
        events: mpsc::Sender<InboundEvent>,
        max_line_len: usize,
    ) -> Self {
        Self {
            id,
            stream,
            addr,
            events,
            max_line_len,
        }
    }

    /// Run the connection to completion.
    pub async fn run(self) {
        let Self {
            id,
            stream,
            addr,
            events,
            max_line_len,
        } = self;

        let (read_half, write_half) = stream.into_split();
        let reader = FramedRead::new(read_half, TelnetCodec::with_max_len(max_line_len));
        let writer = FramedWrite::new(write_half, TelnetCodec::with_max_len(max_line_len));

        let (handle, queue) = ConnectionHandle::new(id, addr);
        let writer_task = tokio::spawn(
            outbound::run(writer, queue, handle.close_signal()).instrument(tracing::Span::current()),
        );

        if events
            .send(InboundEvent::Registered(handle.clone()))
            .await
            .is_err()
        {
            debug!("Dispatcher gone before registration");
            handle.close();
        } else {
            let reason = inbound::run(reader, &handle, &events).await;
            info!(reason = reason.as_str(), "Inbound loop finished");
            // The dispatcher owns the close from here; it may still want to
            // write a final notice.
            let _ = events.send(InboundEvent::Unregistered(id, reason)).await;
        }

        // Our clone keeps the queue open; drop it so the writer can finish
        // once the dispatcher lets go of its own.
        drop(handle);
        if let Err(e) = writer_task.await {
            debug!(error = %e, "Outbound task panicked");
        }
        crate::metrics::connection_closed();
    }
}
