//! Inbound loop: socket to dispatcher.

use futures_util::StreamExt;
use golem_proto::{Frame, TelnetCodec};
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio_util::codec::FramedRead;
use tracing::{debug, info, trace, warn};

use super::error_handling::classify_read_error;
use super::handle::ConnectionHandle;
use crate::dispatcher::{Disconnect, InboundEvent};

/// Decode frames until the stream ends, the close signal fires or the peer
/// breaks policy. Lines go to the dispatcher; negotiation replies go
/// straight onto the connection's own outbound queue.
pub(super) async fn run<R>(
    mut reader: FramedRead<R, TelnetCodec>,
    handle: &ConnectionHandle,
    events: &mpsc::Sender<InboundEvent>,
) -> Disconnect
where
    R: AsyncRead + Unpin,
{
    let close = handle.close_signal();
    let id = handle.id();

    loop {
        let frame = tokio::select! {
            _ = close.cancelled() => return Disconnect::Closed,
            frame = reader.next() => frame,
        };

        match frame {
            Some(Ok(Frame::Line(line))) => {
                crate::metrics::line_received();
                trace!(len = line.len(), "Line received");
                if events.send(InboundEvent::LineReceived(id, line)).await.is_err() {
                    return Disconnect::Closed;
                }
            }
            Some(Ok(frame @ Frame::Negotiation(_))) => {
                if let Some(reply) = frame.reply() {
                    crate::metrics::refusals_sent(reply.len() / 3);
                    handle.send(reply);
                }
            }
            Some(Err(e)) => {
                let reason = classify_read_error(&e);
                match reason {
                    Disconnect::LineTooLong => warn!(error = %e, "Input line over limit"),
                    Disconnect::PeerClosed => debug!(error = %e, "Peer hung up"),
                    _ => info!(error = %e, "Read error"),
                }
                return reason;
            }
            None => return Disconnect::PeerClosed,
        }
    }
}
