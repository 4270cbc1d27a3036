//! Outbound loop: queue to socket.

use std::time::Duration;

use bytes::Bytes;
use futures_util::SinkExt;
use golem_proto::TelnetCodec;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::codec::FramedWrite;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Upper bound on the best-effort drain and shutdown after close.
const CLOSE_GRACE: Duration = Duration::from_millis(500);

/// Write queued buffers in order until the close signal fires, the queue
/// closes or a write fails.
///
/// Queued bytes win over the close signal, and whatever is already queued
/// when it fires is still written before the write half shuts down. A write
/// blocked on a stalled peer is abandoned as soon as the close signal fires,
/// and the final drain gets at most [`CLOSE_GRACE`].
pub(super) async fn run<W>(
    mut writer: FramedWrite<W, TelnetCodec>,
    mut queue: mpsc::UnboundedReceiver<Bytes>,
    close: CancellationToken,
) where
    W: AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            biased;
            chunk = queue.recv() => match chunk {
                Some(bytes) => {
                    tokio::select! {
                        biased;
                        sent = writer.send(bytes) => {
                            if let Err(e) = sent {
                                debug!(error = %e, "Write failed");
                                break;
                            }
                        }
                        _ = close.cancelled() => {
                            debug!("Close signalled during a blocked write");
                            break;
                        }
                    }
                }
                None => break,
            },
            _ = close.cancelled() => {
                if tokio::time::timeout(CLOSE_GRACE, drain(&mut writer, &mut queue))
                    .await
                    .is_err()
                {
                    debug!("Drain on close timed out");
                }
                break;
            }
        }
    }

    // Stop the inbound side too if we are the ones giving up.
    close.cancel();
    match tokio::time::timeout(CLOSE_GRACE, writer.get_mut().shutdown()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!(error = %e, "Shutdown of write half failed"),
        Err(_) => debug!("Shutdown of write half timed out"),
    }
}

async fn drain<W>(writer: &mut FramedWrite<W, TelnetCodec>, queue: &mut mpsc::UnboundedReceiver<Bytes>)
where
    W: AsyncWrite + Unpin,
{
    while let Ok(bytes) = queue.try_recv() {
        if writer.feed(bytes).await.is_err() {
            return;
        }
    }
    if let Err(e) = writer.flush().await {
        debug!(error = %e, "Final flush failed");
    }
}
