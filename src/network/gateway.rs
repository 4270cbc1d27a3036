//! Gateway - TCP listener that accepts incoming connections.
//!
//! The Gateway binds the listen socket and spawns a [`Connection`] task for
//! each incoming peer.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{Instrument, error, info, instrument, warn};

use crate::dispatcher::InboundEvent;
use crate::network::Connection;
use crate::state::ConnectionIdGenerator;
use crate::telemetry::spans;

/// The Gateway accepts incoming TCP connections and spawns handlers.
pub struct Gateway {
    listener: TcpListener,
    events: mpsc::Sender<InboundEvent>,
    ids: ConnectionIdGenerator,
    max_line_len: usize,
}

impl Gateway {
    /// Bind the gateway to the specified address.
    pub async fn bind(
        addr: SocketAddr,
        events: mpsc::Sender<InboundEvent>,
        max_line_len: usize,
    ) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(address = %listener.local_addr()?, "Listener bound");
        Ok(Self {
            listener,
            events,
            ids: ConnectionIdGenerator::new(),
            max_line_len,
        })
    }

    /// Accept connections until the task is cancelled.
    #[instrument(skip(self), name = "gateway")]
    pub async fn run(self) -> anyhow::Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        warn!(%addr, error = %e, "Failed to set TCP_NODELAY");
                    }

                    let id = self.ids.next();
                    info!(%id, %addr, "Connection accepted");
                    crate::metrics::connection_opened();

                    let connection =
                        Connection::new(id, stream, addr, self.events.clone(), self.max_line_len);
                    tokio::spawn(
                        async move {
                            connection.run().await;
                            info!("Connection closed");
                        }
                        .instrument(spans::connection(id, addr)),
                    );
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}
