//! Telemetry utilities for command timing and span construction.

use std::time::Instant;

/// Guard for timing command execution and recording metrics.
///
/// Records command latency when dropped.
pub struct CommandTimer {
    command: &'static str,
    start: Instant,
}

impl CommandTimer {
    /// Start timing a command.
    pub fn new(command: &'static str) -> Self {
        Self {
            command,
            start: Instant::now(),
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_command(self.command, duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use std::net::SocketAddr;
    use tracing::{Level, Span, info_span, span};

    use crate::state::ConnectionId;

    /// Span wrapping both I/O loops of one connection.
    pub fn connection(id: ConnectionId, addr: SocketAddr) -> Span {
        info_span!("connection", id = %id, addr = %addr)
    }

    /// Span for one interpreted command.
    pub fn command(name: &str, actor: &str) -> Span {
        span!(Level::DEBUG, "command", name = %name, actor = %actor)
    }
}
