//! Prometheus metrics collection for golemd.
//!
//! Exposed on an HTTP endpoint when `server.metrics_port` is set.
//!
//! - `golem_connections` - sockets currently accepted
//! - `golem_playing_sessions` - sessions in the world with a live connection
//! - `golem_command_total{command}` - commands interpreted by name
//! - `golem_disconnects_total{reason}` - connections closed by the server

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters
// ========================================================================

/// Text lines decoded from clients.
pub static LINES_RECEIVED: OnceLock<IntCounter> = OnceLock::new();

/// Telnet refusals written back to clients.
pub static NEGOTIATION_REFUSALS: OnceLock<IntCounter> = OnceLock::new();

/// Output buffers moved to the wire by the flush tick.
pub static OUTPUT_FLUSHES: OnceLock<IntCounter> = OnceLock::new();

// ========================================================================
// Gauges
// ========================================================================

/// Currently accepted sockets.
pub static CONNECTIONS: OnceLock<IntGauge> = OnceLock::new();

/// Sessions in the world that have a connection attached.
pub static PLAYING_SESSIONS: OnceLock<IntGauge> = OnceLock::new();

// ========================================================================
// Labelled
// ========================================================================

/// Commands interpreted by name.
pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Command latency by name.
pub static COMMAND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Command errors by name and kind.
pub static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Server-initiated disconnects by reason.
pub static DISCONNECTS: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Call once at startup; later calls are harmless.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            if $metric.get().is_none() {
                match $init {
                    Ok(m) => {
                        if let Err(e) = r.register(Box::new(m.clone())) {
                            tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                        }
                        let _ = $metric.set(m);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                    }
                }
            }
        };
    }

    register!(LINES_RECEIVED, IntCounter::new("golem_lines_received_total", "Text lines decoded from clients"));
    register!(NEGOTIATION_REFUSALS, IntCounter::new("golem_negotiation_refusals_total", "Telnet option refusals sent"));
    register!(OUTPUT_FLUSHES, IntCounter::new("golem_output_flushes_total", "Session output buffers flushed"));
    register!(CONNECTIONS, IntGauge::new("golem_connections", "Currently accepted sockets"));
    register!(PLAYING_SESSIONS, IntGauge::new("golem_playing_sessions", "Sessions in the world with a connection"));

    register!(COMMAND_COUNTER, IntCounterVec::new(Opts::new("golem_command_total", "Commands interpreted by name"), &["command"]));
    register!(COMMAND_LATENCY, HistogramVec::new(
        HistogramOpts::new("golem_command_duration_seconds", "Command latency by name")
            .buckets(vec![0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05]),
        &["command"]));
    register!(COMMAND_ERRORS, IntCounterVec::new(Opts::new("golem_command_errors_total", "Command errors by kind"), &["command", "error"]));
    register!(DISCONNECTS, IntCounterVec::new(Opts::new("golem_disconnects_total", "Server-initiated disconnects by reason"), &["reason"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Update helpers; all are no-ops before `init`.
// ============================================================================

#[inline]
pub fn line_received() {
    if let Some(c) = LINES_RECEIVED.get() {
        c.inc();
    }
}

#[inline]
pub fn refusals_sent(count: usize) {
    if let Some(c) = NEGOTIATION_REFUSALS.get() {
        c.inc_by(count as u64);
    }
}

#[inline]
pub fn output_flushed() {
    if let Some(c) = OUTPUT_FLUSHES.get() {
        c.inc();
    }
}

#[inline]
pub fn connection_opened() {
    if let Some(g) = CONNECTIONS.get() {
        g.inc();
    }
}

#[inline]
pub fn connection_closed() {
    if let Some(g) = CONNECTIONS.get() {
        g.dec();
    }
}

#[inline]
pub fn set_playing_sessions(count: usize) {
    if let Some(g) = PLAYING_SESSIONS.get() {
        g.set(count as i64);
    }
}

/// Record a command execution with latency.
#[inline]
pub fn record_command(command: &str, duration_secs: f64) {
    if let Some(c) = COMMAND_COUNTER.get() {
        c.with_label_values(&[command]).inc();
    }
    if let Some(h) = COMMAND_LATENCY.get() {
        h.with_label_values(&[command]).observe(duration_secs);
    }
}

/// Record a command error.
#[inline]
pub fn record_command_error(command: &str, error: &str) {
    if let Some(c) = COMMAND_ERRORS.get() {
        c.with_label_values(&[command, error]).inc();
    }
}

/// Record a server-initiated disconnect.
#[inline]
pub fn record_disconnect(reason: &str) {
    if let Some(c) = DISCONNECTS.get() {
        c.with_label_values(&[reason]).inc();
    }
}
