//! Input, output and queue limits configuration.

use serde::Deserialize;

/// Limits configuration.
///
/// These bound how much any single peer can make the server buffer.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Longest accepted input line in bytes, terminator included (default: 512).
    #[serde(default = "default_max_line_len")]
    pub max_line_len: usize,
    /// Per-session output buffer capacity in bytes (default: 32768).
    /// A session that overflows it is disconnected.
    #[serde(default = "default_output_buffer_capacity")]
    pub output_buffer_capacity: usize,
    /// Lines per page before "Press return to continue" (default: 50).
    #[serde(default = "default_page_lines")]
    pub page_lines: usize,
    /// Input lines held while a connection waits on background work (default: 16).
    #[serde(default = "default_pending_lines")]
    pub pending_lines: usize,
    /// Dispatcher inbox capacity (default: 1024).
    #[serde(default = "default_inbox_capacity")]
    pub inbox_capacity: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_line_len: default_max_line_len(),
            output_buffer_capacity: default_output_buffer_capacity(),
            page_lines: default_page_lines(),
            pending_lines: default_pending_lines(),
            inbox_capacity: default_inbox_capacity(),
        }
    }
}

fn default_max_line_len() -> usize {
    golem_proto::MAX_LINE_LEN
}

fn default_output_buffer_capacity() -> usize {
    32 * 1024
}

fn default_page_lines() -> usize {
    50
}

fn default_pending_lines() -> usize {
    16
}

fn default_inbox_capacity() -> usize {
    1024
}
