//! Greeting and message-of-the-day text.

use super::ServerConfig;

const DEFAULT_GREETING: &str = "\r\n\
    Welcome to Golem.\r\n\
    \r\n\
    A shared world, shaped by the people in it.\r\n\
    \r\n";

const DEFAULT_MOTD: &str = "\r\n\
    Message of the Day\r\n\
    ------------------\r\n\
    Be kind to other players. Type 'help' for a list of commands.\r\n\
    \r\n";

/// Fixed texts shown during login, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Texts {
    pub greeting: String,
    pub motd: String,
    pub world_name: String,
}

impl Texts {
    /// Load texts from the files named in `server`, falling back to
    /// built-in text when a file is unset or unreadable.
    pub fn load(server: &ServerConfig) -> Self {
        Self {
            greeting: load_text(server.greeting_file.as_deref(), DEFAULT_GREETING),
            motd: load_text(server.motd_file.as_deref(), DEFAULT_MOTD),
            world_name: server.world_name.clone(),
        }
    }
}

impl Default for Texts {
    fn default() -> Self {
        Self {
            greeting: DEFAULT_GREETING.to_string(),
            motd: DEFAULT_MOTD.to_string(),
            world_name: "Golem".to_string(),
        }
    }
}

fn load_text(path: Option<&str>, fallback: &str) -> String {
    let Some(path) = path else {
        return fallback.to_string();
    };
    match std::fs::read_to_string(path) {
        Ok(content) => to_crlf(&content),
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "Failed to read text file, using built-in text");
            fallback.to_string()
        }
    }
}

/// Normalize line endings to CRLF for the wire.
pub(crate) fn to_crlf(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 16);
    for line in text.split_inclusive('\n') {
        match line.strip_suffix('\n') {
            Some(body) => {
                out.push_str(body.strip_suffix('\r').unwrap_or(body));
                out.push_str("\r\n");
            }
            None => out.push_str(line),
        }
    }
    out
}
