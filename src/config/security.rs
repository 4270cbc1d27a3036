//! Credential hashing configuration.

use serde::Deserialize;

/// Security configuration.
///
/// Argon2 costs apply to newly hashed passwords only; verification reads
/// the parameters stored alongside each hash.
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 19456).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,
    /// Argon2 iteration count (default: 2).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
        }
    }
}

fn default_argon2_memory_kib() -> u32 {
    19 * 1024
}

fn default_argon2_iterations() -> u32 {
    2
}
