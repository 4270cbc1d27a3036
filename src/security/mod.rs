//! Security module for golemd.
//!
//! - **Password**: Argon2id credential hashing and verification

pub mod password;

pub use password::{CredentialError, Credentials, Plaintext};

#[cfg(test)]
pub(crate) use password::cheap_credentials;
