//! Password hashing and verification.
//!
//! Argon2id with a per-hash random salt. Hashing is deliberately slow, so
//! callers run it off the dispatcher on the blocking pool.

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::{SaltString, rand_core::OsRng},
};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::config::SecurityConfig;

/// Credential subsystem errors.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("invalid argon2 parameters: {0}")]
    Params(argon2::Error),
    #[error("password hashing failed: {0}")]
    Hash(argon2::password_hash::Error),
    #[error("stored credential is not a valid PHC string: {0}")]
    Corrupt(argon2::password_hash::Error),
}

/// A plaintext password, wiped from memory when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Plaintext(String);

impl Plaintext {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Plaintext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Plaintext(..)")
    }
}

/// Hashes and verifies passwords with configured Argon2 costs.
#[derive(Clone)]
pub struct Credentials {
    argon2: Argon2<'static>,
}

impl Credentials {
    /// Build a hasher from the security config.
    pub fn new(config: &SecurityConfig) -> Result<Self, CredentialError> {
        let params = Params::new(
            config.argon2_memory_kib,
            config.argon2_iterations,
            Params::DEFAULT_P_COST,
            None,
        )
        .map_err(CredentialError::Params)?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a password into a PHC string.
    pub fn hash(&self, password: &Plaintext) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(CredentialError::Hash)?
            .to_string())
    }

    /// Verify a password against a stored PHC string.
    ///
    /// The cost parameters are read from the stored hash, so credentials
    /// created under older settings keep working.
    pub fn verify(&self, hash: &str, password: &Plaintext) -> Result<bool, CredentialError> {
        let parsed = PasswordHash::new(hash).map_err(CredentialError::Corrupt)?;
        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

/// Low-cost hasher for tests.
#[cfg(test)]
pub(crate) fn cheap_credentials() -> Credentials {
    Credentials::new(&SecurityConfig {
        argon2_memory_kib: 256,
        argon2_iterations: 1,
    })
    .expect("valid test parameters")
}
