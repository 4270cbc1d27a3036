//! Player name rules.

use thiserror::Error;

pub const MIN_NAME_LEN: usize = 3;
pub const MAX_NAME_LEN: usize = 14;

/// Placeholder name given to unauthenticated connections; never a real identity.
pub const RESERVED_NAME: &str = "unnamed";

/// Why a proposed name was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("name must be at least {MIN_NAME_LEN} letters")]
    TooShort,
    #[error("name must be at most {MAX_NAME_LEN} letters")]
    TooLong,
    #[error("name may only contain letters")]
    NotAlphabetic,
    #[error("name is reserved")]
    Reserved,
}

/// Check a proposed name and return it in canonical form: first letter
/// upper-case, the rest lower-case.
pub fn canonical(input: &str) -> Result<String, NameError> {
    let name = input.trim();
    if !name.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(NameError::NotAlphabetic);
    }
    if name.len() < MIN_NAME_LEN {
        return Err(NameError::TooShort);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(NameError::TooLong);
    }
    if name.eq_ignore_ascii_case(RESERVED_NAME) {
        return Err(NameError::Reserved);
    }

    let mut out = String::with_capacity(name.len());
    for (i, c) in name.chars().enumerate() {
        if i == 0 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c.to_ascii_lowercase());
        }
    }
    Ok(out)
}

/// Case-folded registry key for a name.
pub fn key(name: &str) -> String {
    name.to_ascii_lowercase()
}
