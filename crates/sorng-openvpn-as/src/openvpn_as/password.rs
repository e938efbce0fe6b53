//! Local password rules for servers that lack `SetLocalPassword`.
//!
//! Newer Access Server builds enforce complexity themselves. On older ones
//! the password is stored directly as a SHA-256 digest property, so the
//! checks have to happen here first.

use sha2::{Digest, Sha256};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Symbols the server accepts. Colon and double quote are not among them.
pub const PASSWORD_SYMBOLS: &str = "!@#$%&'()*+,-/[\\]^_`{|}~<>.";

/// At least eight characters with an uppercase letter, a lowercase letter,
/// a digit and one of [`PASSWORD_SYMBOLS`].
pub fn is_password_complex(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(|c| c.is_uppercase())
        && password.chars().any(|c| c.is_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SYMBOLS.contains(c))
}

/// Lowercase hex SHA-256 of the password, the format stored in
/// `pvt_password_digest`.
pub fn legacy_password_digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}
