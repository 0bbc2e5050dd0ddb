//! Salted password hashing and verification.
//!
//! [PasswordHash] wraps a bcrypt hash string, and [CredentialHasher] is the seam
//! the request handlers use to produce and check those hashes.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::Error;

/// A salted and hashed password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Create a new `PasswordHash` without any validation.
    ///
    /// The caller should ensure that `raw_password_hash` is a valid password hash.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if an invalid hash is provided it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_string())
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Turns plaintext passwords into [PasswordHash]es and checks candidates against them.
pub trait CredentialHasher: Clone + Send + Sync + 'static {
    /// Hash `raw_password` with a fresh random salt.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if the hashing library fails.
    fn hash(&self, raw_password: &str) -> Result<PasswordHash, Error>;

    /// Check whether `raw_password` hashes to `password_hash` using the salt embedded in the hash.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if `password_hash` is not a well-formed hash.
    fn verify(&self, raw_password: &str, password_hash: &PasswordHash) -> Result<bool, Error>;
}

/// A [CredentialHasher] backed by bcrypt.
///
/// Verification compares the full digest in constant time, so a mismatch in the
/// first byte takes as long to reject as a mismatch in the last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    /// The cost used for hashing passwords when none is specified.
    pub const DEFAULT_COST: u32 = 10;

    /// Create a hasher with the specified `cost`.
    ///
    /// `cost` increases the rounds of hashing and therefore the time needed to
    /// hash or verify a password. bcrypt accepts values from 4 to 31.
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// The cost this hasher applies to new hashes.
    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(Self::DEFAULT_COST)
    }
}

impl CredentialHasher for BcryptHasher {
    fn hash(&self, raw_password: &str) -> Result<PasswordHash, Error> {
        bcrypt::hash(raw_password, self.cost)
            .map(PasswordHash)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    fn verify(&self, raw_password: &str, password_hash: &PasswordHash) -> Result<bool, Error> {
        bcrypt::verify(raw_password, password_hash.as_ref())
            .map_err(|error| Error::HashingError(error.to_string()))
    }
}
