//! One-way password hashing. Clear text passwords never reach the store.

use std::fmt::Display;

use bcrypt::{DEFAULT_COST, hash, verify};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A bcrypt hash of a user's password.
///
/// This is the only form in which a password is ever persisted or returned
/// from the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hash a password that has already passed validation.
    ///
    /// # Errors
    /// Returns an [Error::StoreFailure] if the underlying hashing library
    /// fails; the message should be logged server side rather than shown to
    /// clients.
    pub fn new(validated_password: &str) -> Result<Self, Error> {
        hash(validated_password, DEFAULT_COST)
            .map(Self)
            .map_err(|error| Error::StoreFailure(format!("password hashing failed: {error}")))
    }

    /// Wrap a hash read back from the store without re-hashing.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`,
    /// because a string that is not a bcrypt hash causes verification to
    /// fail but does not affect memory safety.
    pub fn new_unchecked(hash: String) -> Self {
        Self(hash)
    }

    /// Check that `password` matches this hash.
    ///
    /// # Errors
    /// Returns an [Error::StoreFailure] if the stored hash is malformed.
    pub fn verify(&self, password: &str) -> Result<bool, Error> {
        verify(password, &self.0)
            .map_err(|error| Error::StoreFailure(format!("password verification failed: {error}")))
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod password_hash_tests {
    use super::PasswordHash;

    #[test]
    fn hash_password_produces_verifiable_hash() {
        let hash = PasswordHash::new("Abc12345!").unwrap();

        assert!(hash.verify("Abc12345!").unwrap());
        assert!(!hash.verify("TheWrongPassword1!").unwrap());
    }

    #[test]
    fn hash_duplicate_password_produces_unique_hash() {
        let hash = PasswordHash::new("Abc12345!").unwrap();
        let duplicate_hash = PasswordHash::new("Abc12345!").unwrap();

        assert_ne!(hash, duplicate_hash);
    }

    #[test]
    fn verify_fails_cleanly_on_malformed_hash() {
        let hash = PasswordHash::new_unchecked("not a bcrypt hash".to_owned());

        assert!(hash.verify("Abc12345!").is_err());
    }
}
