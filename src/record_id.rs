//! A newtype for the opaque string handles that identify stored records.

use std::fmt::Display;

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The opaque handle for a stored record: a user, an income record or a
/// fixed-expense sub-record.
///
/// The store's native identifier type never crosses this boundary; callers
/// only ever see the canonical 24-character lowercase hexadecimal rendering.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Mint a fresh identifier for a record created by this layer.
    pub fn random() -> Self {
        Self(ObjectId::new().to_hex())
    }

    /// Parse an identifier from caller input.
    ///
    /// The value is trimmed and canonicalised to lowercase hexadecimal.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::ShapeViolation] if the input is empty or only spaces,
    /// - or [Error::SemanticViolation] if the input is not a syntactically
    ///   valid store identifier.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::ShapeViolation(
                "id must not be an empty string or only spaces".to_owned(),
            ));
        }

        let object_id = ObjectId::parse_str(trimmed).map_err(|_| {
            Error::SemanticViolation(format!("\"{trimmed}\" is not a valid record id"))
        })?;

        Ok(Self(object_id.to_hex()))
    }

    /// Wrap an identifier without validating it.
    ///
    /// Intended for values read back from the store, which are valid by
    /// construction. This function has `_unchecked` in the name but is not
    /// `unsafe`, because a malformed identifier causes incorrect behaviour
    /// but does not affect memory safety.
    pub fn new_unchecked(raw: String) -> Self {
        Self(raw)
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod record_id_tests {
    use crate::Error;

    use super::RecordId;

    #[test]
    fn parse_accepts_canonical_hex() {
        let id = RecordId::parse("507f1f77bcf86cd799439011").unwrap();

        assert_eq!(id.as_str(), "507f1f77bcf86cd799439011");
    }

    #[test]
    fn parse_trims_and_lowercases() {
        let id = RecordId::parse("  507F1F77BCF86CD799439011  ").unwrap();

        assert_eq!(id.as_str(), "507f1f77bcf86cd799439011");
    }

    #[test]
    fn parse_rejects_empty_input() {
        let result = RecordId::parse("   ");

        assert!(matches!(result, Err(Error::ShapeViolation(_))));
    }

    #[test]
    fn parse_rejects_wrong_length() {
        let result = RecordId::parse("abc123");

        assert!(matches!(result, Err(Error::SemanticViolation(_))));
    }

    #[test]
    fn parse_rejects_non_hex_characters() {
        let result = RecordId::parse("507f1f77bcf86cd79943901z");

        assert!(matches!(result, Err(Error::SemanticViolation(_))));
    }

    #[test]
    fn random_ids_are_parseable_and_distinct() {
        let first = RecordId::random();
        let second = RecordId::random();

        assert_ne!(first, second);
        assert_eq!(RecordId::parse(first.as_str()).unwrap(), first);
    }
}
