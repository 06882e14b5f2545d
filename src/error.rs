//! Defines the crate level error type shared by the validators, the
//! repositories and the store adapters.

/// The errors that may occur while validating input or accessing the record
/// store.
///
/// Every operation in this crate reports failure through exactly one of these
/// five conditions, so callers can dispatch on the kind of failure instead of
/// matching on message text.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The input failed a basic type, length or character-class check before
    /// any semantic evaluation, e.g. an empty string, a name with digits in
    /// it, or an amount containing two decimal points.
    #[error("{0}")]
    ShapeViolation(String),

    /// The input was well formed but violates a domain rule, e.g. a date in
    /// the future, an age under the minimum, or an amount with more than two
    /// fractional digits.
    #[error("{0}")]
    SemanticViolation(String),

    /// The operation would violate a uniqueness rule, e.g. registering an
    /// email that already belongs to an account or adding a category the user
    /// already has. The caller can retry with different input.
    #[error("{0}")]
    Conflict(String),

    /// A lookup by identifier, correlation token, category or fixed-expense
    /// id found nothing.
    #[error("{0}")]
    NotFound(String),

    /// The underlying store acknowledged an operation but reported no effect,
    /// or failed outright. No partial-state cleanup is attempted.
    #[error("store operation failed: {0}")]
    StoreFailure(String),
}

#[cfg(test)]
mod error_tests {
    use super::Error;

    #[test]
    fn display_includes_message() {
        let error = Error::NotFound("no user with id 42".to_owned());

        assert_eq!(error.to_string(), "no user with id 42");
    }

    #[test]
    fn store_failure_display_is_prefixed() {
        let error = Error::StoreFailure("insert was not acknowledged".to_owned());

        assert_eq!(
            error.to_string(),
            "store operation failed: insert was not acknowledged"
        );
    }
}
