//! The storage boundary: per-collection ports and the adapters that
//! implement them.
//!
//! The ports describe how the repositories expect to talk to a document
//! store, one method per driver round trip. Adapters return `Option` for
//! lookups and for write operations that report their effect; translating
//! absence into [crate::Error::NotFound] or [crate::Error::StoreFailure] is
//! the repositories' job. No adapter leaks its native identifier type.

use async_trait::async_trait;

use crate::{
    error::Error,
    income::Income,
    record_id::RecordId,
    user::{FixedExpense, User},
};

pub mod memory;
pub mod mongo;

pub use memory::{MemoryIncomeStore, MemoryUserStore};
pub use mongo::{MongoIncomeStore, MongoUserStore, connect, ensure_indexes};

/// Handles the persistence of income records.
#[async_trait]
pub trait IncomeStore: Send + Sync {
    /// Find a record by its primary identifier.
    async fn find_by_id(&self, id: &RecordId) -> Result<Option<Income>, Error>;

    /// Find a record by its correlation token.
    async fn find_by_uuid(&self, uuid: &str) -> Result<Option<Income>, Error>;

    /// Insert a new record.
    async fn insert(&self, record: &Income) -> Result<(), Error>;

    /// Every record owned by `user_id`, in store order.
    async fn find_by_user(&self, user_id: &RecordId) -> Result<Vec<Income>, Error>;

    /// Every record owned by `user_id` whose `MM/DD/YYYY` date string matches
    /// the regular expression `pattern`, in store order.
    async fn find_by_user_matching_date(
        &self,
        user_id: &RecordId,
        pattern: &str,
    ) -> Result<Vec<Income>, Error>;

    /// Delete the record with the given primary identifier, returning the
    /// removed record, or `None` if nothing matched.
    async fn delete_by_id(&self, id: &RecordId) -> Result<Option<Income>, Error>;

    /// Delete the record with the given correlation token, returning the
    /// removed record, or `None` if nothing matched.
    async fn delete_by_uuid(&self, uuid: &str) -> Result<Option<Income>, Error>;

    /// Replace the record with the given correlation token, returning the
    /// record as it is after the replacement, or `None` if nothing matched.
    async fn replace_by_uuid(&self, uuid: &str, record: &Income) -> Result<Option<Income>, Error>;
}

/// Handles the persistence of user accounts and their nested category and
/// fixed-expense lists.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by their identifier.
    async fn find_by_id(&self, id: &RecordId) -> Result<Option<User>, Error>;

    /// Find a user by their (already lower-cased) email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error>;

    /// Insert a new user.
    ///
    /// Adapters that enforce email uniqueness at the storage level surface a
    /// duplicate as [Error::Conflict].
    async fn insert(&self, user: &User) -> Result<(), Error>;

    /// Replace every field of the stored user except the identifier,
    /// returning the user as stored afterwards, or `None` if no user matched.
    async fn update_profile(&self, id: &RecordId, user: &User) -> Result<Option<User>, Error>;

    /// Append a category to the user's list, returning the updated user, or
    /// `None` if no user matched.
    async fn push_category(&self, id: &RecordId, category: &str) -> Result<Option<User>, Error>;

    /// Remove a category from the user's list, returning the updated user,
    /// or `None` if no user matched.
    async fn pull_category(&self, id: &RecordId, category: &str) -> Result<Option<User>, Error>;

    /// Append a fixed expense to the user's list, returning the updated
    /// user, or `None` if no user matched.
    async fn push_fixed_expense(
        &self,
        id: &RecordId,
        expense: &FixedExpense,
    ) -> Result<Option<User>, Error>;

    /// Remove the fixed expense with `expense_id` from the user's list,
    /// returning the updated user, or `None` if either the user or the
    /// sub-record does not exist.
    async fn pull_fixed_expense(
        &self,
        id: &RecordId,
        expense_id: &RecordId,
    ) -> Result<Option<User>, Error>;

    /// Replace the title, category and amount of the fixed expense matching
    /// `expense.id`, returning the updated user, or `None` if either the
    /// user or the sub-record does not exist.
    async fn update_fixed_expense(
        &self,
        id: &RecordId,
        expense: &FixedExpense,
    ) -> Result<Option<User>, Error>;
}
