//! In-process store adapters backed by plain vectors.
//!
//! These mirror the document-store semantics of the production adapters
//! closely enough for the repository tests to run without a database server;
//! date filters are evaluated with the same regular expressions the MongoDB
//! adapter sends as `$regex` predicates.

use std::sync::Mutex;

use async_trait::async_trait;
use regex::Regex;

use crate::{
    error::Error,
    income::Income,
    record_id::RecordId,
    user::{FixedExpense, User},
};

use super::{IncomeStore, UserStore};

fn pattern_error(error: regex::Error) -> Error {
    Error::StoreFailure(format!("invalid date pattern: {error}"))
}

/// An [IncomeStore] that keeps records in a vector.
#[derive(Debug, Default)]
pub struct MemoryIncomeStore {
    records: Mutex<Vec<Income>>,
}

impl MemoryIncomeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

/// # Panics
///
/// Every method panics if the store lock has been poisoned by a panicking
/// thread.
#[async_trait]
impl IncomeStore for MemoryIncomeStore {
    async fn find_by_id(&self, id: &RecordId) -> Result<Option<Income>, Error> {
        let records = self.records.lock().unwrap();

        Ok(records.iter().find(|record| &record.id == id).cloned())
    }

    async fn find_by_uuid(&self, uuid: &str) -> Result<Option<Income>, Error> {
        let records = self.records.lock().unwrap();

        Ok(records.iter().find(|record| record.uuid == uuid).cloned())
    }

    async fn insert(&self, record: &Income) -> Result<(), Error> {
        self.records.lock().unwrap().push(record.clone());

        Ok(())
    }

    async fn find_by_user(&self, user_id: &RecordId) -> Result<Vec<Income>, Error> {
        let records = self.records.lock().unwrap();

        Ok(records
            .iter()
            .filter(|record| &record.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_by_user_matching_date(
        &self,
        user_id: &RecordId,
        pattern: &str,
    ) -> Result<Vec<Income>, Error> {
        let matcher = Regex::new(pattern).map_err(pattern_error)?;
        let records = self.records.lock().unwrap();

        Ok(records
            .iter()
            .filter(|record| {
                &record.user_id == user_id && matcher.is_match(&record.date.to_string())
            })
            .cloned()
            .collect())
    }

    async fn delete_by_id(&self, id: &RecordId) -> Result<Option<Income>, Error> {
        let mut records = self.records.lock().unwrap();
        let position = records.iter().position(|record| &record.id == id);

        Ok(position.map(|index| records.remove(index)))
    }

    async fn delete_by_uuid(&self, uuid: &str) -> Result<Option<Income>, Error> {
        let mut records = self.records.lock().unwrap();
        let position = records.iter().position(|record| record.uuid == uuid);

        Ok(position.map(|index| records.remove(index)))
    }

    async fn replace_by_uuid(&self, uuid: &str, record: &Income) -> Result<Option<Income>, Error> {
        let mut records = self.records.lock().unwrap();

        match records.iter_mut().find(|stored| stored.uuid == uuid) {
            Some(stored) => {
                *stored = record.clone();
                Ok(Some(stored.clone()))
            }
            None => Ok(None),
        }
    }
}

/// A [UserStore] that keeps accounts in a vector.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

/// # Panics
///
/// Every method panics if the store lock has been poisoned by a panicking
/// thread.
#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: &RecordId) -> Result<Option<User>, Error> {
        let users = self.users.lock().unwrap();

        Ok(users.iter().find(|user| &user.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let users = self.users.lock().unwrap();

        Ok(users.iter().find(|user| user.email == email).cloned())
    }

    async fn insert(&self, user: &User) -> Result<(), Error> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|stored| stored.email == user.email) {
            return Err(Error::Conflict(format!(
                "a user with the email \"{}\" already exists",
                user.email
            )));
        }
        users.push(user.clone());

        Ok(())
    }

    async fn update_profile(&self, id: &RecordId, user: &User) -> Result<Option<User>, Error> {
        let mut users = self.users.lock().unwrap();

        match users.iter_mut().find(|stored| &stored.id == id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(Some(stored.clone()))
            }
            None => Ok(None),
        }
    }

    async fn push_category(&self, id: &RecordId, category: &str) -> Result<Option<User>, Error> {
        let mut users = self.users.lock().unwrap();

        match users.iter_mut().find(|stored| &stored.id == id) {
            Some(stored) => {
                stored.categories.push(category.to_owned());
                Ok(Some(stored.clone()))
            }
            None => Ok(None),
        }
    }

    async fn pull_category(&self, id: &RecordId, category: &str) -> Result<Option<User>, Error> {
        let mut users = self.users.lock().unwrap();

        match users.iter_mut().find(|stored| &stored.id == id) {
            Some(stored) => {
                stored.categories.retain(|name| name != category);
                Ok(Some(stored.clone()))
            }
            None => Ok(None),
        }
    }

    async fn push_fixed_expense(
        &self,
        id: &RecordId,
        expense: &FixedExpense,
    ) -> Result<Option<User>, Error> {
        let mut users = self.users.lock().unwrap();

        match users.iter_mut().find(|stored| &stored.id == id) {
            Some(stored) => {
                stored.fixed_expenses.push(expense.clone());
                Ok(Some(stored.clone()))
            }
            None => Ok(None),
        }
    }

    async fn pull_fixed_expense(
        &self,
        id: &RecordId,
        expense_id: &RecordId,
    ) -> Result<Option<User>, Error> {
        let mut users = self.users.lock().unwrap();
        let Some(stored) = users.iter_mut().find(|stored| &stored.id == id) else {
            return Ok(None);
        };
        let Some(index) = stored
            .fixed_expenses
            .iter()
            .position(|expense| &expense.id == expense_id)
        else {
            return Ok(None);
        };
        stored.fixed_expenses.remove(index);

        Ok(Some(stored.clone()))
    }

    async fn update_fixed_expense(
        &self,
        id: &RecordId,
        expense: &FixedExpense,
    ) -> Result<Option<User>, Error> {
        let mut users = self.users.lock().unwrap();
        let Some(stored) = users.iter_mut().find(|stored| &stored.id == id) else {
            return Ok(None);
        };
        let Some(slot) = stored
            .fixed_expenses
            .iter_mut()
            .find(|stored_expense| stored_expense.id == expense.id)
        else {
            return Ok(None);
        };
        slot.title = expense.title.clone();
        slot.category = expense.category.clone();
        slot.amount = expense.amount;

        Ok(Some(stored.clone()))
    }
}
