//! Income records and the repository that validates and persists them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    clock::Clock, date::RecordDate, error::Error, record_id::RecordId, store::IncomeStore,
    validation,
};

// ============================================================================
// MODELS
// ============================================================================

/// A single income or expense event recorded against a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Income {
    /// The record's primary identifier.
    pub id: RecordId,
    /// The identifier of the user the record belongs to. Only the shape of
    /// this reference is checked; deleting a user does not cascade here.
    pub user_id: RecordId,
    /// The correlation token: a random value minted at creation and stable
    /// for the record's whole life, so external callers can update and
    /// delete records without depending on the store-assigned identifier.
    pub uuid: String,
    /// The amount of money earned or spent.
    pub amount: f64,
    /// When the event happened.
    pub date: RecordDate,
    /// A free-text description, empty when none was given.
    pub description: String,
}

// ============================================================================
// REPOSITORY
// ============================================================================

/// Validates raw input and reads and writes income records through an
/// [IncomeStore].
///
/// Listing operations return records sorted most recent first, comparing
/// calendar dates rather than the stored date strings.
#[derive(Debug, Clone)]
pub struct IncomeRepository<S, C> {
    store: S,
    clock: C,
}

impl<S, C> IncomeRepository<S, C>
where
    S: IncomeStore,
    C: Clock,
{
    /// Create a repository over the given store and clock.
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Create a new income record for `user_id` and return it as persisted.
    ///
    /// The description is optional; when present it must pass the free-text
    /// check, otherwise it defaults to the empty string. The freshly written
    /// record is read back through [IncomeRepository::get_by_id] so the
    /// caller sees exactly what the store holds.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::ShapeViolation] or [Error::SemanticViolation] if any input
    ///   fails validation,
    /// - or [Error::StoreFailure] if the insert fails.
    pub async fn add(
        &self,
        user_id: &str,
        amount: &str,
        date: &str,
        description: Option<&str>,
    ) -> Result<Income, Error> {
        let user_id = validation::check_id(user_id)?;
        let amount = validation::check_amount(amount)?;
        let date = validation::check_date(date, self.clock.today())?;
        let description = check_optional_description(description)?;

        let record = Income {
            id: RecordId::random(),
            user_id,
            uuid: Uuid::new_v4().to_string(),
            amount,
            date,
            description,
        };
        self.store.insert(&record).await?;

        self.get_by_id(record.id.as_str()).await
    }

    /// Get the record with the given primary identifier.
    ///
    /// # Errors
    /// Returns an [Error::NotFound] if no record matches.
    pub async fn get_by_id(&self, id: &str) -> Result<Income, Error> {
        let id = validation::check_id(id)?;

        self.store
            .find_by_id(&id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("no income record with id {id}")))
    }

    /// Get the record with the given correlation token.
    ///
    /// # Errors
    /// Returns an [Error::NotFound] if no record matches.
    pub async fn get_by_uuid(&self, uuid: &str) -> Result<Income, Error> {
        let uuid = validation::check_string(uuid)?;

        self.store
            .find_by_uuid(&uuid)
            .await?
            .ok_or_else(|| Error::NotFound(format!("no income record with uuid {uuid}")))
    }

    /// Every record owned by `user_id`, most recent first.
    ///
    /// An empty result is not an error.
    ///
    /// # Errors
    /// Returns an [Error::ShapeViolation] or [Error::SemanticViolation] if
    /// the identifier is malformed.
    pub async fn all_for_user(&self, user_id: &str) -> Result<Vec<Income>, Error> {
        let user_id = validation::check_id(user_id)?;
        let mut records = self.store.find_by_user(&user_id).await?;
        sort_most_recent_first(&mut records);

        Ok(records)
    }

    /// The records owned by `user_id` in the given month, most recent first.
    ///
    /// The month must be exactly 2 digits and the year exactly 4 digits, so
    /// `"7"` is rejected where `"07"` is accepted.
    ///
    /// # Errors
    /// Returns an [Error::ShapeViolation] if the month or year has the wrong
    /// shape.
    pub async fn for_user_in_month(
        &self,
        user_id: &str,
        month: &str,
        year: &str,
    ) -> Result<Vec<Income>, Error> {
        let user_id = validation::check_id(user_id)?;
        let month = validation::check_number(month)?;
        let year = validation::check_number(year)?;
        if month.len() != 2 || year.len() != 4 {
            return Err(Error::ShapeViolation(
                "month must be 2 digits and year must be 4 digits".to_owned(),
            ));
        }

        let pattern = month_year_pattern(&month, &year);
        let mut records = self
            .store
            .find_by_user_matching_date(&user_id, &pattern)
            .await?;
        sort_most_recent_first(&mut records);

        Ok(records)
    }

    /// The records owned by `user_id` in the given year, most recent first.
    ///
    /// # Errors
    /// Returns an [Error::ShapeViolation] if the year is not exactly 4
    /// digits.
    pub async fn for_user_in_year(&self, user_id: &str, year: &str) -> Result<Vec<Income>, Error> {
        let user_id = validation::check_id(user_id)?;
        let year = validation::check_number(year)?;
        if year.len() != 4 {
            return Err(Error::ShapeViolation("year must be 4 digits".to_owned()));
        }

        let pattern = year_pattern(&year);
        let mut records = self
            .store
            .find_by_user_matching_date(&user_id, &pattern)
            .await?;
        sort_most_recent_first(&mut records);

        Ok(records)
    }

    /// Delete the record with the given primary identifier and return it.
    ///
    /// # Errors
    /// Returns an [Error::NotFound] if no record matches.
    pub async fn remove_by_id(&self, id: &str) -> Result<Income, Error> {
        let id = validation::check_id(id)?;

        self.store
            .delete_by_id(&id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("no income record with id {id}")))
    }

    /// Delete the record with the given correlation token and return it.
    ///
    /// # Errors
    /// Returns an [Error::NotFound] if no record matches.
    pub async fn remove_by_uuid(&self, uuid: &str) -> Result<Income, Error> {
        let uuid = validation::check_string(uuid)?;

        self.store
            .delete_by_uuid(&uuid)
            .await?
            .ok_or_else(|| Error::NotFound(format!("no income record with uuid {uuid}")))
    }

    /// Replace the amount, date and description of the record with the given
    /// correlation token, preserving its owner and token, and return the
    /// updated record.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::ShapeViolation] or [Error::SemanticViolation] if any input
    ///   fails validation,
    /// - [Error::NotFound] if no record has the token,
    /// - or [Error::StoreFailure] if the replace reports no effect.
    pub async fn update_by_uuid(
        &self,
        uuid: &str,
        amount: &str,
        date: &str,
        description: Option<&str>,
    ) -> Result<Income, Error> {
        let uuid = validation::check_string(uuid)?;
        let amount = validation::check_amount(amount)?;
        let date = validation::check_date(date, self.clock.today())?;
        let description = check_optional_description(description)?;

        let existing = self
            .store
            .find_by_uuid(&uuid)
            .await?
            .ok_or_else(|| Error::NotFound(format!("no income record with uuid {uuid}")))?;

        let replacement = Income {
            id: existing.id,
            user_id: existing.user_id,
            uuid: existing.uuid,
            amount,
            date,
            description,
        };

        self.store
            .replace_by_uuid(&uuid, &replacement)
            .await?
            .ok_or_else(|| {
                Error::StoreFailure(format!("could not update income record with uuid {uuid}"))
            })
    }
}

fn check_optional_description(description: Option<&str>) -> Result<String, Error> {
    match description {
        Some(text) if !text.is_empty() => validation::check_string(text),
        _ => Ok(String::new()),
    }
}

fn sort_most_recent_first(records: &mut [Income]) {
    records.sort_by(|a, b| b.date.cmp(&a.date));
}

fn month_year_pattern(month: &str, year: &str) -> String {
    format!("^{month}/\\d{{2}}/{year}")
}

fn year_pattern(year: &str) -> String {
    format!("^(0[1-9]|1[0-2])/\\d{{2}}/{year}")
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod income_repository_tests {
    use time::macros::date;

    use crate::{Error, clock::FixedClock, store::MemoryIncomeStore};

    use super::{IncomeRepository, month_year_pattern, year_pattern};

    const OWNER: &str = "507f1f77bcf86cd799439011";
    const OTHER_OWNER: &str = "507f191e810c19729de860ea";

    fn get_repository() -> IncomeRepository<MemoryIncomeStore, FixedClock> {
        IncomeRepository::new(MemoryIncomeStore::new(), FixedClock(date!(2024 - 06 - 15)))
    }

    #[tokio::test]
    async fn add_returns_the_persisted_record() {
        let repository = get_repository();

        let record = repository
            .add(OWNER, "12.5", "03/20/2024", Some("Paycheck"))
            .await
            .unwrap();

        assert_eq!(record.user_id.as_str(), OWNER);
        assert_eq!(record.amount, 12.5);
        assert_eq!(record.date.to_string(), "03/20/2024");
        assert_eq!(record.description, "Paycheck");
        assert_eq!(repository.get_by_id(record.id.as_str()).await.unwrap(), record);
    }

    #[tokio::test]
    async fn add_defaults_description_to_empty() {
        let repository = get_repository();

        let record = repository
            .add(OWNER, "100", "01/01/2024", None)
            .await
            .unwrap();

        assert_eq!(record.description, "");
    }

    #[tokio::test]
    async fn add_rejects_future_date() {
        let repository = get_repository();

        let result = repository.add(OWNER, "100", "06/16/2024", None).await;

        assert!(matches!(result, Err(Error::SemanticViolation(_))));
    }

    #[tokio::test]
    async fn add_rejects_malformed_amount() {
        let repository = get_repository();

        assert!(repository.add(OWNER, "12.345", "01/01/2024", None).await.is_err());
        assert!(repository.add(OWNER, "12..3", "01/01/2024", None).await.is_err());
    }

    #[tokio::test]
    async fn get_by_id_fails_for_unknown_record() {
        let repository = get_repository();

        let result = repository.get_by_id(OTHER_OWNER).await;

        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn get_by_uuid_finds_the_record() {
        let repository = get_repository();
        let record = repository
            .add(OWNER, "50", "02/02/2024", None)
            .await
            .unwrap();

        let retrieved = repository.get_by_uuid(&record.uuid).await.unwrap();

        assert_eq!(retrieved, record);
    }

    #[tokio::test]
    async fn all_for_user_sorts_most_recent_first() {
        let repository = get_repository();
        for date in ["01/01/2024", "03/01/2024", "02/01/2024"] {
            repository.add(OWNER, "10", date, None).await.unwrap();
        }

        let records = repository.all_for_user(OWNER).await.unwrap();

        let dates: Vec<String> = records
            .iter()
            .map(|record| record.date.to_string())
            .collect();
        assert_eq!(dates, ["03/01/2024", "02/01/2024", "01/01/2024"]);
    }

    #[tokio::test]
    async fn all_for_user_returns_empty_for_unknown_owner() {
        let repository = get_repository();

        let records = repository.all_for_user(OWNER).await.unwrap();

        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn all_for_user_excludes_other_owners() {
        let repository = get_repository();
        repository.add(OWNER, "10", "01/01/2024", None).await.unwrap();
        repository
            .add(OTHER_OWNER, "20", "01/02/2024", None)
            .await
            .unwrap();

        let records = repository.all_for_user(OWNER).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].user_id.as_str(), OWNER);
    }

    #[tokio::test]
    async fn for_user_in_month_filters_by_month_and_year() {
        let repository = get_repository();
        repository.add(OWNER, "10", "03/15/2023", None).await.unwrap();
        repository.add(OWNER, "20", "03/20/2024", None).await.unwrap();

        let records = repository
            .for_user_in_month(OWNER, "03", "2024")
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date.to_string(), "03/20/2024");
    }

    #[tokio::test]
    async fn for_user_in_month_rejects_single_digit_month() {
        let repository = get_repository();

        let result = repository.for_user_in_month(OWNER, "7", "2024").await;

        assert!(matches!(result, Err(Error::ShapeViolation(_))));
    }

    #[tokio::test]
    async fn for_user_in_year_matches_every_month_of_the_year() {
        let repository = get_repository();
        for date in ["01/05/2024", "11/30/2024", "12/31/2023"] {
            repository.add(OWNER, "10", date, None).await.unwrap();
        }

        let records = repository.for_user_in_year(OWNER, "2024").await.unwrap();

        let dates: Vec<String> = records
            .iter()
            .map(|record| record.date.to_string())
            .collect();
        assert_eq!(dates, ["11/30/2024", "01/05/2024"]);
    }

    #[tokio::test]
    async fn remove_by_id_returns_the_removed_record() {
        let repository = get_repository();
        let record = repository
            .add(OWNER, "10", "01/01/2024", None)
            .await
            .unwrap();

        let removed = repository.remove_by_id(record.id.as_str()).await.unwrap();

        assert_eq!(removed, record);
        assert!(matches!(
            repository.get_by_id(record.id.as_str()).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn remove_by_uuid_fails_for_unknown_token() {
        let repository = get_repository();

        let result = repository.remove_by_uuid("no-such-token").await;

        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn update_by_uuid_preserves_owner_and_token() {
        let repository = get_repository();
        let record = repository
            .add(OWNER, "10", "01/01/2024", Some("Before"))
            .await
            .unwrap();

        let updated = repository
            .update_by_uuid(&record.uuid, "25.75", "02/02/2024", Some("After"))
            .await
            .unwrap();

        assert_eq!(updated.id, record.id);
        assert_eq!(updated.user_id, record.user_id);
        assert_eq!(updated.uuid, record.uuid);
        assert_eq!(updated.amount, 25.75);
        assert_eq!(updated.date.to_string(), "02/02/2024");
        assert_eq!(updated.description, "After");
    }

    #[tokio::test]
    async fn update_by_uuid_fails_for_unknown_token() {
        let repository = get_repository();

        let result = repository
            .update_by_uuid("no-such-token", "10", "01/01/2024", None)
            .await;

        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn month_pattern_anchors_month_and_year() {
        assert_eq!(month_year_pattern("03", "2024"), "^03/\\d{2}/2024");
    }

    #[test]
    fn year_pattern_matches_any_month() {
        assert_eq!(year_pattern("2024"), "^(0[1-9]|1[0-2])/\\d{2}/2024");
    }
}
