//! MongoDB-backed adapters for the store ports.
//!
//! Documents keep the original wire field names (`userId`, `firstName`,
//! `fixedExpenses`, ...) so the collections stay compatible with data
//! written by earlier deployments. Identifiers are converted between
//! [RecordId] and the driver's `ObjectId` at every entry and exit point.

use async_trait::async_trait;
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Document, doc, oid::ObjectId, to_bson, to_document},
    error::{ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument},
};
use serde::{Deserialize, Serialize};

use crate::{
    config::DatabaseSettings,
    date::RecordDate,
    error::Error,
    income::Income,
    password::PasswordHash,
    record_id::RecordId,
    user::{FixedExpense, User},
};

use super::{IncomeStore, UserStore};

const USERS_COLLECTION: &str = "users";
const INCOME_COLLECTION: &str = "income";

/// Connect to the database named in `settings`.
///
/// # Errors
/// Returns an [Error::StoreFailure] if the connection string cannot be
/// parsed or the client cannot be initialised.
pub async fn connect(settings: &DatabaseSettings) -> Result<Database, Error> {
    let client = Client::with_uri_str(&settings.url)
        .await
        .map_err(store_error)?;

    Ok(client.database(&settings.name))
}

/// Create the indexes the adapters rely on.
///
/// The unique index on `users.email` is the actual uniqueness guarantee for
/// accounts; the repository-level duplicate check is only a fast path for a
/// friendlier error.
///
/// # Errors
/// Returns an [Error::StoreFailure] if index creation fails.
pub async fn ensure_indexes(database: &Database) -> Result<(), Error> {
    let users: Collection<UserDocument> = database.collection(USERS_COLLECTION);
    let unique_email = IndexModel::builder()
        .keys(doc! { "email": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();
    users.create_index(unique_email).await.map_err(store_error)?;

    let income: Collection<IncomeDocument> = database.collection(INCOME_COLLECTION);
    let uuid_index = IndexModel::builder().keys(doc! { "uuid": 1 }).build();
    income.create_index(uuid_index).await.map_err(store_error)?;

    Ok(())
}

fn store_error(error: mongodb::error::Error) -> Error {
    tracing::error!("an unhandled database error occurred: {error}");

    Error::StoreFailure(error.to_string())
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    const DUPLICATE_KEY: i32 = 11000;

    match *error.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref write_error)) => {
            write_error.code == DUPLICATE_KEY
        }
        ErrorKind::Command(ref command_error) => command_error.code == DUPLICATE_KEY,
        _ => false,
    }
}

fn object_id(id: &RecordId) -> Result<ObjectId, Error> {
    ObjectId::parse_str(id.as_str())
        .map_err(|_| Error::StoreFailure(format!("\"{id}\" is not a valid store identifier")))
}

fn document_error(error: mongodb::bson::ser::Error) -> Error {
    Error::StoreFailure(format!("could not serialise document: {error}"))
}

/// The `income` collection document.
#[derive(Debug, Serialize, Deserialize)]
struct IncomeDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    #[serde(rename = "userId")]
    user_id: String,
    uuid: String,
    amount: f64,
    date: RecordDate,
    description: String,
}

impl IncomeDocument {
    fn from_record(record: &Income) -> Result<Self, Error> {
        Ok(Self {
            id: object_id(&record.id)?,
            user_id: record.user_id.to_string(),
            uuid: record.uuid.clone(),
            amount: record.amount,
            date: record.date,
            description: record.description.clone(),
        })
    }

    fn into_record(self) -> Income {
        Income {
            id: RecordId::new_unchecked(self.id.to_hex()),
            user_id: RecordId::new_unchecked(self.user_id),
            uuid: self.uuid,
            amount: self.amount,
            date: self.date,
            description: self.description,
        }
    }
}

/// An [IncomeStore] backed by the `income` collection.
#[derive(Clone)]
pub struct MongoIncomeStore {
    collection: Collection<IncomeDocument>,
}

impl MongoIncomeStore {
    /// Create a store over the given database.
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(INCOME_COLLECTION),
        }
    }

    async fn collect(&self, filter: Document) -> Result<Vec<Income>, Error> {
        let mut cursor = self.collection.find(filter).await.map_err(store_error)?;
        let mut records = Vec::new();
        while cursor.advance().await.map_err(store_error)? {
            let document = cursor.deserialize_current().map_err(store_error)?;
            records.push(document.into_record());
        }

        Ok(records)
    }
}

#[async_trait]
impl IncomeStore for MongoIncomeStore {
    async fn find_by_id(&self, id: &RecordId) -> Result<Option<Income>, Error> {
        let document = self
            .collection
            .find_one(doc! { "_id": object_id(id)? })
            .await
            .map_err(store_error)?;

        Ok(document.map(IncomeDocument::into_record))
    }

    async fn find_by_uuid(&self, uuid: &str) -> Result<Option<Income>, Error> {
        let document = self
            .collection
            .find_one(doc! { "uuid": uuid })
            .await
            .map_err(store_error)?;

        Ok(document.map(IncomeDocument::into_record))
    }

    async fn insert(&self, record: &Income) -> Result<(), Error> {
        let document = IncomeDocument::from_record(record)?;
        self.collection
            .insert_one(&document)
            .await
            .map_err(store_error)?;

        Ok(())
    }

    async fn find_by_user(&self, user_id: &RecordId) -> Result<Vec<Income>, Error> {
        self.collect(doc! { "userId": user_id.as_str() }).await
    }

    async fn find_by_user_matching_date(
        &self,
        user_id: &RecordId,
        pattern: &str,
    ) -> Result<Vec<Income>, Error> {
        self.collect(doc! {
            "$and": [
                { "userId": user_id.as_str() },
                { "date": { "$regex": pattern } }
            ]
        })
        .await
    }

    async fn delete_by_id(&self, id: &RecordId) -> Result<Option<Income>, Error> {
        let document = self
            .collection
            .find_one_and_delete(doc! { "_id": object_id(id)? })
            .await
            .map_err(store_error)?;

        Ok(document.map(IncomeDocument::into_record))
    }

    async fn delete_by_uuid(&self, uuid: &str) -> Result<Option<Income>, Error> {
        let document = self
            .collection
            .find_one_and_delete(doc! { "uuid": uuid })
            .await
            .map_err(store_error)?;

        Ok(document.map(IncomeDocument::into_record))
    }

    async fn replace_by_uuid(&self, uuid: &str, record: &Income) -> Result<Option<Income>, Error> {
        let document = IncomeDocument::from_record(record)?;
        let replaced = self
            .collection
            .find_one_and_replace(doc! { "uuid": uuid }, &document)
            .return_document(ReturnDocument::After)
            .await
            .map_err(store_error)?;

        Ok(replaced.map(IncomeDocument::into_record))
    }
}

/// A fixed expense as stored inside a user document.
#[derive(Debug, Serialize, Deserialize)]
struct FixedExpenseDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    title: String,
    category: String,
    amount: f64,
}

impl FixedExpenseDocument {
    fn from_expense(expense: &FixedExpense) -> Result<Self, Error> {
        Ok(Self {
            id: object_id(&expense.id)?,
            title: expense.title.clone(),
            category: expense.category.clone(),
            amount: expense.amount,
        })
    }

    fn into_expense(self) -> FixedExpense {
        FixedExpense {
            id: RecordId::new_unchecked(self.id.to_hex()),
            title: self.title,
            category: self.category,
            amount: self.amount,
        }
    }
}

/// The `users` collection document.
#[derive(Debug, Serialize, Deserialize)]
struct UserDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    #[serde(rename = "firstName")]
    first_name: String,
    #[serde(rename = "lastName")]
    last_name: String,
    email: String,
    gender: String,
    city: String,
    state: String,
    age: i64,
    password: String,
    categories: Vec<String>,
    #[serde(rename = "fixedExpenses")]
    fixed_expenses: Vec<FixedExpenseDocument>,
    balance: f64,
}

impl UserDocument {
    fn from_user(user: &User) -> Result<Self, Error> {
        let fixed_expenses = user
            .fixed_expenses
            .iter()
            .map(FixedExpenseDocument::from_expense)
            .collect::<Result<_, _>>()?;

        Ok(Self {
            id: object_id(&user.id)?,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            gender: user.gender.clone(),
            city: user.city.clone(),
            state: user.state.clone(),
            age: user.age,
            password: user.password_hash.to_string(),
            categories: user.categories.clone(),
            fixed_expenses,
            balance: user.balance,
        })
    }

    fn into_user(self) -> User {
        User {
            id: RecordId::new_unchecked(self.id.to_hex()),
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            gender: self.gender,
            city: self.city,
            state: self.state,
            age: self.age,
            password_hash: PasswordHash::new_unchecked(self.password),
            categories: self.categories,
            fixed_expenses: self
                .fixed_expenses
                .into_iter()
                .map(FixedExpenseDocument::into_expense)
                .collect(),
            balance: self.balance,
        }
    }
}

/// A [UserStore] backed by the `users` collection.
#[derive(Clone)]
pub struct MongoUserStore {
    collection: Collection<UserDocument>,
}

impl MongoUserStore {
    /// Create a store over the given database.
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(USERS_COLLECTION),
        }
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn find_by_id(&self, id: &RecordId) -> Result<Option<User>, Error> {
        let document = self
            .collection
            .find_one(doc! { "_id": object_id(id)? })
            .await
            .map_err(store_error)?;

        Ok(document.map(UserDocument::into_user))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let document = self
            .collection
            .find_one(doc! { "email": email })
            .await
            .map_err(store_error)?;

        Ok(document.map(UserDocument::into_user))
    }

    async fn insert(&self, user: &User) -> Result<(), Error> {
        let document = UserDocument::from_user(user)?;
        self.collection
            .insert_one(&document)
            .await
            .map_err(|error| {
                if is_duplicate_key(&error) {
                    Error::Conflict(format!(
                        "a user with the email \"{}\" already exists",
                        user.email
                    ))
                } else {
                    store_error(error)
                }
            })?;

        Ok(())
    }

    async fn update_profile(&self, id: &RecordId, user: &User) -> Result<Option<User>, Error> {
        let document = UserDocument::from_user(user)?;
        let mut fields = to_document(&document).map_err(document_error)?;
        fields.remove("_id");

        let updated = self
            .collection
            .find_one_and_update(doc! { "_id": object_id(id)? }, doc! { "$set": fields })
            .return_document(ReturnDocument::After)
            .await
            .map_err(|error| {
                if is_duplicate_key(&error) {
                    Error::Conflict(format!(
                        "a user with the email \"{}\" already exists",
                        user.email
                    ))
                } else {
                    store_error(error)
                }
            })?;

        Ok(updated.map(UserDocument::into_user))
    }

    async fn push_category(&self, id: &RecordId, category: &str) -> Result<Option<User>, Error> {
        let updated = self
            .collection
            .find_one_and_update(
                doc! { "_id": object_id(id)? },
                doc! { "$push": { "categories": category } },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(store_error)?;

        Ok(updated.map(UserDocument::into_user))
    }

    async fn pull_category(&self, id: &RecordId, category: &str) -> Result<Option<User>, Error> {
        let updated = self
            .collection
            .find_one_and_update(
                doc! { "_id": object_id(id)? },
                doc! { "$pull": { "categories": category } },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(store_error)?;

        Ok(updated.map(UserDocument::into_user))
    }

    async fn push_fixed_expense(
        &self,
        id: &RecordId,
        expense: &FixedExpense,
    ) -> Result<Option<User>, Error> {
        let document = FixedExpenseDocument::from_expense(expense)?;
        let value = to_bson(&document).map_err(document_error)?;

        let updated = self
            .collection
            .find_one_and_update(
                doc! { "_id": object_id(id)? },
                doc! { "$push": { "fixedExpenses": value } },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(store_error)?;

        Ok(updated.map(UserDocument::into_user))
    }

    async fn pull_fixed_expense(
        &self,
        id: &RecordId,
        expense_id: &RecordId,
    ) -> Result<Option<User>, Error> {
        let expense_object_id = object_id(expense_id)?;

        // The filter requires the sub-record to be present so that a missing
        // expense is observable as a no-match rather than a silent no-op.
        let updated = self
            .collection
            .find_one_and_update(
                doc! {
                    "_id": object_id(id)?,
                    "fixedExpenses._id": expense_object_id,
                },
                doc! { "$pull": { "fixedExpenses": { "_id": expense_object_id } } },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(store_error)?;

        Ok(updated.map(UserDocument::into_user))
    }

    async fn update_fixed_expense(
        &self,
        id: &RecordId,
        expense: &FixedExpense,
    ) -> Result<Option<User>, Error> {
        let expense_object_id = object_id(&expense.id)?;

        let updated = self
            .collection
            .find_one_and_update(
                doc! {
                    "_id": object_id(id)?,
                    "fixedExpenses._id": expense_object_id,
                },
                doc! { "$set": {
                    "fixedExpenses.$.title": expense.title.as_str(),
                    "fixedExpenses.$.category": expense.category.as_str(),
                    "fixedExpenses.$.amount": expense.amount,
                } },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(store_error)?;

        Ok(updated.map(UserDocument::into_user))
    }
}
