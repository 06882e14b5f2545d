//! User accounts and the repository that validates and persists them.

use serde::{Deserialize, Serialize};

use crate::{
    error::Error, password::PasswordHash, record_id::RecordId, store::UserStore, validation,
};

// ============================================================================
// MODELS
// ============================================================================

/// The categories every new account starts with.
pub const DEFAULT_CATEGORIES: [&str; 5] = [
    "Groceries",
    "Shopping",
    "Restaurant",
    "Transportation",
    "Rent",
];

/// The youngest a user may be to hold an account.
pub const MINIMUM_AGE: i64 = 13;

/// A recurring expense nested inside a user's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedExpense {
    /// The sub-record's identifier, stable until the sub-record is deleted.
    pub id: RecordId,
    /// What the expense is for, e.g. "Gym membership".
    pub title: String,
    /// The category the expense falls under.
    pub category: String,
    /// How much the expense costs each period.
    pub amount: f64,
}

/// A user account as held in the store.
///
/// This is the internal representation and includes the password hash;
/// anything returned to an external caller goes through [Profile] instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's identifier, assigned at registration.
    pub id: RecordId,
    /// The user's first name.
    pub first_name: String,
    /// The user's last name.
    pub last_name: String,
    /// The user's email address, lower-cased and unique across all accounts.
    pub email: String,
    /// Free-text gender.
    pub gender: String,
    /// Free-text city.
    pub city: String,
    /// Free-text state.
    pub state: String,
    /// The user's age in years.
    pub age: i64,
    /// The bcrypt hash of the user's password.
    pub password_hash: PasswordHash,
    /// The user's expense categories, unique case-sensitively.
    pub categories: Vec<String>,
    /// The user's recurring expenses.
    pub fixed_expenses: Vec<FixedExpense>,
    /// The user's account balance.
    pub balance: f64,
}

/// A user account as returned to callers: everything except the password
/// hash.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    /// The user's identifier.
    pub id: RecordId,
    /// The user's first name.
    pub first_name: String,
    /// The user's last name.
    pub last_name: String,
    /// The user's email address.
    pub email: String,
    /// Free-text gender.
    pub gender: String,
    /// Free-text city.
    pub city: String,
    /// Free-text state.
    pub state: String,
    /// The user's age in years.
    pub age: i64,
    /// The user's account balance.
    pub balance: f64,
    /// The user's expense categories.
    pub categories: Vec<String>,
    /// The user's recurring expenses.
    pub fixed_expenses: Vec<FixedExpense>,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            gender: user.gender,
            city: user.city,
            state: user.state,
            age: user.age,
            balance: user.balance,
            categories: user.categories,
            fixed_expenses: user.fixed_expenses,
        }
    }
}

/// The outcome of a successful registration. Neither the password nor its
/// hash is ever part of this.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registration {
    /// Whether the account was created.
    pub completed: bool,
    /// The new account's identifier.
    pub user_id: RecordId,
}

/// The raw fields of a registration request, prior to validation.
///
/// `age` and `balance` arrive as strings because the repository is the
/// validation boundary; they are parsed by [UserRepository::register].
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    /// The user's first name.
    pub first_name: String,
    /// The user's last name.
    pub last_name: String,
    /// The user's email address.
    pub email: String,
    /// Free-text gender.
    pub gender: String,
    /// Free-text city.
    pub city: String,
    /// Free-text state.
    pub state: String,
    /// The user's age as a numeric string.
    pub age: String,
    /// The user's password in clear text. Hashed before storage and never
    /// persisted.
    pub password: String,
    /// The opening balance as an amount string.
    pub balance: String,
}

/// The raw fields of a full profile replacement, prior to validation.
///
/// The password, categories and fixed expenses are not part of a profile
/// update; they are carried over from the stored account unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    /// The user's first name.
    pub first_name: String,
    /// The user's last name.
    pub last_name: String,
    /// The user's email address.
    pub email: String,
    /// Free-text gender.
    pub gender: String,
    /// Free-text city.
    pub city: String,
    /// Free-text state.
    pub state: String,
    /// The user's age as a numeric string.
    pub age: String,
    /// The balance as an amount string.
    pub balance: String,
}

// ============================================================================
// REPOSITORY
// ============================================================================

/// Validates raw input and reads and writes user accounts through a
/// [UserStore].
#[derive(Debug, Clone)]
pub struct UserRepository<S> {
    store: S,
}

impl<S> UserRepository<S>
where
    S: UserStore,
{
    /// Create a repository over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Get the account with the given identifier, including its password
    /// hash. External surfaces should convert the result to a [Profile].
    ///
    /// # Errors
    /// Returns an [Error::NotFound] if no account matches.
    pub async fn get_by_id(&self, id: &str) -> Result<User, Error> {
        let id = validation::check_id(id)?;

        self.store
            .find_by_id(&id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("no user with id {id}")))
    }

    /// Create a new account.
    ///
    /// The password is hashed before storage; the email must not belong to an
    /// existing account. New accounts start with the default category list
    /// and no fixed expenses.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::ShapeViolation] or [Error::SemanticViolation] if any field
    ///   fails validation or the age is under [MINIMUM_AGE],
    /// - [Error::Conflict] if the email is already registered,
    /// - or [Error::StoreFailure] if the insert fails.
    pub async fn register(&self, form: RegistrationForm) -> Result<Registration, Error> {
        let first_name = validation::check_first_name(&form.first_name)?;
        let last_name = validation::check_last_name(&form.last_name)?;
        let email = validation::check_email(&form.email)?;
        let gender = validation::check_string(&form.gender)?;
        let city = validation::check_string(&form.city)?;
        let state = validation::check_string(&form.state)?;
        let age = check_age(&form.age)?;
        let balance = validation::check_amount(&form.balance)?;
        let password = validation::check_password(&form.password)?;

        let password_hash = PasswordHash::new(&password)?;

        // Fast path for a friendly error; the store's unique email index is
        // what actually prevents two concurrent registrations colliding.
        if self.store.find_by_email(&email).await?.is_some() {
            return Err(duplicate_email(&email));
        }

        let user = User {
            id: RecordId::random(),
            first_name,
            last_name,
            email,
            gender,
            city,
            state,
            age,
            password_hash,
            categories: DEFAULT_CATEGORIES.iter().map(ToString::to_string).collect(),
            fixed_expenses: Vec::new(),
            balance,
        };
        self.store.insert(&user).await?;

        Ok(Registration {
            completed: true,
            user_id: user.id,
        })
    }

    /// Authenticate with an email address and password.
    ///
    /// A missing account and a wrong password produce the same error so that
    /// the response does not reveal which emails are registered.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::ShapeViolation] if the email or password is malformed,
    /// - or [Error::SemanticViolation] with a generic message if the
    ///   credentials do not match an account.
    pub async fn login(&self, email: &str, password: &str) -> Result<Profile, Error> {
        let email = validation::check_email(email)?;
        let password = validation::check_password(password)?;

        let user = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or_else(invalid_credentials)?;

        if !user.password_hash.verify(&password)? {
            return Err(invalid_credentials());
        }

        Ok(Profile::from(user))
    }

    /// Replace the mutable fields of an account with `update`, carrying over
    /// the password hash, categories and fixed expenses unchanged.
    ///
    /// If the email is changing, its uniqueness is re-checked against all
    /// other accounts.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::ShapeViolation] or [Error::SemanticViolation] if any field
    ///   fails validation or the age is under [MINIMUM_AGE],
    /// - [Error::NotFound] if no account has the identifier,
    /// - [Error::Conflict] if the new email is already registered,
    /// - or [Error::StoreFailure] if the update reports no effect.
    pub async fn replace_profile(&self, id: &str, update: ProfileUpdate) -> Result<User, Error> {
        let id = validation::check_id(id)?;
        let first_name = validation::check_first_name(&update.first_name)?;
        let last_name = validation::check_last_name(&update.last_name)?;
        let email = validation::check_email(&update.email)?;
        let gender = validation::check_string(&update.gender)?;
        let city = validation::check_string(&update.city)?;
        let state = validation::check_string(&update.state)?;
        let age = check_age(&update.age)?;
        let balance = validation::check_amount(&update.balance)?;

        let existing = self
            .store
            .find_by_id(&id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("no user with id {id}")))?;

        if existing.email != email && self.store.find_by_email(&email).await?.is_some() {
            return Err(duplicate_email(&email));
        }

        let replacement = User {
            id: existing.id,
            first_name,
            last_name,
            email,
            gender,
            city,
            state,
            age,
            password_hash: existing.password_hash,
            categories: existing.categories,
            fixed_expenses: existing.fixed_expenses,
            balance,
        };

        self.store
            .update_profile(&id, &replacement)
            .await?
            .ok_or_else(|| Error::StoreFailure(format!("could not update user {id}")))
    }

    /// Add a category to the user's list.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if no account has the identifier,
    /// - or [Error::Conflict] if the user already has the category
    ///   (case-sensitive exact match after trimming).
    pub async fn add_category(&self, user_id: &str, category: &str) -> Result<(), Error> {
        let user_id = validation::check_id(user_id)?;
        let category = validation::check_string(category)?;

        let user = self
            .store
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("no user with id {user_id}")))?;

        if user.categories.iter().any(|name| name == &category) {
            return Err(Error::Conflict(format!(
                "category \"{category}\" already exists"
            )));
        }

        self.store
            .push_category(&user_id, &category)
            .await?
            .ok_or_else(|| Error::NotFound(format!("no user with id {user_id}")))?;

        Ok(())
    }

    /// Remove a category from the user's list.
    ///
    /// # Errors
    /// Returns an [Error::NotFound] if no account has the identifier or the
    /// user does not have the category.
    pub async fn remove_category(&self, user_id: &str, category: &str) -> Result<(), Error> {
        let user_id = validation::check_id(user_id)?;
        let category = validation::check_string(category)?;

        let user = self
            .store
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("no user with id {user_id}")))?;

        if !user.categories.iter().any(|name| name == &category) {
            return Err(Error::NotFound(format!(
                "category \"{category}\" not found"
            )));
        }

        self.store
            .pull_category(&user_id, &category)
            .await?
            .ok_or_else(|| Error::NotFound(format!("no user with id {user_id}")))?;

        Ok(())
    }

    /// Add a fixed expense to the user's list and return the created
    /// sub-record.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::ShapeViolation] or [Error::SemanticViolation] if the title,
    ///   category or amount fails validation,
    /// - or [Error::NotFound] if no account has the identifier.
    pub async fn add_fixed_expense(
        &self,
        user_id: &str,
        title: &str,
        category: &str,
        amount: &str,
    ) -> Result<FixedExpense, Error> {
        let user_id = validation::check_id(user_id)?;
        let title = validation::check_string(title)?;
        let category = validation::check_string(category)?;
        let amount = validation::check_amount(amount)?;

        self.store
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("no user with id {user_id}")))?;

        let expense = FixedExpense {
            id: RecordId::random(),
            title,
            category,
            amount,
        };

        self.store
            .push_fixed_expense(&user_id, &expense)
            .await?
            .ok_or_else(|| Error::NotFound(format!("no user with id {user_id}")))?;

        Ok(expense)
    }

    /// Replace the title, category and amount of one of the user's fixed
    /// expenses, keeping its identifier, and return the updated sub-record.
    ///
    /// A missing sub-record is an error, not a silent no-op.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::ShapeViolation] or [Error::SemanticViolation] if the title,
    ///   category or amount fails validation,
    /// - or [Error::NotFound] if the user or the sub-record does not exist.
    pub async fn update_fixed_expense(
        &self,
        user_id: &str,
        expense_id: &str,
        title: &str,
        category: &str,
        amount: &str,
    ) -> Result<FixedExpense, Error> {
        let user_id = validation::check_id(user_id)?;
        let expense_id = validation::check_id(expense_id)?;
        let title = validation::check_string(title)?;
        let category = validation::check_string(category)?;
        let amount = validation::check_amount(amount)?;

        let expense = FixedExpense {
            id: expense_id,
            title,
            category,
            amount,
        };

        self.store
            .update_fixed_expense(&user_id, &expense)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "no fixed expense {} for user {user_id}",
                    expense.id
                ))
            })?;

        Ok(expense)
    }

    /// Remove the fixed expense with `expense_id` from the user's list.
    ///
    /// # Errors
    /// Returns an [Error::NotFound] if the user or the sub-record does not
    /// exist.
    pub async fn remove_fixed_expense(&self, user_id: &str, expense_id: &str) -> Result<(), Error> {
        let user_id = validation::check_id(user_id)?;
        let expense_id = validation::check_id(expense_id)?;

        self.store
            .pull_fixed_expense(&user_id, &expense_id)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "no fixed expense {expense_id} for user {user_id}"
                ))
            })?;

        Ok(())
    }
}

fn check_age(raw: &str) -> Result<i64, Error> {
    let digits = validation::check_number(raw)?;
    let age: i64 = digits
        .parse()
        .map_err(|_| Error::SemanticViolation(format!("\"{digits}\" is not a valid age")))?;
    if age < MINIMUM_AGE {
        return Err(Error::SemanticViolation(format!(
            "users must be at least {MINIMUM_AGE} years old to sign up"
        )));
    }

    Ok(age)
}

fn duplicate_email(email: &str) -> Error {
    Error::Conflict(format!("a user with the email \"{email}\" already exists"))
}

fn invalid_credentials() -> Error {
    Error::SemanticViolation("either the email or password is invalid".to_owned())
}

// ============================================================================
// TESTS
// ============================================================================
