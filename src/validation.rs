//! Input sanitisation for every raw value that crosses into the
//! repositories.
//!
//! Each check is a pure, synchronous function that either returns the
//! normalised value or fails with the first violation it finds. None of
//! them perform I/O; the two checks that need "today" take it as an
//! argument so callers can supply it from a [crate::Clock].

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use time::Date;

use crate::{date::RecordDate, error::Error, record_id::RecordId};

/// Minimum length for first and last names.
const NAME_MIN: usize = 2;
/// Maximum length for first and last names.
const NAME_MAX: usize = 20;
/// Minimum password length.
const PASSWORD_MIN: usize = 8;
/// The characters that count as "special" for the password rules.
const PASSWORD_SPECIALS: &str = "!@#$%^&*(),.?\":{}|<>[]\\;'/-=_+`~";
/// The earliest year accepted by [check_year].
const YEAR_MIN: i32 = 2000;

static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Check that `raw` is a syntactically valid record identifier.
///
/// The value is trimmed and canonicalised to lowercase hexadecimal.
///
/// # Errors
/// This function will return a:
/// - [Error::ShapeViolation] if the input is empty or only spaces,
/// - or [Error::SemanticViolation] if the input is not a valid store
///   identifier.
pub fn check_id(raw: &str) -> Result<RecordId, Error> {
    RecordId::parse(raw)
}

/// Check a first name: trimmed, letters only, 2 to 20 characters inclusive.
///
/// # Errors
/// Returns an [Error::ShapeViolation] describing the first rule violated.
pub fn check_first_name(raw: &str) -> Result<String, Error> {
    check_name(raw, "first name")
}

/// Check a last name: trimmed, letters only, 2 to 20 characters inclusive.
///
/// # Errors
/// Returns an [Error::ShapeViolation] describing the first rule violated.
pub fn check_last_name(raw: &str) -> Result<String, Error> {
    check_name(raw, "last name")
}

fn check_name(raw: &str, field: &str) -> Result<String, Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::ShapeViolation(format!(
            "{field} must not be an empty string or only spaces"
        )));
    }
    if !trimmed
        .chars()
        .all(|character| character.is_ascii_alphabetic())
    {
        return Err(Error::ShapeViolation(format!(
            "{field} must only contain letters"
        )));
    }
    let length = trimmed.chars().count();
    if !(NAME_MIN..=NAME_MAX).contains(&length) {
        return Err(Error::ShapeViolation(format!(
            "{field} must be between {NAME_MIN} and {NAME_MAX} characters"
        )));
    }

    Ok(trimmed.to_owned())
}

/// Check a free-text field: non-empty after trimming and not something that
/// parses entirely as a number.
///
/// The numeric rejection exists to distinguish free text such as a city or a
/// description from numeric-looking input that was bound to the wrong field.
///
/// # Errors
/// Returns an [Error::ShapeViolation] if the value is empty or numeric.
pub fn check_string(raw: &str) -> Result<String, Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::ShapeViolation(
            "value must not be an empty string or only spaces".to_owned(),
        ));
    }
    if trimmed.parse::<f64>().is_ok() {
        return Err(Error::ShapeViolation(format!(
            "\"{trimmed}\" is not valid here because it is entirely numeric"
        )));
    }

    Ok(trimmed.to_owned())
}

/// Check a monetary amount given as a string of digits with at most one
/// decimal point and at most 2 fractional digits.
///
/// A sign cannot be expressed within the allowed character set, so negative
/// amounts are rejected by construction.
///
/// # Errors
/// This function will return a:
/// - [Error::ShapeViolation] if the value is empty, contains a character
///   other than a digit or `.`, or contains more than one `.`,
/// - or [Error::SemanticViolation] if the value does not parse to a finite
///   decimal or has more than 2 fractional digits.
pub fn check_amount(raw: &str) -> Result<f64, Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::ShapeViolation(
            "amount must not be an empty string or only spaces".to_owned(),
        ));
    }
    if !trimmed
        .chars()
        .all(|character| character.is_ascii_digit() || character == '.')
    {
        return Err(Error::ShapeViolation(
            "amount must only contain digits and a decimal point".to_owned(),
        ));
    }

    let decimal_points = trimmed.chars().filter(|&character| character == '.').count();
    if decimal_points > 1 {
        return Err(Error::ShapeViolation(
            "amount must contain at most one decimal point".to_owned(),
        ));
    }

    let amount: f64 = trimmed.parse().map_err(|_| {
        Error::SemanticViolation(format!("\"{trimmed}\" cannot be converted to a decimal"))
    })?;
    if !amount.is_finite() {
        return Err(Error::SemanticViolation(format!(
            "\"{trimmed}\" cannot be converted to a decimal"
        )));
    }

    if decimal_points == 1 {
        let fractional_digits = trimmed.split('.').nth(1).unwrap_or("").len();
        if fractional_digits > 2 {
            return Err(Error::SemanticViolation(
                "amount must have 2 decimal places or fewer".to_owned(),
            ));
        }
    }

    Ok(amount)
}

/// Check a date in `MM/DD/YYYY` form that must not be after `today`.
///
/// # Errors
/// This function will return a:
/// - [Error::ShapeViolation] if the string is not three groups of 2, 2 and 4
///   digits separated by slashes,
/// - or [Error::SemanticViolation] if the month or day is out of range or the
///   date is after `today`.
pub fn check_date(raw: &str, today: Date) -> Result<RecordDate, Error> {
    let date = RecordDate::parse(raw)?;
    if date.date() > today {
        return Err(Error::SemanticViolation(format!(
            "{date} is in the future; the date must be today or earlier"
        )));
    }

    Ok(date)
}

/// Check a string that must consist only of decimal digits.
///
/// The value is returned trimmed but unparsed; month and year filter
/// components keep their leading zeros.
///
/// # Errors
/// Returns an [Error::ShapeViolation] if the value is empty or contains a
/// non-digit.
pub fn check_number(raw: &str) -> Result<String, Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::ShapeViolation(
            "value must not be an empty string or only spaces".to_owned(),
        ));
    }
    if !trimmed.chars().all(|character| character.is_ascii_digit()) {
        return Err(Error::ShapeViolation(
            "value must only contain digits".to_owned(),
        ));
    }

    Ok(trimmed.to_owned())
}

/// Check a 4-digit year between 2000 and the current year inclusive.
///
/// # Errors
/// This function will return a:
/// - [Error::ShapeViolation] if the value is empty or not exactly 4 digits,
/// - or [Error::SemanticViolation] if the year is outside the allowed range.
pub fn check_year(raw: &str, today: Date) -> Result<i32, Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::ShapeViolation(
            "year must not be an empty string or only spaces".to_owned(),
        ));
    }
    if trimmed.len() != 4 || !trimmed.chars().all(|character| character.is_ascii_digit()) {
        return Err(Error::ShapeViolation(format!(
            "\"{trimmed}\" is not a 4 digit year"
        )));
    }

    let year: i32 = trimmed
        .parse()
        .map_err(|_| Error::SemanticViolation(format!("\"{trimmed}\" is not a year")))?;
    if !(YEAR_MIN..=today.year()).contains(&year) {
        return Err(Error::SemanticViolation(format!(
            "year must be between {YEAR_MIN} and {} inclusive",
            today.year()
        )));
    }

    Ok(year)
}

/// Check a password against the account rules: no whitespace anywhere, at
/// least 8 characters, at least one uppercase letter, one digit and one
/// special character.
///
/// # Errors
/// Returns an [Error::ShapeViolation] describing the first rule violated.
pub fn check_password(raw: &str) -> Result<String, Error> {
    if raw.trim().is_empty() {
        return Err(Error::ShapeViolation(
            "password must not be an empty string or only spaces".to_owned(),
        ));
    }
    if raw.chars().any(char::is_whitespace) {
        return Err(Error::ShapeViolation(
            "password must not contain spaces".to_owned(),
        ));
    }
    if raw.chars().count() < PASSWORD_MIN {
        return Err(Error::ShapeViolation(format!(
            "password must be at least {PASSWORD_MIN} characters"
        )));
    }
    if !raw.chars().any(|character| character.is_ascii_uppercase()) {
        return Err(Error::ShapeViolation(
            "password must contain at least one uppercase letter".to_owned(),
        ));
    }
    if !raw.chars().any(|character| character.is_ascii_digit()) {
        return Err(Error::ShapeViolation(
            "password must contain at least one number".to_owned(),
        ));
    }
    if !raw
        .chars()
        .any(|character| PASSWORD_SPECIALS.contains(character))
    {
        return Err(Error::ShapeViolation(
            "password must contain at least one special character".to_owned(),
        ));
    }

    Ok(raw.to_owned())
}

/// Check an email address against a loose RFC pattern.
///
/// The value is trimmed and lower-cased before matching, and the normalised
/// form is what gets returned and stored.
///
/// # Errors
/// Returns an [Error::ShapeViolation] if the value is empty or does not match
/// the pattern.
pub fn check_email(raw: &str) -> Result<String, Error> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(Error::ShapeViolation(
            "email must not be an empty string or only spaces".to_owned(),
        ));
    }
    if !email_regex().is_match(&email) {
        return Err(Error::ShapeViolation(format!(
            "\"{email}\" is not a valid email address"
        )));
    }

    Ok(email)
}

/// Check that a JSON value is an object, i.e. not null, not an array and not
/// a scalar.
///
/// # Errors
/// Returns an [Error::ShapeViolation] for anything other than an object.
pub fn check_object(value: &Value) -> Result<&Map<String, Value>, Error> {
    value
        .as_object()
        .ok_or_else(|| Error::ShapeViolation("a JSON object is required".to_owned()))
}

#[cfg(test)]
mod validation_tests {
    use serde_json::json;
    use time::macros::date;

    use crate::Error;

    use super::*;

    const TODAY: time::Date = date!(2024 - 06 - 15);

    #[test]
    fn check_id_accepts_and_canonicalises() {
        let id = check_id(" 507F1F77BCF86CD799439011 ").unwrap();

        assert_eq!(id.as_str(), "507f1f77bcf86cd799439011");
    }

    #[test]
    fn check_id_rejects_empty_and_malformed() {
        assert!(matches!(check_id("  "), Err(Error::ShapeViolation(_))));
        assert!(matches!(
            check_id("not-an-id"),
            Err(Error::SemanticViolation(_))
        ));
    }

    #[test]
    fn check_first_name_trims_and_accepts_letters() {
        assert_eq!(check_first_name("  Maria  ").unwrap(), "Maria");
    }

    #[test]
    fn check_first_name_rejects_digits_and_bad_lengths() {
        assert!(check_first_name("Mar1a").is_err());
        assert!(check_first_name("M").is_err());
        assert!(check_first_name("Wolfeschlegelsteinhausen").is_err());
    }

    #[test]
    fn name_length_bounds_are_inclusive() {
        assert_eq!(check_last_name("Ng").unwrap(), "Ng");
        assert_eq!(
            check_last_name("Aaaaaaaaaaaaaaaaaaaa").unwrap(),
            "Aaaaaaaaaaaaaaaaaaaa"
        );
    }

    #[test]
    fn check_string_trims_free_text() {
        assert_eq!(check_string("  New York  ").unwrap(), "New York");
    }

    #[test]
    fn check_string_rejects_empty_and_numeric() {
        assert!(check_string("   ").is_err());
        assert!(check_string("12.5").is_err());
        assert!(check_string("42").is_err());
    }

    #[test]
    fn check_amount_accepts_whole_and_fractional() {
        assert_eq!(check_amount("100").unwrap(), 100.0);
        assert_eq!(check_amount("12.5").unwrap(), 12.5);
        assert_eq!(check_amount("12.50").unwrap(), 12.5);
    }

    #[test]
    fn check_amount_rejects_three_fractional_digits() {
        assert!(matches!(
            check_amount("12.345"),
            Err(Error::SemanticViolation(_))
        ));
    }

    #[test]
    fn check_amount_rejects_double_decimal_point() {
        assert!(matches!(
            check_amount("12..3"),
            Err(Error::ShapeViolation(_))
        ));
    }

    #[test]
    fn check_amount_rejects_signs_and_letters() {
        assert!(check_amount("-12.5").is_err());
        assert!(check_amount("12a").is_err());
        assert!(check_amount("$12").is_err());
    }

    #[test]
    fn check_amount_rejects_lone_decimal_point() {
        assert!(matches!(check_amount("."), Err(Error::SemanticViolation(_))));
    }

    #[test]
    fn check_date_accepts_past_date() {
        let parsed = check_date("01/15/2020", TODAY).unwrap();

        assert_eq!(parsed.to_string(), "01/15/2020");
    }

    #[test]
    fn check_date_accepts_today() {
        assert!(check_date("06/15/2024", TODAY).is_ok());
    }

    #[test]
    fn check_date_rejects_tomorrow() {
        assert!(matches!(
            check_date("06/16/2024", TODAY),
            Err(Error::SemanticViolation(_))
        ));
    }

    #[test]
    fn check_date_rejects_future_year() {
        assert!(check_date("01/01/2025", TODAY).is_err());
    }

    #[test]
    fn check_date_rejects_invalid_month_and_day() {
        assert!(check_date("13/01/2024", TODAY).is_err());
        assert!(check_date("02/30/2024", TODAY).is_err());
    }

    #[test]
    fn check_number_keeps_leading_zeros() {
        assert_eq!(check_number("07").unwrap(), "07");
    }

    #[test]
    fn check_number_rejects_non_digits() {
        assert!(check_number("12.5").is_err());
        assert!(check_number("-12").is_err());
        assert!(check_number("").is_err());
    }

    #[test]
    fn check_year_accepts_range_bounds() {
        assert_eq!(check_year("2000", TODAY).unwrap(), 2000);
        assert_eq!(check_year("2024", TODAY).unwrap(), 2024);
    }

    #[test]
    fn check_year_rejects_out_of_range() {
        assert!(matches!(
            check_year("1999", TODAY),
            Err(Error::SemanticViolation(_))
        ));
        assert!(matches!(
            check_year("2025", TODAY),
            Err(Error::SemanticViolation(_))
        ));
    }

    #[test]
    fn check_year_rejects_wrong_shape() {
        assert!(matches!(
            check_year("24", TODAY),
            Err(Error::ShapeViolation(_))
        ));
        assert!(matches!(
            check_year("20x4", TODAY),
            Err(Error::ShapeViolation(_))
        ));
    }

    #[test]
    fn check_password_accepts_strong_password() {
        assert_eq!(check_password("Abc12345!").unwrap(), "Abc12345!");
    }

    #[test]
    fn check_password_rejects_missing_character_classes() {
        // No uppercase letter and no special character.
        assert!(check_password("abc12345").is_err());
        assert!(check_password("Abcdefgh!").is_err());
        assert!(check_password("Abc12345").is_err());
    }

    #[test]
    fn check_password_rejects_whitespace_anywhere() {
        assert!(check_password(" Abc12345!").is_err());
        assert!(check_password("Abc12345! ").is_err());
        assert!(check_password("Abc 12345!").is_err());
    }

    #[test]
    fn check_password_rejects_short_password() {
        assert!(check_password("Ab1!").is_err());
    }

    #[test]
    fn check_email_normalises_case_and_whitespace() {
        assert_eq!(check_email("  Foo.Bar@Example.COM  ").unwrap(), "foo.bar@example.com");
    }

    #[test]
    fn check_email_rejects_malformed_addresses() {
        assert!(check_email("foobar.baz").is_err());
        assert!(check_email("foo@bar").is_err());
        assert!(check_email("foo@bar.x").is_err());
        assert!(check_email("").is_err());
    }

    #[test]
    fn check_object_accepts_only_objects() {
        assert!(check_object(&json!({ "a": 1 })).is_ok());
        assert!(check_object(&json!([1, 2])).is_err());
        assert!(check_object(&json!(null)).is_err());
        assert!(check_object(&json!(42)).is_err());
    }

    #[test]
    fn validators_are_idempotent_on_their_own_output() {
        let name = check_first_name("  Maria  ").unwrap();
        assert_eq!(check_first_name(&name).unwrap(), name);

        let text = check_string("  New York  ").unwrap();
        assert_eq!(check_string(&text).unwrap(), text);

        let number = check_number(" 07 ").unwrap();
        assert_eq!(check_number(&number).unwrap(), number);

        let password = check_password("Abc12345!").unwrap();
        assert_eq!(check_password(&password).unwrap(), password);

        let email = check_email("  Foo@Example.com ").unwrap();
        assert_eq!(check_email(&email).unwrap(), email);

        let id = check_id(" 507F1F77BCF86CD799439011 ").unwrap();
        assert_eq!(check_id(id.as_str()).unwrap(), id);

        let date = check_date("01/15/2020", TODAY).unwrap();
        assert_eq!(check_date(&date.to_string(), TODAY).unwrap(), date);
    }
}
