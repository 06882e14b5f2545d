//! A calendar date that is stored and transmitted as the literal `MM/DD/YYYY`
//! string but compared as a real date.

use std::fmt::Display;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use time::{Date, Month};

use crate::error::Error;

/// The number of days in each month of a fixed non-leap year. February is
/// capped at 28 in every year, so February 29 is never a valid record date.
const DAYS_IN_MONTH: [u8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// The date an income record or expense refers to.
///
/// The wire and store representation is always the literal `MM/DD/YYYY`
/// string; internally the value is a [time::Date] so that sorting and range
/// checks use calendar comparison rather than lexical string comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordDate(Date);

impl RecordDate {
    /// Parse a date from its `MM/DD/YYYY` form.
    ///
    /// The month and day must be exactly 2 digits and the year exactly 4
    /// digits. The day is checked against the fixed non-leap day table.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::ShapeViolation] if the string is empty or not three groups
    ///   of 2, 2 and 4 digits separated by slashes,
    /// - or [Error::SemanticViolation] if the month is outside 1 to 12 or the
    ///   day is not valid for that month.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::ShapeViolation(
                "date must not be an empty string or only spaces".to_owned(),
            ));
        }

        let parts: Vec<&str> = trimmed.split('/').collect();
        let [month_part, day_part, year_part] = parts.as_slice() else {
            return Err(Error::ShapeViolation(format!(
                "\"{trimmed}\" is not a date in MM/DD/YYYY format"
            )));
        };

        let well_formed = month_part.len() == 2
            && day_part.len() == 2
            && year_part.len() == 4
            && parts
                .iter()
                .all(|part| part.chars().all(|character| character.is_ascii_digit()));
        if !well_formed {
            return Err(Error::ShapeViolation(format!(
                "\"{trimmed}\" is not a date in MM/DD/YYYY format"
            )));
        }

        let month: u8 = month_part
            .parse()
            .map_err(|_| Error::SemanticViolation(format!("\"{month_part}\" is not a month")))?;
        if !(1..=12).contains(&month) {
            return Err(Error::SemanticViolation(
                "month must be between 1 and 12 inclusive".to_owned(),
            ));
        }

        let day: u8 = day_part
            .parse()
            .map_err(|_| Error::SemanticViolation(format!("\"{day_part}\" is not a day")))?;
        let days_in_month = DAYS_IN_MONTH[usize::from(month - 1)];
        if day < 1 || day > days_in_month {
            return Err(Error::SemanticViolation(format!(
                "day {day} is not valid for month {month}"
            )));
        }

        let year: i32 = year_part
            .parse()
            .map_err(|_| Error::SemanticViolation(format!("\"{year_part}\" is not a year")))?;
        let month = Month::try_from(month)
            .map_err(|error| Error::SemanticViolation(error.to_string()))?;
        let date = Date::from_calendar_date(year, month, day)
            .map_err(|error| Error::SemanticViolation(error.to_string()))?;

        Ok(Self(date))
    }

    /// The underlying calendar date.
    pub fn date(&self) -> Date {
        self.0
    }
}

impl From<Date> for RecordDate {
    fn from(date: Date) -> Self {
        Self(date)
    }
}

impl Display for RecordDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02}/{:02}/{:04}",
            u8::from(self.0.month()),
            self.0.day(),
            self.0.year()
        )
    }
}

impl Serialize for RecordDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RecordDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        RecordDate::parse(&raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod record_date_tests {
    use time::macros::date;

    use crate::Error;

    use super::RecordDate;

    #[test]
    fn parse_accepts_well_formed_date() {
        let parsed = RecordDate::parse("01/15/2020").unwrap();

        assert_eq!(parsed.date(), date!(2020 - 01 - 15));
    }

    #[test]
    fn display_round_trips_the_original_string() {
        let parsed = RecordDate::parse("07/04/2021").unwrap();

        assert_eq!(parsed.to_string(), "07/04/2021");
    }

    #[test]
    fn parse_rejects_single_digit_month() {
        let result = RecordDate::parse("7/04/2021");

        assert!(matches!(result, Err(Error::ShapeViolation(_))));
    }

    #[test]
    fn parse_rejects_month_thirteen() {
        let result = RecordDate::parse("13/01/2024");

        assert!(matches!(result, Err(Error::SemanticViolation(_))));
    }

    #[test]
    fn parse_rejects_day_thirty_in_february() {
        let result = RecordDate::parse("02/30/2024");

        assert!(matches!(result, Err(Error::SemanticViolation(_))));
    }

    #[test]
    fn parse_rejects_february_twenty_ninth_even_in_leap_years() {
        let result = RecordDate::parse("02/29/2024");

        assert!(matches!(result, Err(Error::SemanticViolation(_))));
    }

    #[test]
    fn parse_rejects_day_zero() {
        let result = RecordDate::parse("01/00/2024");

        assert!(matches!(result, Err(Error::SemanticViolation(_))));
    }

    #[test]
    fn parse_rejects_hyphen_separators() {
        let result = RecordDate::parse("2024-01-15");

        assert!(matches!(result, Err(Error::ShapeViolation(_))));
    }

    #[test]
    fn dates_order_by_calendar_value() {
        let january = RecordDate::parse("01/01/2024").unwrap();
        let december_of_previous_year = RecordDate::parse("12/31/2023").unwrap();

        assert!(january > december_of_previous_year);
    }

    #[test]
    fn serde_uses_the_wire_string() {
        let parsed = RecordDate::parse("03/20/2024").unwrap();

        let serialized = serde_json::to_string(&parsed).unwrap();
        assert_eq!(serialized, "\"03/20/2024\"");

        let deserialized: RecordDate = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, parsed);
    }
}
