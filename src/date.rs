//! Parsing of publication dates. The only accepted shape is `YYYY-MM-DD`,
//! zero-padded, naming a real calendar day. Everything else (notably the
//! `MM/DD/YYYY` form that turns up in hand-written front matter) is rejected
//! with a [`DateError`] rather than coerced.

use chrono::NaiveDate;
use std::fmt;

/// The canonical publication-date format, in [`chrono`] notation.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a publication date in the canonical `YYYY-MM-DD` format.
pub fn parse_date(input: &str) -> Result<NaiveDate, DateError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(DateError::Empty);
    }

    // chrono's `%m` and `%d` accept unpadded fields, so check the shape
    // ourselves before handing off.
    let bytes = input.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shaped {
        return Err(match looks_like_us_date(input) {
            true => DateError::UsFormat(input.to_owned()),
            false => DateError::Malformed(input.to_owned()),
        });
    }

    NaiveDate::parse_from_str(input, DATE_FORMAT)
        .map_err(|_| DateError::OutOfRange(input.to_owned()))
}

fn looks_like_us_date(input: &str) -> bool {
    let parts: Vec<&str> = input.split('/').collect();
    match parts.as_slice() {
        [month, day, year] => {
            (1..=2).contains(&month.len())
                && (1..=2).contains(&day.len())
                && year.len() == 4
                && parts.iter().all(|p| p.bytes().all(|b| b.is_ascii_digit()))
        }
        _ => false,
    }
}

/// Represents a date string that could not be accepted as a publication date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    /// The string was empty or whitespace.
    Empty,

    /// The string looks like `MM/DD/YYYY`.
    UsFormat(String),

    /// The string is not shaped like `YYYY-MM-DD`.
    Malformed(String),

    /// The string is shaped correctly but names no real day (e.g.,
    /// `2023-02-29`).
    OutOfRange(String),
}

impl fmt::Display for DateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DateError::Empty => write!(f, "date is empty"),
            DateError::UsFormat(s) => write!(
                f,
                "`{}` uses MM/DD/YYYY; dates must be written as YYYY-MM-DD",
                s
            ),
            DateError::Malformed(s) => {
                write!(f, "`{}` is not a YYYY-MM-DD date", s)
            }
            DateError::OutOfRange(s) => {
                write!(f, "`{}` is not a valid calendar date", s)
            }
        }
    }
}

impl std::error::Error for DateError {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_canonical() {
        assert_eq!(
            parse_date("2024-03-01"),
            Ok(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
        assert_eq!(
            parse_date(" 2024-10-01 "),
            Ok(NaiveDate::from_ymd_opt(2024, 10, 1).unwrap())
        );
    }

    #[test]
    fn test_rejects_us_format() {
        assert_eq!(
            parse_date("09/15/2024"),
            Err(DateError::UsFormat("09/15/2024".to_owned()))
        );
        assert_eq!(
            parse_date("9/5/2024"),
            Err(DateError::UsFormat("9/5/2024".to_owned()))
        );
    }

    #[test]
    fn test_rejects_unpadded() {
        assert_eq!(
            parse_date("2024-3-1"),
            Err(DateError::Malformed("2024-3-1".to_owned()))
        );
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_date(""), Err(DateError::Empty));
        assert_eq!(
            parse_date("yesterday"),
            Err(DateError::Malformed("yesterday".to_owned()))
        );
        assert_eq!(
            parse_date("2024-01-01T10:00:00Z"),
            Err(DateError::Malformed("2024-01-01T10:00:00Z".to_owned()))
        );
    }

    #[test]
    fn test_rejects_impossible_day() {
        assert_eq!(
            parse_date("2023-02-29"),
            Err(DateError::OutOfRange("2023-02-29".to_owned()))
        );
        assert_eq!(
            parse_date("2024-13-01"),
            Err(DateError::OutOfRange("2024-13-01".to_owned()))
        );
        assert!(parse_date("2024-02-29").is_ok());
    }
}
