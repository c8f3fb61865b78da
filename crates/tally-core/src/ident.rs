//! # Identifier Generation
//!
//! Purchases, orders and sales carry formatted ids:
//!
//! ```text
//!   P  2024  04  002
//!   │   │    │    └── sequence, zero-padded to ID_SEQUENCE_WIDTH
//!   │   │    └─────── month (two digits)
//!   │   └──────────── year (four digits)
//!   └──────────────── prefix: P purchase, S sale, O order
//! ```
//!
//! The next sequence is the largest existing sequence for the same
//! prefix, year and month, plus one. The scan covers only the ids the
//! caller passes in, so two writers working from different snapshots can
//! produce the same id; the SQLite primary key is what finally rejects a
//! duplicate.
//!
//! Master data (customers, products, suppliers, supplier transactions) uses
//! plain integers: `max(existing) + 1`.

use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::ID_SEQUENCE_WIDTH;

/// The record kind a formatted id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdPrefix {
    Purchase,
    Sales,
    Order,
}

impl IdPrefix {
    pub fn as_char(&self) -> char {
        match self {
            IdPrefix::Purchase => 'P',
            IdPrefix::Sales => 'S',
            IdPrefix::Order => 'O',
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c {
            'P' => Some(IdPrefix::Purchase),
            'S' => Some(IdPrefix::Sales),
            'O' => Some(IdPrefix::Order),
            _ => None,
        }
    }
}

/// A parsed `<prefix><year><month><sequence>` identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormattedId {
    pub prefix: IdPrefix,
    pub year: i32,
    pub month: u32,
    pub sequence: u32,
}

impl FormattedId {
    /// Returns true if this id falls in the same prefix and month as `date`.
    pub fn same_period(&self, prefix: IdPrefix, date: NaiveDate) -> bool {
        self.prefix == prefix && self.year == date.year() && self.month == date.month()
    }
}

impl fmt::Display for FormattedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:04}{:02}{:0width$}",
            self.prefix.as_char(),
            self.year,
            self.month,
            self.sequence,
            width = ID_SEQUENCE_WIDTH
        )
    }
}

impl FromStr for FormattedId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidIdentifier(s.to_string());

        let mut chars = s.chars();
        let prefix = chars.next().and_then(IdPrefix::from_char).ok_or_else(invalid)?;
        let rest = chars.as_str();

        // year (4) + month (2) + at least one sequence digit
        if rest.len() < 7 || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let year: i32 = rest[0..4].parse().map_err(|_| invalid())?;
        let month: u32 = rest[4..6].parse().map_err(|_| invalid())?;
        let sequence: u32 = rest[6..].parse().map_err(|_| invalid())?;

        if !(1..=12).contains(&month) {
            return Err(invalid());
        }

        Ok(FormattedId {
            prefix,
            year,
            month,
            sequence,
        })
    }
}

/// Generates the next id for `prefix` in the month of `date`.
///
/// Ids that do not parse, or belong to another prefix or month, are ignored.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use tally_core::ident::{next_id, IdPrefix};
///
/// let date = NaiveDate::from_ymd_opt(2024, 4, 20).unwrap();
/// let existing = ["P202404001", "P202404002", "P202403017"];
/// assert_eq!(next_id(IdPrefix::Purchase, date, existing), "P202404003");
/// ```
pub fn next_id<I, S>(prefix: IdPrefix, date: NaiveDate, existing: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let latest = existing
        .into_iter()
        .filter_map(|id| id.as_ref().parse::<FormattedId>().ok())
        .filter(|id| id.same_period(prefix, date))
        .map(|id| id.sequence)
        .max()
        .unwrap_or(0);

    FormattedId {
        prefix,
        year: date.year(),
        month: date.month(),
        sequence: latest + 1,
    }
    .to_string()
}

/// Generates the next integer id: `max(existing) + 1`, starting at 1.
pub fn next_numeric_id<I>(existing: I) -> i64
where
    I: IntoIterator<Item = i64>,
{
    existing.into_iter().max().unwrap_or(0).max(0) + 1
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn april() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 9).unwrap()
    }

    #[test]
    fn test_next_after_latest_in_month() {
        let existing = vec!["P202404002".to_string()];
        assert_eq!(next_id(IdPrefix::Purchase, april(), &existing), "P202404003");
    }

    #[test]
    fn test_first_id_of_month() {
        let existing = ["P202403009", "S202404004"];
        assert_eq!(next_id(IdPrefix::Purchase, april(), existing), "P202404001");
        assert_eq!(next_id(IdPrefix::Order, april(), Vec::<String>::new()), "O202404001");
    }

    #[test]
    fn test_ignores_other_prefixes_and_garbage() {
        let existing = ["S202404010", "O202404007", "junk", "P2024", "X202404050"];
        assert_eq!(next_id(IdPrefix::Sales, april(), existing), "S202404011");
    }

    #[test]
    fn test_sequence_grows_past_padding() {
        let existing = ["O202404999"];
        assert_eq!(next_id(IdPrefix::Order, april(), existing), "O2024041000");

        let parsed: FormattedId = "O2024041000".parse().unwrap();
        assert_eq!(parsed.sequence, 1000);
    }

    #[test]
    fn test_parse_rejects_bad_month() {
        assert!("P202413001".parse::<FormattedId>().is_err());
        assert!("P202400001".parse::<FormattedId>().is_err());
    }

    #[test]
    fn test_next_numeric_id() {
        assert_eq!(next_numeric_id(Vec::new()), 1);
        assert_eq!(next_numeric_id(vec![3, 9, 4]), 10);
    }
}
