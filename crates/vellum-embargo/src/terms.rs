//! Embargo terms.
//!
//! Terms are what a submitter typed: either the configured open-ended token
//! ("forever" by default) or a lift date. Dates may be partial; a year or a
//! month resolves to its first day.

use std::fmt::{self, Display};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EmbargoError, Result};

/// When an embargo ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiftDate {
    /// Never lifted automatically.
    Forever,
    On(NaiveDate),
}

impl LiftDate {
    /// The policy end date this lift date is written as. An indefinite
    /// embargo ends on 10000-01-01.
    pub fn end_date(self) -> NaiveDate {
        match self {
            Self::Forever => forever(),
            Self::On(date) => date,
        }
    }

    pub fn is_forever(self) -> bool {
        matches!(self, Self::Forever)
    }
}

impl Display for LiftDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forever => f.write_str("forever"),
            Self::On(date) => write!(f, "{date}"),
        }
    }
}

fn forever() -> NaiveDate {
    NaiveDate::from_ymd_opt(10_000, 1, 1).unwrap_or(NaiveDate::MAX)
}

/// Parses embargo terms.
///
/// Returns `None` for absent or blank terms (no embargo) and
/// [`LiftDate::Forever`] for `terms_open`.
pub fn parse_terms(terms: Option<&str>, terms_open: &str) -> Result<Option<LiftDate>> {
    let Some(raw) = terms else {
        return Ok(None);
    };
    let text = raw.trim();
    if text.is_empty() {
        return Ok(None);
    }
    if text == terms_open {
        return Ok(Some(LiftDate::Forever));
    }
    parse_date(text)
        .map(|date| Some(LiftDate::On(date)))
        .ok_or_else(|| EmbargoError::Parse {
            terms: raw.to_string(),
        })
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Some(timestamp.with_timezone(&Utc).date_naive());
    }
    let (year, month, day) = match text.split('-').collect::<Vec<_>>()[..] {
        [year] => (year, None, None),
        [year, month] => (year, Some(month), None),
        [year, month, day] => (year, Some(month), Some(day)),
        _ => return None,
    };
    let year = i32::try_from(digits(year, 4)?).ok()?;
    let month = month.map_or(Some(1), |m| digits(m, 2))?;
    let day = day.map_or(Some(1), |d| digits(d, 2))?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// A fixed-width run of ASCII digits.
fn digits(text: &str, width: usize) -> Option<u32> {
    if text.len() == width && text.bytes().all(|b| b.is_ascii_digit()) {
        text.parse().ok()
    } else {
        None
    }
}
