//! Monthly period tokens
//!
//! A `Period` always renders as a zero-padded `YYYY-MM` token, so the string
//! order of rendered periods and the derived `Ord` both match the calendar.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid period '{0}', expected YYYY-MM")]
pub struct PeriodParseError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
  year: i32,
  month: u32,
}

impl Period {
  pub fn new(year: i32, month: u32) -> Result<Self, PeriodParseError> {
    if !(1..=12).contains(&month) || !(0..=9999).contains(&year) {
      return Err(PeriodParseError(format!("{year}-{month}")));
    }
    Ok(Self { year, month })
  }
}

impl FromStr for Period {
  type Err = PeriodParseError;

  /// Accepts `YYYY-MM`, `YYYY-M` and `YYYY-MM-DD` (the day is dropped)
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let invalid = || PeriodParseError(s.to_string());
    let mut parts = s.trim().split('-');

    let year = parts.next().filter(|y| y.len() == 4).ok_or_else(invalid)?;
    let month = parts.next().filter(|m| (1..=2).contains(&m.len())).ok_or_else(invalid)?;
    if let Some(day) = parts.next() {
      if day.len() != 2 || day.parse::<u32>().is_err() {
        return Err(invalid());
      }
    }
    if parts.next().is_some() {
      return Err(invalid());
    }

    let year = year.parse::<i32>().map_err(|_| invalid())?;
    let month = month.parse::<u32>().map_err(|_| invalid())?;
    Period::new(year, month).map_err(|_| invalid())
  }
}

impl TryFrom<String> for Period {
  type Error = PeriodParseError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<Period> for String {
  fn from(period: Period) -> Self {
    period.to_string()
  }
}

impl fmt::Display for Period {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:04}-{:02}", self.year, self.month)
  }
}
