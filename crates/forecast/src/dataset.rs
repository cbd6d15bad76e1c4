//! The forecast dataset
//!
//! Two tables loaded once per process: monthly forecasts per product and
//! location, and the daily forecast series. The tables are never mutated
//! after construction; every query hands back owned copies.

use chrono::NaiveDate;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{IngestionError, Result};
use crate::ingest;
use crate::period::Period;

/// Source column names. Location parsing relies on the `City (ST)` values
/// found under `City_State`.
pub mod columns {
  pub const PRODUCT: &str = "Product";
  pub const LOCATION: &str = "City_State";
  pub const MONTH: &str = "Month";
  pub const QUANTITY: &str = "Predicted_Quantity";
  pub const DATE: &str = "Date";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyRecord {
  pub product: String,
  pub location: String,
  pub period: Period,
  pub predicted_quantity: u64,
}

impl MonthlyRecord {
  pub fn new(product: &str, location: &str, period: Period, predicted_quantity: u64) -> Self {
    Self {
      product: product.to_string(),
      location: location.to_string(),
      period,
      predicted_quantity,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRecord {
  pub date: NaiveDate,
  pub predicted_quantity: u64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub product: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub location: Option<String>,
}

/// Narrowing applied by `Dataset::query`. Empty criteria match everything.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
  pub product: Option<String>,
  pub locations: Vec<String>,
  pub periods: Vec<Period>,
}

impl RecordFilter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn product(mut self, product: impl Into<String>) -> Self {
    self.product = Some(product.into());
    self
  }

  pub fn location(mut self, location: impl Into<String>) -> Self {
    self.locations.push(location.into());
    self
  }

  pub fn period(mut self, period: Period) -> Self {
    self.periods.push(period);
    self
  }

  pub fn matches(&self, record: &MonthlyRecord) -> bool {
    self.product.as_ref().map_or(true, |p| *p == record.product)
      && (self.locations.is_empty() || self.locations.contains(&record.location))
      && (self.periods.is_empty() || self.periods.contains(&record.period))
  }
}

/// Overview numbers for the whole dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
  pub total_predictions: usize,
  pub products: Vec<String>,
  pub locations: Vec<String>,
  pub periods: Vec<Period>,
  pub date_range: Option<(NaiveDate, NaiveDate)>,
  pub total_demand: Vec<(String, u64)>,
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
  monthly: Vec<MonthlyRecord>,
  daily: Vec<DailyRecord>,
}

impl Dataset {
  /// Build a dataset, rejecting duplicate (product, location, period)
  /// forecasts. Daily records are ordered by date; equal dates keep their
  /// source order.
  pub fn new(
    monthly: Vec<MonthlyRecord>,
    mut daily: Vec<DailyRecord>,
  ) -> std::result::Result<Self, IngestionError> {
    let mut seen = HashSet::new();
    for record in &monthly {
      if !seen.insert((&record.product, &record.location, record.period)) {
        return Err(IngestionError::DuplicateRecord {
          product: record.product.clone(),
          location: record.location.clone(),
          period: record.period.to_string(),
        });
      }
    }

    daily.sort_by_key(|r| r.date);
    Ok(Self { monthly, daily })
  }

  pub fn monthly(&self) -> &[MonthlyRecord] {
    &self.monthly
  }

  pub fn daily(&self) -> &[DailyRecord] {
    &self.daily
  }

  pub fn query(&self, filter: &RecordFilter) -> Vec<MonthlyRecord> {
    self.monthly.iter().filter(|r| filter.matches(r)).cloned().collect()
  }

  /// Distinct locations in first-seen order
  pub fn locations(&self) -> Vec<String> {
    distinct(self.monthly.iter().map(|r| r.location.as_str()))
  }

  pub fn summary(&self) -> DatasetSummary {
    let products = distinct(self.monthly.iter().map(|r| r.product.as_str()));
    let locations = self.locations();

    let mut periods: Vec<Period> = self.monthly.iter().map(|r| r.period).collect();
    periods.sort();
    periods.dedup();

    let date_range = match (self.daily.first(), self.daily.last()) {
      (Some(first), Some(last)) => Some((first.date, last.date)),
      _ => None,
    };

    let total_demand = products
      .iter()
      .map(|product| {
        let total: u64 =
          self.monthly.iter().filter(|r| &r.product == product).map(|r| r.predicted_quantity).sum();
        (product.clone(), total)
      })
      .collect();

    DatasetSummary {
      total_predictions: self.daily.len(),
      products,
      locations,
      periods,
      date_range,
      total_demand,
    }
  }
}

/// Distinct values in first-seen order
pub(crate) fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
  let mut seen = HashSet::new();
  values.filter(|v| seen.insert(*v)).map(str::to_string).collect()
}

/// Loads the dataset from its two CSV files exactly once.
///
/// The first successful `load` ingests both files; later calls return the
/// cached dataset. A failed load caches nothing and reports the error.
pub struct DatasetLoader {
  monthly_path: PathBuf,
  daily_path: PathBuf,
  cell: OnceCell<Dataset>,
}

impl DatasetLoader {
  pub fn new(monthly_path: impl Into<PathBuf>, daily_path: impl Into<PathBuf>) -> Self {
    Self { monthly_path: monthly_path.into(), daily_path: daily_path.into(), cell: OnceCell::new() }
  }

  pub fn monthly_path(&self) -> &Path {
    &self.monthly_path
  }

  pub fn daily_path(&self) -> &Path {
    &self.daily_path
  }

  pub fn is_loaded(&self) -> bool {
    self.cell.get().is_some()
  }

  pub fn load(&self) -> Result<&Dataset> {
    self.cell.get_or_try_init(|| -> Result<Dataset> {
      let monthly = ingest::load_monthly(&self.monthly_path)?;
      let daily = ingest::load_daily(&self.daily_path)?;
      let dataset = Dataset::new(monthly, daily)?;
      tracing::info!(
        monthly = dataset.monthly().len(),
        daily = dataset.daily().len(),
        "loaded forecast dataset"
      );
      Ok(dataset)
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn period(token: &str) -> Period {
    token.parse().unwrap()
  }

  fn sample() -> Dataset {
    Dataset::new(
      vec![
        MonthlyRecord::new("ThinkPad Laptop", "Dallas (TX)", period("2020-03"), 10),
        MonthlyRecord::new("ThinkPad Laptop", "Austin (TX)", period("2020-03"), 4),
        MonthlyRecord::new("AAA Batteries (4-pack)", "Dallas (TX)", period("2020-04"), 30),
      ],
      vec![
        DailyRecord {
          date: NaiveDate::from_ymd_opt(2020, 3, 2).unwrap(),
          predicted_quantity: 5,
          product: None,
          location: None,
        },
        DailyRecord {
          date: NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
          predicted_quantity: 3,
          product: None,
          location: None,
        },
      ],
    )
    .unwrap()
  }

  #[test]
  fn test_duplicate_triples_are_rejected() {
    let record = MonthlyRecord::new("P", "Dallas (TX)", period("2020-03"), 1);
    let result = Dataset::new(vec![record.clone(), record], vec![]);
    assert!(matches!(result, Err(IngestionError::DuplicateRecord { .. })));
  }

  #[test]
  fn test_daily_rows_are_ordered_by_date() {
    let dataset = sample();
    let dates: Vec<_> = dataset.daily().iter().map(|r| r.date.to_string()).collect();
    assert_eq!(dates, vec!["2020-03-01", "2020-03-02"]);
  }

  #[test]
  fn test_query_returns_independent_copies() {
    let dataset = sample();
    let mut rows = dataset.query(&RecordFilter::new().location("Dallas (TX)"));
    assert_eq!(rows.len(), 2);

    rows[0].predicted_quantity = 999;
    rows.clear();
    assert_eq!(dataset.monthly()[0].predicted_quantity, 10);
    assert_eq!(dataset.monthly().len(), 3);
  }

  #[test]
  fn test_query_combines_criteria() {
    let dataset = sample();
    let filter = RecordFilter::new().product("ThinkPad Laptop").period(period("2020-03"));
    assert_eq!(dataset.query(&filter).len(), 2);
    assert!(dataset.query(&RecordFilter::new().product("Unknown")).is_empty());
  }

  #[test]
  fn test_summary() {
    let summary = sample().summary();
    assert_eq!(summary.total_predictions, 2);
    assert_eq!(summary.products, vec!["ThinkPad Laptop", "AAA Batteries (4-pack)"]);
    assert_eq!(summary.locations, vec!["Dallas (TX)", "Austin (TX)"]);
    assert_eq!(summary.periods, vec![period("2020-03"), period("2020-04")]);
    assert_eq!(summary.total_demand[0], ("ThinkPad Laptop".to_string(), 14));
    let (start, end) = summary.date_range.unwrap();
    assert_eq!((start.to_string(), end.to_string()), ("2020-03-01".into(), "2020-03-02".into()));
  }

  #[test]
  fn test_loader_reports_unreadable_files() {
    let loader = DatasetLoader::new("/nonexistent/monthly.csv", "/nonexistent/daily.csv");
    assert!(loader.load().is_err());
    assert!(!loader.is_loaded());
  }
}
