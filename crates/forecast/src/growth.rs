//! Period-over-period growth
//!
//! Monthly rows are pivoted per (product, location) with one quantity per
//! period, then growth percentages are derived between the first three
//! periods. A growth cell whose base quantity is zero (or absent) is tagged
//! undefined instead of being coerced to a number.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::dataset::MonthlyRecord;
use crate::period::Period;

/// Why a growth percentage could not be computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UndefinedGrowth {
  /// The earlier period's quantity is zero
  ZeroBase,
  /// One of the two periods has no forecast for this product and location
  MissingQuantity,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Growth {
  Percent(f64),
  Undefined(UndefinedGrowth),
}

impl Growth {
  /// (to - from) / from * 100, rounded to two decimals with ties to even
  pub fn between(from: Option<u64>, to: Option<u64>) -> Self {
    match (from, to) {
      (Some(0), Some(_)) => Growth::Undefined(UndefinedGrowth::ZeroBase),
      (Some(from), Some(to)) => {
        let change = (to as f64 - from as f64) / from as f64 * 100.0;
        Growth::Percent((change * 100.0).round_ties_even() / 100.0)
      }
      _ => Growth::Undefined(UndefinedGrowth::MissingQuantity),
    }
  }

  pub fn percent(&self) -> Option<f64> {
    match self {
      Growth::Percent(value) => Some(*value),
      Growth::Undefined(_) => None,
    }
  }

  pub fn is_undefined(&self) -> bool {
    matches!(self, Growth::Undefined(_))
  }
}

impl fmt::Display for Growth {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Growth::Percent(value) => write!(f, "{value:.2}"),
      Growth::Undefined(UndefinedGrowth::ZeroBase) => write!(f, "undefined (zero base)"),
      Growth::Undefined(UndefinedGrowth::MissingQuantity) => write!(f, "undefined (no data)"),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GrowthColumn {
  #[serde(rename = "Growth_M1_M2")]
  FirstToSecond,
  #[serde(rename = "Growth_M2_M3")]
  SecondToThird,
  #[serde(rename = "Growth_Total")]
  Total,
}

impl GrowthColumn {
  pub fn label(&self) -> &'static str {
    match self {
      GrowthColumn::FirstToSecond => "Growth_M1_M2",
      GrowthColumn::SecondToThird => "Growth_M2_M3",
      GrowthColumn::Total => "Growth_Total",
    }
  }

  /// Indices of the (from, to) periods this column compares
  fn span(&self) -> (usize, usize) {
    match self {
      GrowthColumn::FirstToSecond => (0, 1),
      GrowthColumn::SecondToThird => (1, 2),
      GrowthColumn::Total => (0, 2),
    }
  }

  /// Growth columns available for a given number of distinct periods.
  /// Missing columns are left out entirely rather than filled.
  pub fn for_period_count(count: usize) -> Vec<GrowthColumn> {
    match count {
      0 | 1 => vec![],
      2 => vec![GrowthColumn::FirstToSecond],
      _ => vec![GrowthColumn::FirstToSecond, GrowthColumn::SecondToThird, GrowthColumn::Total],
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthRow {
  pub product: String,
  pub location: String,
  /// One entry per table period; `None` when this pair has no forecast then
  pub quantities: Vec<Option<u64>>,
  pub growth: Vec<(GrowthColumn, Growth)>,
}

impl GrowthRow {
  pub fn growth(&self, column: GrowthColumn) -> Option<Growth> {
    self.growth.iter().find(|(c, _)| *c == column).map(|(_, g)| *g)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthTable {
  periods: Vec<Period>,
  columns: Vec<GrowthColumn>,
  rows: Vec<GrowthRow>,
}

impl GrowthTable {
  pub fn periods(&self) -> &[Period] {
    &self.periods
  }

  pub fn columns(&self) -> &[GrowthColumn] {
    &self.columns
  }

  pub fn rows(&self) -> &[GrowthRow] {
    &self.rows
  }

  pub fn len(&self) -> usize {
    self.rows.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }

  /// Column names: product, location, one per period, then growth columns
  pub fn header(&self) -> Vec<String> {
    let mut header = vec![
      crate::dataset::columns::PRODUCT.to_string(),
      crate::dataset::columns::LOCATION.to_string(),
    ];
    header.extend(self.periods.iter().map(Period::to_string));
    header.extend(self.columns.iter().map(|c| c.label().to_string()));
    header
  }

  /// Keep only rows for the given locations. Periods and columns are kept
  /// as they were, so the table shape does not depend on the restriction.
  pub fn restrict_to_locations(&self, locations: &[String]) -> GrowthTable {
    GrowthTable {
      periods: self.periods.clone(),
      columns: self.columns.clone(),
      rows: self.rows.iter().filter(|r| locations.contains(&r.location)).cloned().collect(),
    }
  }
}

/// Pivot quantities by period per (product, location) and derive growth.
///
/// Rows come out ordered by product, then location. Quantities for the same
/// (product, location, period) are summed.
pub fn growth(rows: &[MonthlyRecord], product: Option<&str>) -> GrowthTable {
  let selected: Vec<&MonthlyRecord> =
    rows.iter().filter(|r| product.map_or(true, |p| r.product == p)).collect();

  let mut periods: Vec<Period> = selected.iter().map(|r| r.period).collect();
  periods.sort();
  periods.dedup();

  let mut pivot: BTreeMap<(&str, &str), Vec<Option<u64>>> = BTreeMap::new();
  for record in &selected {
    let slot = periods.binary_search(&record.period).unwrap_or_default();
    let quantities = pivot
      .entry((record.product.as_str(), record.location.as_str()))
      .or_insert_with(|| vec![None; periods.len()]);
    quantities[slot] = Some(quantities[slot].unwrap_or(0) + record.predicted_quantity);
  }

  let columns = GrowthColumn::for_period_count(periods.len());
  let rows = pivot
    .into_iter()
    .map(|((product, location), quantities)| {
      let growth = columns
        .iter()
        .map(|column| {
          let (from, to) = column.span();
          (*column, Growth::between(quantities[from], quantities[to]))
        })
        .collect();
      GrowthRow { product: product.to_string(), location: location.to_string(), quantities, growth }
    })
    .collect::<Vec<_>>();

  let undefined = rows.iter().flat_map(|r| &r.growth).filter(|(_, g)| g.is_undefined()).count();
  if undefined > 0 {
    tracing::debug!(undefined, "growth cells without a usable base quantity");
  }

  GrowthTable { periods, columns, rows }
}
