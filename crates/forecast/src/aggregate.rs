//! Read-side operations over monthly forecast rows
//!
//! Every function here is pure: it takes rows, returns new rows, and treats
//! an unknown product or location as "no rows", never as an error.

use serde::Serialize;
use std::collections::HashMap;

use crate::dataset::MonthlyRecord;
use crate::period::Period;

/// Summed demand for one location
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationTotal {
  pub location: String,
  pub total: u64,
}

/// Summed demand for one period
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodTotal {
  pub period: Period,
  pub total: u64,
}

pub fn filter_by_product(rows: &[MonthlyRecord], product: &str) -> Vec<MonthlyRecord> {
  rows.iter().filter(|r| r.product == product).cloned().collect()
}

pub fn filter_by_location(rows: &[MonthlyRecord], location: &str) -> Vec<MonthlyRecord> {
  rows.iter().filter(|r| r.location == location).cloned().collect()
}

/// Rows whose location is any of `locations`
pub fn filter_by_locations(rows: &[MonthlyRecord], locations: &[String]) -> Vec<MonthlyRecord> {
  rows.iter().filter(|r| locations.contains(&r.location)).cloned().collect()
}

/// Rows for either location, in source order, optionally narrowed to one
/// product. A location without data simply contributes nothing.
pub fn compare_locations(
  rows: &[MonthlyRecord],
  first: &str,
  second: &str,
  product: Option<&str>,
) -> Vec<MonthlyRecord> {
  rows
    .iter()
    .filter(|r| r.location == first || r.location == second)
    .filter(|r| product.map_or(true, |p| r.product == p))
    .cloned()
    .collect()
}

/// The `n` locations with the highest summed demand for `product`.
///
/// Totals are sorted descending; equal totals keep the order in which their
/// locations first appear in `rows`.
pub fn top_n(rows: &[MonthlyRecord], product: &str, n: usize) -> Vec<LocationTotal> {
  let mut totals: Vec<LocationTotal> = Vec::new();
  let mut index: HashMap<&str, usize> = HashMap::new();

  for row in rows.iter().filter(|r| r.product == product) {
    match index.get(row.location.as_str()) {
      Some(&i) => totals[i].total += row.predicted_quantity,
      None => {
        index.insert(&row.location, totals.len());
        totals.push(LocationTotal {
          location: row.location.clone(),
          total: row.predicted_quantity,
        });
      }
    }
  }

  // stable sort, so ties stay in first-seen order
  totals.sort_by(|a, b| b.total.cmp(&a.total));
  totals.truncate(n);
  totals
}

/// Demand summed per period, periods ascending
pub fn monthly_totals(rows: &[MonthlyRecord], product: Option<&str>) -> Vec<PeriodTotal> {
  let mut totals: Vec<PeriodTotal> = Vec::new();

  for row in rows.iter().filter(|r| product.map_or(true, |p| r.product == p)) {
    match totals.iter_mut().find(|t| t.period == row.period) {
      Some(total) => total.total += row.predicted_quantity,
      None => totals.push(PeriodTotal { period: row.period, total: row.predicted_quantity }),
    }
  }

  totals.sort_by_key(|t| t.period);
  totals
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record(product: &str, location: &str, period: &str, quantity: u64) -> MonthlyRecord {
    MonthlyRecord::new(product, location, period.parse().unwrap(), quantity)
  }

  fn rows() -> Vec<MonthlyRecord> {
    vec![
      record("P", "Dallas (TX)", "2020-03", 10),
      record("P", "Austin (TX)", "2020-03", 30),
      record("Q", "Dallas (TX)", "2020-03", 99),
      record("P", "Boston (MA)", "2020-03", 20),
      record("P", "Dallas (TX)", "2020-04", 10),
      record("P", "Seattle (WA)", "2020-04", 30),
    ]
  }

  #[test]
  fn test_filter_by_product_is_idempotent() {
    let once = filter_by_product(&rows(), "P");
    let twice = filter_by_product(&once, "P");
    assert_eq!(once, twice);
    assert_eq!(once.len(), 5);
  }

  #[test]
  fn test_unknown_values_yield_no_rows() {
    assert!(filter_by_product(&rows(), "Nothing").is_empty());
    assert!(filter_by_location(&rows(), "Nowhere (ZZ)").is_empty());
    assert!(top_n(&rows(), "Nothing", 5).is_empty());
  }

  #[test]
  fn test_compare_locations() {
    let both = compare_locations(&rows(), "Dallas (TX)", "Austin (TX)", None);
    assert_eq!(both.len(), 4);
    assert_eq!(both[0].location, "Dallas (TX)");
    assert_eq!(both[1].location, "Austin (TX)");

    let narrowed = compare_locations(&rows(), "Dallas (TX)", "Austin (TX)", Some("Q"));
    assert_eq!(narrowed.len(), 1);

    let one_missing = compare_locations(&rows(), "Dallas (TX)", "Nowhere (ZZ)", Some("P"));
    assert_eq!(one_missing.len(), 2);
  }

  #[test]
  fn test_top_n_orders_by_total_then_first_seen() {
    let top = top_n(&rows(), "P", 5);
    let names: Vec<&str> = top.iter().map(|t| t.location.as_str()).collect();
    // Austin and Seattle tie at 30, Dallas and Boston tie at 20
    assert_eq!(names, vec!["Austin (TX)", "Seattle (WA)", "Dallas (TX)", "Boston (MA)"]);
    assert_eq!(top[2].total, 20);
  }

  #[test]
  fn test_top_n_is_bounded() {
    assert_eq!(top_n(&rows(), "P", 2).len(), 2);
    assert_eq!(top_n(&rows(), "P", 10).len(), 4);
    assert!(top_n(&rows(), "P", 0).is_empty());
  }

  #[test]
  fn test_monthly_totals() {
    let totals = monthly_totals(&rows(), Some("P"));
    assert_eq!(totals.len(), 2);
    assert_eq!(totals[0].period.to_string(), "2020-03");
    assert_eq!(totals[0].total, 60);
    assert_eq!(totals[1].total, 40);

    let all = monthly_totals(&rows(), None);
    assert_eq!(all[0].total, 159);
  }
}
