//! Context summarization
//!
//! Bounds a data slice to at most `row_cap` rows for a consumer with a
//! limited input budget. Below the cap the slice is passed through whole.
//! Above it, the first `row_cap` rows are kept in order and statistics are
//! computed over the full slice, so totals are never taken from the sample.

use serde::Serialize;
use std::fmt;

use crate::dataset::{columns, distinct, MonthlyRecord};
use crate::growth::GrowthRow;
use crate::planner::DataSlice;

pub const DEFAULT_ROW_CAP: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Coverage {
  Complete,
  Sample,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantityStats {
  pub sum: u64,
  pub mean: f64,
  pub min: u64,
  pub max: u64,
}

/// Statistics over every row of a slice, not just the sampled ones
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliceStats {
  pub total_rows: usize,
  /// Absent when the slice has no quantity column
  pub quantity: Option<QuantityStats>,
  pub location_count: usize,
  pub products: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextPayload {
  pub coverage: Coverage,
  pub total_rows: usize,
  pub columns: Vec<String>,
  pub rows: Vec<Vec<String>>,
  pub stats: Option<SliceStats>,
}

/// A row that can be laid out as text cells
trait TableRow {
  fn cells(&self) -> Vec<String>;
  fn quantity(&self) -> Option<u64>;
  fn location(&self) -> &str;
  fn product(&self) -> &str;
}

impl TableRow for MonthlyRecord {
  fn cells(&self) -> Vec<String> {
    vec![
      self.product.clone(),
      self.location.clone(),
      self.period.to_string(),
      self.predicted_quantity.to_string(),
    ]
  }

  fn quantity(&self) -> Option<u64> {
    Some(self.predicted_quantity)
  }

  fn location(&self) -> &str {
    &self.location
  }

  fn product(&self) -> &str {
    &self.product
  }
}

impl TableRow for GrowthRow {
  fn cells(&self) -> Vec<String> {
    let mut cells = vec![self.product.clone(), self.location.clone()];
    cells.extend(
      self.quantities.iter().map(|q| q.map_or_else(|| "n/a".to_string(), |q| q.to_string())),
    );
    cells.extend(self.growth.iter().map(|(_, g)| g.to_string()));
    cells
  }

  fn quantity(&self) -> Option<u64> {
    None
  }

  fn location(&self) -> &str {
    &self.location
  }

  fn product(&self) -> &str {
    &self.product
  }
}

fn monthly_header() -> Vec<String> {
  [columns::PRODUCT, columns::LOCATION, columns::MONTH, columns::QUANTITY]
    .iter()
    .map(|c| c.to_string())
    .collect()
}

pub fn summarize(slice: &DataSlice, row_cap: usize) -> ContextPayload {
  match slice {
    DataSlice::Monthly(rows) => summarize_rows(monthly_header(), rows, row_cap),
    DataSlice::Growth(table) => summarize_rows(table.header(), table.rows(), row_cap),
  }
}

fn summarize_rows<R: TableRow>(columns: Vec<String>, rows: &[R], row_cap: usize) -> ContextPayload {
  if rows.len() <= row_cap {
    return ContextPayload {
      coverage: Coverage::Complete,
      total_rows: rows.len(),
      columns,
      rows: rows.iter().map(TableRow::cells).collect(),
      stats: None,
    };
  }

  tracing::debug!(rows = rows.len(), row_cap, "sampling slice for context");
  ContextPayload {
    coverage: Coverage::Sample,
    total_rows: rows.len(),
    columns,
    rows: rows[..row_cap].iter().map(TableRow::cells).collect(),
    stats: Some(stats(rows)),
  }
}

fn stats<R: TableRow>(rows: &[R]) -> SliceStats {
  let quantities: Vec<u64> = rows.iter().filter_map(TableRow::quantity).collect();
  let quantity = match (quantities.iter().min(), quantities.iter().max()) {
    (Some(&min), Some(&max)) => {
      let sum: u64 = quantities.iter().sum();
      Some(QuantityStats { sum, mean: sum as f64 / quantities.len() as f64, min, max })
    }
    _ => None,
  };

  SliceStats {
    total_rows: rows.len(),
    quantity,
    location_count: distinct(rows.iter().map(TableRow::location)).len(),
    products: distinct(rows.iter().map(TableRow::product)),
  }
}

impl ContextPayload {
  pub fn is_empty(&self) -> bool {
    self.total_rows == 0
  }

  /// Deterministic text form handed to the assistant
  pub fn render(&self) -> String {
    let mut out = match self.coverage {
      Coverage::Complete => format!("Complete data ({} rows):\n\n", self.total_rows),
      Coverage::Sample => format!(
        "Sample of the data (first {} of {} rows):\n\n",
        self.rows.len(),
        self.total_rows
      ),
    };
    out.push_str(&render_table(&self.columns, &self.rows));

    if let Some(stats) = &self.stats {
      out.push_str("\n\nOverall statistics:\n");
      out.push_str(&format!("- Total rows: {}\n", stats.total_rows));
      if let Some(q) = &stats.quantity {
        out.push_str(&format!("- Total quantity: {}\n", group_thousands(q.sum)));
        out.push_str(&format!("- Mean quantity: {:.2}\n", q.mean));
        out.push_str(&format!("- Min quantity: {}\n", q.min));
        out.push_str(&format!("- Max quantity: {}\n", q.max));
      }
      out.push_str(&format!("- Locations: {}\n", stats.location_count));
      out.push_str(&format!("- Products: {}\n", stats.products.join(", ")));
    }

    out
  }
}

impl fmt::Display for ContextPayload {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.render())
  }
}

/// Right-aligned columns separated by two spaces
pub fn render_table(header: &[String], rows: &[Vec<String>]) -> String {
  let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
  for row in rows {
    for (i, cell) in row.iter().enumerate() {
      if let Some(width) = widths.get_mut(i) {
        *width = (*width).max(cell.chars().count());
      }
    }
  }

  let line = |cells: &[String]| {
    cells
      .iter()
      .zip(&widths)
      .map(|(cell, &width)| format!("{cell:>width$}"))
      .collect::<Vec<_>>()
      .join("  ")
  };

  let mut lines = vec![line(header)];
  lines.extend(rows.iter().map(|row| line(row)));
  lines.join("\n")
}

/// 1234567 -> "1,234,567"
pub fn group_thousands(value: u64) -> String {
  let digits = value.to_string();
  let mut out = String::with_capacity(digits.len() + digits.len() / 3);
  for (i, ch) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      out.push(',');
    }
    out.push(ch);
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::growth::growth;

  fn rows(count: u64) -> Vec<MonthlyRecord> {
    let locations = ["Dallas (TX)", "Austin (TX)", "Boston (MA)"];
    (0..count)
      .map(|i| {
        MonthlyRecord::new(
          if i % 2 == 0 { "ThinkPad Laptop" } else { "AAA Batteries (4-pack)" },
          locations[(i % 3) as usize],
          "2020-03".parse().unwrap(),
          i + 1,
        )
      })
      .collect()
  }

  #[test]
  fn test_below_cap_is_complete() {
    let slice = DataSlice::Monthly(rows(10));
    let payload = summarize(&slice, 50);
    assert_eq!(payload.coverage, Coverage::Complete);
    assert_eq!(payload.rows.len(), 10);
    assert!(payload.stats.is_none());
  }

  #[test]
  fn test_at_cap_is_complete() {
    let payload = summarize(&DataSlice::Monthly(rows(50)), 50);
    assert_eq!(payload.coverage, Coverage::Complete);
    assert_eq!(payload.rows.len(), 50);
  }

  #[test]
  fn test_above_cap_samples_in_order_with_full_stats() {
    let all = rows(120);
    let payload = summarize(&DataSlice::Monthly(all.clone()), 50);

    assert_eq!(payload.coverage, Coverage::Sample);
    assert_eq!(payload.total_rows, 120);
    assert_eq!(payload.rows.len(), 50);
    for (cells, record) in payload.rows.iter().zip(&all) {
      assert_eq!(cells[3], record.predicted_quantity.to_string());
    }

    let stats = payload.stats.unwrap();
    let quantity = stats.quantity.unwrap();
    assert_eq!(quantity.sum, (1..=120).sum::<u64>());
    assert_eq!(quantity.min, 1);
    assert_eq!(quantity.max, 120);
    assert!((quantity.mean - 60.5).abs() < 1e-9);
    assert_eq!(stats.location_count, 3);
    assert_eq!(stats.products, vec!["ThinkPad Laptop", "AAA Batteries (4-pack)"]);
  }

  #[test]
  fn test_growth_slice_has_no_quantity_stats() {
    let mut monthly = Vec::new();
    for i in 0..4u64 {
      for period in ["2020-03", "2020-04"] {
        let location = format!("City{i} (TX)");
        monthly.push(MonthlyRecord::new("P", &location, period.parse().unwrap(), 10));
      }
    }
    let payload = summarize(&DataSlice::Growth(growth(&monthly, None)), 2);
    assert_eq!(payload.columns.last().map(String::as_str), Some("Growth_M1_M2"));
    assert!(!payload.render().contains("Total quantity"));
    let stats = payload.stats.as_ref().unwrap();
    assert!(stats.quantity.is_none());
    assert_eq!(stats.location_count, 4);
  }

  #[test]
  fn test_render_is_deterministic() {
    let slice = DataSlice::Monthly(rows(3));
    let first = summarize(&slice, 2).render();
    let second = summarize(&slice, 2).render();
    assert_eq!(first, second);
    assert!(first.starts_with("Sample of the data (first 2 of 3 rows):"));
    assert!(first.contains("- Total quantity: 6"));
    assert!(first.contains("- Mean quantity: 2.00"));
  }

  #[test]
  fn test_render_complete_table() {
    let payload = summarize(&DataSlice::Monthly(rows(1)), 50);
    let text = payload.render();
    let expected = "\
Complete data (1 rows):

        Product   City_State    Month  Predicted_Quantity
ThinkPad Laptop  Dallas (TX)  2020-03                   1";
    assert_eq!(text, expected);
  }

  #[test]
  fn test_empty_slice() {
    let payload = summarize(&DataSlice::Monthly(vec![]), 50);
    assert!(payload.is_empty());
    assert_eq!(payload.coverage, Coverage::Complete);
  }

  #[test]
  fn test_group_thousands() {
    assert_eq!(group_thousands(0), "0");
    assert_eq!(group_thousands(999), "999");
    assert_eq!(group_thousands(1000), "1,000");
    assert_eq!(group_thousands(1234567), "1,234,567");
  }
}
