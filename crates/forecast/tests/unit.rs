use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

use forecast::aggregate::{filter_by_location, filter_by_product, top_n};
use forecast::{
  summarize, Coverage, DataSlice, DatasetLoader, ForecastError, Growth, GrowthColumn,
  IngestionError, Intent, IntentClassifier, MonthlyRecord, QueryPlanner, UndefinedGrowth,
};

fn csv_file(content: &str) -> NamedTempFile {
  let mut file = NamedTempFile::new().unwrap();
  file.write_all(content.as_bytes()).unwrap();
  file
}

/// Three months, twelve cities, two products
fn monthly_csv() -> String {
  let cities = [
    "Dallas (TX)",
    "Houston (TX)",
    "Austin (TX)",
    "San Francisco (CA)",
    "Los Angeles (CA)",
    "New York City (NY)",
    "Boston (MA)",
    "Seattle (WA)",
    "Atlanta (GA)",
    "Portland (ME)",
    "Washington DC",
    "Portland (OR)",
  ];
  let mut csv = String::from("Product,City_State,Month,Predicted_Quantity\n");
  for (m, month) in ["2020-03", "2020-04", "2020-05"].iter().enumerate() {
    for (c, city) in cities.iter().enumerate() {
      let c = c as u64;
      let m = m as u64;
      csv.push_str(&format!("ThinkPad Laptop,{city},{month},{}\n", 100 + c * 10 + m));
      csv.push_str(&format!("AAA Batteries (4-pack),{city},{month},{}\n", 1000 + c));
    }
  }
  csv
}

const DAILY: &str = "Date,Predicted_Quantity,Product\n2020-03-01,12,ThinkPad Laptop\n";

#[test]
fn test_loader_loads_once() {
  let monthly = csv_file(&monthly_csv());
  let daily = csv_file(DAILY);
  let loader = DatasetLoader::new(monthly.path(), daily.path());

  assert!(!loader.is_loaded());
  let first = loader.load().unwrap() as *const _;
  assert!(loader.is_loaded());
  let second = loader.load().unwrap() as *const _;
  assert_eq!(first, second);

  let dataset = loader.load().unwrap();
  assert_eq!(dataset.monthly().len(), 72);
  assert_eq!(dataset.daily()[0].product.as_deref(), Some("ThinkPad Laptop"));
}

#[test]
fn test_failed_load_is_not_cached() {
  let dir = TempDir::new().unwrap();
  let monthly_path = dir.path().join("monthly.csv");
  let daily = csv_file(DAILY);
  let loader = DatasetLoader::new(&monthly_path, daily.path());

  let err = loader.load().unwrap_err();
  assert!(matches!(err, ForecastError::Ingestion(IngestionError::Unreadable { .. })));
  assert!(!loader.is_loaded());

  std::fs::write(&monthly_path, monthly_csv()).unwrap();
  assert_eq!(loader.load().unwrap().monthly().len(), 72);
}

#[test]
fn test_duplicate_forecasts_are_rejected() {
  let monthly = csv_file(
    "Product,City_State,Month,Predicted_Quantity\nP,Dallas (TX),2020-03,1\nP,Dallas (TX),2020-03-01,2\n",
  );
  let daily = csv_file(DAILY);
  let err = DatasetLoader::new(monthly.path(), daily.path()).load().unwrap_err();
  assert!(matches!(err, ForecastError::Ingestion(IngestionError::DuplicateRecord { .. })));
}

#[test]
fn test_comparison_takes_precedence_over_growth() {
  let classifier = IntentClassifier::new();
  assert_eq!(classifier.classify("Compare growth of Dallas versus Austin"), Intent::Comparison);
}

#[test]
fn test_empty_question_selects_all_rows() {
  let monthly = csv_file(&monthly_csv());
  let daily = csv_file(DAILY);
  let loader = DatasetLoader::new(monthly.path(), daily.path());
  let dataset = loader.load().unwrap();

  let planned = QueryPlanner::new(dataset).resolve("");
  assert_eq!(planned.analysis.intent, Intent::General);
  assert_eq!(planned.slice.len(), 72);
}

#[test]
fn test_top_n_bounds_and_order() {
  let monthly = csv_file(&monthly_csv());
  let daily = csv_file(DAILY);
  let loader = DatasetLoader::new(monthly.path(), daily.path());
  let rows = loader.load().unwrap().monthly();

  for n in [0, 1, 5, 12, 40] {
    let totals = top_n(rows, "ThinkPad Laptop", n);
    assert_eq!(totals.len(), n.min(12));
    assert!(totals.windows(2).all(|w| w[0].total >= w[1].total));
  }
  assert_eq!(top_n(rows, "ThinkPad Laptop", 1)[0].location, "Portland (OR)");
  assert!(top_n(rows, "Monitor", 5).is_empty());
}

#[test]
fn test_growth_with_zero_base_is_undefined() {
  let rows = vec![
    MonthlyRecord::new("P", "Dallas (TX)", "2020-03".parse().unwrap(), 0),
    MonthlyRecord::new("P", "Dallas (TX)", "2020-04".parse().unwrap(), 10),
    MonthlyRecord::new("P", "Dallas (TX)", "2020-05".parse().unwrap(), 15),
  ];
  let table = forecast::growth::growth(&rows, None);
  let row = &table.rows()[0];

  assert_eq!(
    row.growth(GrowthColumn::FirstToSecond),
    Some(Growth::Undefined(UndefinedGrowth::ZeroBase))
  );
  assert_eq!(row.growth(GrowthColumn::SecondToThird), Some(Growth::Percent(50.0)));
  assert_eq!(row.growth(GrowthColumn::Total), Some(Growth::Undefined(UndefinedGrowth::ZeroBase)));
}

#[test]
fn test_summarize_caps_large_slices() {
  let monthly = csv_file(&monthly_csv());
  let daily = csv_file(DAILY);
  let loader = DatasetLoader::new(monthly.path(), daily.path());
  let dataset = loader.load().unwrap();

  let payload = summarize(&DataSlice::Monthly(dataset.monthly().to_vec()), 50);
  assert_eq!(payload.coverage, Coverage::Sample);
  assert_eq!(payload.rows.len(), 50);
  assert_eq!(payload.total_rows, 72);

  let stats = payload.stats.unwrap();
  let expected: u64 = dataset.monthly().iter().map(|r| r.predicted_quantity).sum();
  assert_eq!(stats.quantity.unwrap().sum, expected);
  assert_eq!(stats.location_count, 12);
}

#[test]
fn test_filters_are_idempotent() {
  let monthly = csv_file(&monthly_csv());
  let daily = csv_file(DAILY);
  let loader = DatasetLoader::new(monthly.path(), daily.path());
  let rows = loader.load().unwrap().monthly();

  let once = filter_by_product(rows, "ThinkPad Laptop");
  assert_eq!(filter_by_product(&once, "ThinkPad Laptop"), once);

  let once = filter_by_location(rows, "Boston (MA)");
  assert_eq!(filter_by_location(&once, "Boston (MA)"), once);
  assert_eq!(once.len(), 6);
}
