//! CSV ingestion for the monthly and daily forecast tables

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::dataset::{columns, DailyRecord, MonthlyRecord};
use crate::error::IngestionError;
use crate::period::Period;

type Result<T> = std::result::Result<T, IngestionError>;

const MONTHLY_COLUMNS: [&str; 4] =
  [columns::PRODUCT, columns::LOCATION, columns::MONTH, columns::QUANTITY];
const DAILY_COLUMNS: [&str; 2] = [columns::DATE, columns::QUANTITY];

pub fn load_monthly(path: &Path) -> Result<Vec<MonthlyRecord>> {
  let file = open(path)?;
  read_monthly(file, &path.display().to_string())
}

pub fn load_daily(path: &Path) -> Result<Vec<DailyRecord>> {
  let file = open(path)?;
  read_daily(file, &path.display().to_string())
}

fn open(path: &Path) -> Result<File> {
  File::open(path)
    .map_err(|e| IngestionError::unreadable(path.display().to_string(), e.to_string()))
}

/// Column positions resolved from the header row
struct Header {
  source: String,
  record: StringRecord,
}

impl Header {
  fn read<R: Read>(reader: &mut csv::Reader<R>, source: &str) -> Result<Self> {
    let record =
      reader.headers().map_err(|e| IngestionError::unreadable(source, e.to_string()))?.clone();
    Ok(Self { source: source.to_string(), record })
  }

  fn position(&self, column: &str) -> Option<usize> {
    self.record.iter().position(|h| h == column)
  }

  fn require(&self, required: &[&str]) -> Result<Vec<usize>> {
    required
      .iter()
      .map(|column| {
        self.position(column).ok_or_else(|| IngestionError::missing_column(&self.source, *column))
      })
      .collect()
  }
}

fn reader<R: Read>(input: R) -> csv::Reader<R> {
  ReaderBuilder::new().trim(Trim::All).from_reader(input)
}

fn rows<'a, R: Read>(
  reader: &'a mut csv::Reader<R>,
  source: &str,
) -> impl Iterator<Item = Result<(u64, StringRecord)>> + 'a {
  let source = source.to_string();
  reader.records().map(move |row| {
    let row = row.map_err(|e| {
      let line = e.position().map(|p| p.line()).unwrap_or(0);
      IngestionError::malformed(&source, line, e.to_string())
    })?;
    let line = row.position().map(|p| p.line()).unwrap_or(0);
    Ok((line, row))
  })
}

/// Parse the monthly table from any reader. `source` names the input in errors.
pub fn read_monthly<R: Read>(input: R, source: &str) -> Result<Vec<MonthlyRecord>> {
  let mut reader = reader(input);
  let header = Header::read(&mut reader, source)?;
  let idx = header.require(&MONTHLY_COLUMNS)?;

  let mut records = Vec::new();
  for row in rows(&mut reader, source) {
    let (line, row) = row?;
    let field = |i: usize| row.get(idx[i]).unwrap_or("");

    let period = field(2)
      .parse::<Period>()
      .map_err(|e| IngestionError::malformed(source, line, e.to_string()))?;
    let quantity = parse_quantity(field(3))
      .map_err(|message| IngestionError::malformed(source, line, message))?;

    records.push(MonthlyRecord::new(field(0), field(1), period, quantity));
  }

  tracing::debug!(source, rows = records.len(), "read monthly forecasts");
  Ok(records)
}

/// Parse the daily table. `Product` and `City_State` are optional here.
pub fn read_daily<R: Read>(input: R, source: &str) -> Result<Vec<DailyRecord>> {
  let mut reader = reader(input);
  let header = Header::read(&mut reader, source)?;
  let idx = header.require(&DAILY_COLUMNS)?;
  let product_idx = header.position(columns::PRODUCT);
  let location_idx = header.position(columns::LOCATION);

  let mut records = Vec::new();
  for row in rows(&mut reader, source) {
    let (line, row) = row?;
    let optional = |i: Option<usize>| {
      i.and_then(|i| row.get(i)).filter(|v| !v.is_empty()).map(str::to_string)
    };

    let date = parse_date(row.get(idx[0]).unwrap_or(""))
      .map_err(|message| IngestionError::malformed(source, line, message))?;
    let predicted_quantity = parse_quantity(row.get(idx[1]).unwrap_or(""))
      .map_err(|message| IngestionError::malformed(source, line, message))?;

    records.push(DailyRecord {
      date,
      predicted_quantity,
      product: optional(product_idx),
      location: optional(location_idx),
    });
  }

  tracing::debug!(source, rows = records.len(), "read daily forecasts");
  Ok(records)
}

/// Quantities are whole, non-negative numbers. Exported tables sometimes
/// write them as floats (`12.0`), which is accepted when integral.
fn parse_quantity(raw: &str) -> std::result::Result<u64, String> {
  if let Ok(value) = raw.parse::<u64>() {
    return Ok(value);
  }
  match raw.parse::<f64>() {
    Ok(value) if value.is_finite() && value >= 0.0 && value.fract() == 0.0 => Ok(value as u64),
    _ => Err(format!("invalid {} '{}'", columns::QUANTITY, raw)),
  }
}

fn parse_date(raw: &str) -> std::result::Result<NaiveDate, String> {
  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
    .map_err(|_| format!("invalid {} '{}'", columns::DATE, raw))
}
