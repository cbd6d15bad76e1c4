//! Display formatting utilities for CLI output

use colored::*;
use console::Term;

use crate::aggregate::{LocationTotal, PeriodTotal};
use crate::dataset::DatasetSummary;
use crate::extract::{PeriodHint, QueryAnalysis};
use crate::planner::PlanWarning;
use crate::summarize::{group_thousands, render_table};

const DEFAULT_WIDTH: usize = 80;

/// Terminal width, or a fixed width when stdout is not a terminal
pub fn terminal_width() -> usize {
  Term::stdout().size_checked().map(|(_, cols)| cols as usize).unwrap_or(DEFAULT_WIDTH)
}

pub fn separator() -> String {
  "─".repeat(terminal_width().min(DEFAULT_WIDTH)).dimmed().to_string()
}

pub fn warning_message(warning: PlanWarning) -> &'static str {
  match warning {
    PlanWarning::EmptyResult => "No forecast rows match this question",
    PlanWarning::ComparisonFallback => {
      "A comparison needs two locations; answering as a general question"
    }
  }
}

pub fn print_warnings(warnings: &[PlanWarning]) {
  for warning in warnings {
    bentley::warn(warning_message(*warning));
  }
}

pub fn describe_period_hint(hint: Option<PeriodHint>) -> String {
  match hint {
    Some(PeriodHint::Period(period)) => period.to_string(),
    Some(PeriodHint::Month(month)) => format!("month {month}"),
    None => "-".to_string(),
  }
}

/// Labelled lines describing what was understood from a question
pub fn analysis_lines(analysis: &QueryAnalysis, rows: usize) -> Vec<String> {
  let locations =
    if analysis.locations.is_empty() { "-".to_string() } else { analysis.locations.join(", ") };

  vec![
    format!("{:<10} {}", "Intent:".bold(), analysis.intent.to_string().cyan()),
    format!("{:<10} {}", "Locations:".bold(), locations),
    format!("{:<10} {}", "Product:".bold(), analysis.product.as_deref().unwrap_or("-")),
    format!("{:<10} {}", "Period:".bold(), describe_period_hint(analysis.period_hint)),
    format!("{:<10} {}", "Rows:".bold(), rows.to_string().yellow()),
  ]
}

pub fn summary_lines(summary: &DatasetSummary) -> Vec<String> {
  let mut lines = vec![
    format!("{} {}", "Products:".bold(), summary.products.join(", ")),
    format!("{} {}", "Locations:".bold(), summary.locations.len()),
  ];

  if let (Some(first), Some(last)) = (summary.periods.first(), summary.periods.last()) {
    lines.push(format!(
      "{} {} to {} ({} months)",
      "Months:".bold(),
      first,
      last,
      summary.periods.len()
    ));
  }

  match summary.date_range {
    Some((start, end)) => lines.push(format!(
      "{} {} to {} ({} predictions)",
      "Daily:".bold(),
      start,
      end,
      summary.total_predictions
    )),
    None => lines.push(format!("{} none", "Daily:".bold())),
  }

  lines.push(format!("{}", "Total demand:".bold()));
  for (product, total) in &summary.total_demand {
    lines.push(format!("  {product}: {}", group_thousands(*total).green()));
  }
  lines
}

pub fn ranking_table(totals: &[LocationTotal]) -> String {
  let header = vec!["Rank".to_string(), "City_State".to_string(), "Total".to_string()];
  let rows: Vec<Vec<String>> = totals
    .iter()
    .enumerate()
    .map(|(i, t)| vec![(i + 1).to_string(), t.location.clone(), group_thousands(t.total)])
    .collect();
  render_table(&header, &rows)
}

pub fn trend_table(totals: &[PeriodTotal]) -> String {
  let header = vec!["Month".to_string(), "Total".to_string()];
  let rows: Vec<Vec<String>> =
    totals.iter().map(|t| vec![t.period.to_string(), group_thousands(t.total)]).collect();
  render_table(&header, &rows)
}
