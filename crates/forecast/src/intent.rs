//! Intent classification
//!
//! A question is matched against an ordered decision table of keyword
//! patterns. The order is part of the contract: comparison is checked before
//! growth, growth before top locations, top locations before stock increase,
//! and the first hit wins. Anything unmatched is a general question.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
  Comparison,
  Growth,
  TopLocations,
  StockIncrease,
  General,
}

impl Intent {
  pub fn as_str(&self) -> &'static str {
    match self {
      Intent::Comparison => "comparison",
      Intent::Growth => "growth",
      Intent::TopLocations => "top_locations",
      Intent::StockIncrease => "stock_increase",
      Intent::General => "general",
    }
  }
}

impl fmt::Display for Intent {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// Keywords are word-start anchored so that e.g. "laptop" does not read as
// "top" and "center" does not read as "entre". French stems cover the
// questions the forecasting team asks in French.
const COMPARISON_PATTERN: &str = r"\b(compar|versus|vs\b|différence|difference|entre\b|between)";
const GROWTH_PATTERN: &str = r"\b(progress|croissance|évolu|evolu|augment|tendance|trend|grow)";
const TOP_LOCATIONS_PATTERN: &str = r"\b(top\b|meilleur|best|plus fort|highest|classement|rank)";
const STOCK_INCREASE_PATTERN: &str =
  r"\b(augment|stock|restock|approvision|commander|order|livr|deliver|increase|replenish)";

/// Ordered (intent, pattern) table evaluated first-match-wins
pub struct IntentClassifier {
  rules: Vec<(Intent, Regex)>,
}

impl Default for IntentClassifier {
  fn default() -> Self {
    Self::new()
  }
}

impl IntentClassifier {
  pub fn new() -> Self {
    let rules = [
      (Intent::Comparison, COMPARISON_PATTERN),
      (Intent::Growth, GROWTH_PATTERN),
      (Intent::TopLocations, TOP_LOCATIONS_PATTERN),
      (Intent::StockIncrease, STOCK_INCREASE_PATTERN),
    ]
    .into_iter()
    .map(|(intent, pattern)| (intent, Regex::new(pattern).expect("intent patterns are valid")))
    .collect();

    Self { rules }
  }

  /// Precedence of the table, highest first
  pub fn precedence(&self) -> Vec<Intent> {
    self.rules.iter().map(|(intent, _)| *intent).collect()
  }

  pub fn classify(&self, text: &str) -> Intent {
    let lowered = text.to_lowercase();
    let intent = self
      .rules
      .iter()
      .find(|(_, pattern)| pattern.is_match(&lowered))
      .map(|(intent, _)| *intent)
      .unwrap_or(Intent::General);

    tracing::debug!(%intent, "classified question");
    intent
  }
}
