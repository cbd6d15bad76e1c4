//! Entity extraction
//!
//! Pulls locations, a product and an optional period hint out of free text
//! using a fixed vocabulary. Every function here is total: no match means an
//! empty list or `None`.

use regex::Regex;
use serde::Serialize;

use crate::intent::{Intent, IntentClassifier};
use crate::period::Period;

/// Lower-case alias -> canonical `City_State` value
const LOCATION_ALIASES: &[(&str, &str)] = &[
  ("dallas", "Dallas (TX)"),
  ("houston", "Houston (TX)"),
  ("austin", "Austin (TX)"),
  ("san francisco", "San Francisco (CA)"),
  ("los angeles", "Los Angeles (CA)"),
  ("new york", "New York City (NY)"),
  ("boston", "Boston (MA)"),
  ("seattle", "Seattle (WA)"),
  ("atlanta", "Atlanta (GA)"),
  ("portland", "Portland (ME)"),
  ("washington", "Washington DC"),
];

/// Product keyword groups in priority order
const PRODUCT_GROUPS: &[(&[&str], &str)] = &[
  (&["thinkpad", "laptop", "ordinateur"], "ThinkPad Laptop"),
  (&["batter", "pile", "aaa"], "AAA Batteries (4-pack)"),
];

/// Capitalised words that open a sentence rather than a city name
const LEADING_WORDS: &[&str] = &[
  "And", "Between", "Compare", "Comparer", "Comparez", "Demand", "Entre", "Et", "For", "Forecast",
  "How", "In", "Is", "Pour", "Quelle", "Quel", "Show", "Versus", "Vs", "What", "Which",
];

const LOCATION_PATTERN: &str = r"\b([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)\s*\(([A-Z]{2})\)";
const PERIOD_PATTERN: &str = r"\b(\d{4}-\d{1,2})\b";

/// English and French month names
const MONTH_NAMES: &[(&str, u32)] = &[
  ("january", 1),
  ("janvier", 1),
  ("february", 2),
  ("février", 2),
  ("march", 3),
  ("mars", 3),
  ("april", 4),
  ("avril", 4),
  ("may", 5),
  ("mai", 5),
  ("june", 6),
  ("juin", 6),
  ("july", 7),
  ("juillet", 7),
  ("august", 8),
  ("août", 8),
  ("september", 9),
  ("septembre", 9),
  ("october", 10),
  ("octobre", 10),
  ("november", 11),
  ("novembre", 11),
  ("december", 12),
  ("décembre", 12),
];

/// Time span a question refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodHint {
  /// An explicit `YYYY-MM` token
  Period(Period),
  /// A month name without a year
  Month(u32),
}

/// Everything extracted from one question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryAnalysis {
  pub intent: Intent,
  pub locations: Vec<String>,
  pub product: Option<String>,
  pub period_hint: Option<PeriodHint>,
  pub query: String,
}

pub struct EntityExtractor {
  location_pattern: Regex,
  period_pattern: Regex,
  month_patterns: Vec<(Regex, u32)>,
  known_locations: Vec<String>,
}

impl Default for EntityExtractor {
  fn default() -> Self {
    Self::new()
  }
}

impl EntityExtractor {
  pub fn new() -> Self {
    let month_patterns = MONTH_NAMES
      .iter()
      .map(|(name, month)| {
        let pattern = Regex::new(&format!(r"\b{name}\b")).expect("month patterns are valid");
        (pattern, *month)
      })
      .collect();

    Self {
      location_pattern: Regex::new(LOCATION_PATTERN).expect("location pattern is valid"),
      period_pattern: Regex::new(PERIOD_PATTERN).expect("period pattern is valid"),
      month_patterns,
      known_locations: Vec::new(),
    }
  }

  /// Locations present in the data. A `Name (XX)` hit whose trailing words
  /// name one of these resolves to it.
  pub fn with_known_locations<I, S>(mut self, locations: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.known_locations = locations.into_iter().map(Into::into).collect();
    self
  }

  /// Canonical locations mentioned in `text`, deduplicated.
  ///
  /// Alias hits come first, ordered by where they appear in the text; then
  /// `Name (XX)` pattern hits not already present. Leading words of a
  /// pattern hit are dropped when a shorter suffix is a known location or
  /// when they open the sentence ("Compare Miami (FL)" is "Miami (FL)").
  pub fn extract_locations(&self, text: &str) -> Vec<String> {
    let mut locations = alias_locations(text);
    for candidate in self.pattern_locations(text) {
      if !already_present(&locations, &candidate) {
        locations.push(candidate);
      }
    }
    locations
  }

  fn pattern_locations(&self, text: &str) -> Vec<String> {
    self
      .location_pattern
      .captures_iter(text)
      .map(|caps| {
        let words: Vec<&str> = caps[1].split_whitespace().collect();
        self.resolve_pattern_hit(&words, &caps[2])
      })
      .collect()
  }

  fn resolve_pattern_hit(&self, words: &[&str], state: &str) -> String {
    let name = |from: usize| format!("{} ({})", words[from..].join(" "), state);

    if let Some(known) =
      (0..words.len()).map(name).find(|candidate| self.known_locations.contains(candidate))
    {
      return known;
    }

    let start = words
      .iter()
      .take(words.len() - 1)
      .take_while(|word| LEADING_WORDS.contains(*word))
      .count();
    name(start)
  }

  /// First matching product group, in priority order
  pub fn extract_product(&self, text: &str) -> Option<String> {
    let lowered = text.to_lowercase();
    PRODUCT_GROUPS
      .iter()
      .find(|(keywords, _)| keywords.iter().any(|k| lowered.contains(k)))
      .map(|(_, product)| product.to_string())
  }

  /// An explicit `YYYY-MM` token wins over a month name
  pub fn extract_period_hint(&self, text: &str) -> Option<PeriodHint> {
    let explicit = self
      .period_pattern
      .captures_iter(text)
      .find_map(|caps| caps[1].parse::<Period>().ok())
      .map(PeriodHint::Period);
    if explicit.is_some() {
      return explicit;
    }

    let lowered = text.to_lowercase();
    self
      .month_patterns
      .iter()
      .filter_map(|(pattern, month)| pattern.find(&lowered).map(|m| (m.start(), *month)))
      .min_by_key(|(start, _)| *start)
      .map(|(_, month)| PeriodHint::Month(month))
  }

  pub fn analyze(&self, classifier: &IntentClassifier, text: &str) -> QueryAnalysis {
    QueryAnalysis {
      intent: classifier.classify(text),
      locations: self.extract_locations(text),
      product: self.extract_product(text),
      period_hint: self.extract_period_hint(text),
      query: text.to_string(),
    }
  }
}

fn alias_locations(text: &str) -> Vec<String> {
  let lowered = text.to_lowercase();
  let mut hits: Vec<(usize, &str)> = LOCATION_ALIASES
    .iter()
    .filter_map(|(alias, canonical)| lowered.find(alias).map(|pos| (pos, *canonical)))
    .collect();
  hits.sort_by_key(|(pos, _)| *pos);

  let mut locations: Vec<String> = Vec::new();
  for (_, canonical) in hits {
    if !locations.iter().any(|l| l == canonical) {
      locations.push(canonical.to_string());
    }
  }
  locations
}

/// A pattern hit counts as present when it, or its trailing words, already
/// name a found location: "Compare Austin (TX)" is "Austin (TX)".
fn already_present(found: &[String], candidate: &str) -> bool {
  found.iter().any(|location| candidate == location || candidate.ends_with(&format!(" {location}")))
}
