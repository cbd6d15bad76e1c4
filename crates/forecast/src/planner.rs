//! Query planning
//!
//! Turns a question into the slice of forecast data that answers it:
//! classify, extract entities, then dispatch to one aggregation per intent.

use serde::Serialize;

use crate::aggregate::{compare_locations, filter_by_locations, filter_by_product, top_n};
use crate::dataset::{Dataset, MonthlyRecord};
use crate::extract::{EntityExtractor, QueryAnalysis};
use crate::growth::{growth, GrowthTable};
use crate::intent::{Intent, IntentClassifier};

pub const DEFAULT_TOP_N: usize = 10;

/// Rows selected for a question, in one of the two table shapes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", content = "rows", rename_all = "snake_case")]
pub enum DataSlice {
  Monthly(Vec<MonthlyRecord>),
  Growth(GrowthTable),
}

impl DataSlice {
  pub fn len(&self) -> usize {
    match self {
      DataSlice::Monthly(rows) => rows.len(),
      DataSlice::Growth(table) => table.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Conditions worth telling the user about. None of them is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanWarning {
  /// Nothing matched the extracted filters
  EmptyResult,
  /// A comparison named fewer than two locations and was answered as a
  /// general question
  ComparisonFallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedQuery {
  pub analysis: QueryAnalysis,
  pub slice: DataSlice,
  pub warnings: Vec<PlanWarning>,
}

pub struct QueryPlanner<'a> {
  dataset: &'a Dataset,
  classifier: IntentClassifier,
  extractor: EntityExtractor,
  top_n: usize,
}

impl<'a> QueryPlanner<'a> {
  pub fn new(dataset: &'a Dataset) -> Self {
    Self {
      dataset,
      classifier: IntentClassifier::new(),
      extractor: EntityExtractor::new().with_known_locations(dataset.locations()),
      top_n: DEFAULT_TOP_N,
    }
  }

  /// How many locations a top-locations question keeps
  pub fn with_top_n(mut self, top_n: usize) -> Self {
    self.top_n = top_n;
    self
  }

  pub fn analyze(&self, text: &str) -> QueryAnalysis {
    self.extractor.analyze(&self.classifier, text)
  }

  pub fn plan(&self, text: &str) -> DataSlice {
    self.resolve(text).slice
  }

  pub fn resolve(&self, text: &str) -> PlannedQuery {
    let analysis = self.analyze(text);
    let mut warnings = Vec::new();

    let slice = match analysis.intent {
      Intent::Comparison if analysis.locations.len() >= 2 => DataSlice::Monthly(compare_locations(
        self.dataset.monthly(),
        &analysis.locations[0],
        &analysis.locations[1],
        analysis.product.as_deref(),
      )),
      Intent::Comparison => {
        tracing::warn!(
          locations = analysis.locations.len(),
          "comparison needs two locations, answering as a general question"
        );
        warnings.push(PlanWarning::ComparisonFallback);
        self.general(&analysis)
      }
      Intent::Growth => self.growth(&analysis),
      Intent::TopLocations => self.top_locations(&analysis),
      Intent::StockIncrease => self.stock_increase(&analysis),
      Intent::General => self.general(&analysis),
    };

    if slice.is_empty() {
      warnings.push(PlanWarning::EmptyResult);
    }

    tracing::debug!(intent = %analysis.intent, rows = slice.len(), "planned question");
    PlannedQuery { analysis, slice, warnings }
  }

  fn growth(&self, analysis: &QueryAnalysis) -> DataSlice {
    let table = growth(self.dataset.monthly(), analysis.product.as_deref());
    if analysis.locations.is_empty() {
      DataSlice::Growth(table)
    } else {
      DataSlice::Growth(table.restrict_to_locations(&analysis.locations))
    }
  }

  /// The product's monthly rows for its top locations, not the ranking itself
  fn top_locations(&self, analysis: &QueryAnalysis) -> DataSlice {
    let Some(product) = analysis.product.as_deref() else {
      return DataSlice::Monthly(self.dataset.monthly().to_vec());
    };

    let leaders: Vec<String> =
      top_n(self.dataset.monthly(), product, self.top_n).into_iter().map(|t| t.location).collect();
    let rows = filter_by_product(self.dataset.monthly(), product);
    DataSlice::Monthly(filter_by_locations(&rows, &leaders))
  }

  fn stock_increase(&self, analysis: &QueryAnalysis) -> DataSlice {
    let rows = match analysis.product.as_deref() {
      Some(product) => filter_by_product(self.dataset.monthly(), product),
      None => self.dataset.monthly().to_vec(),
    };
    DataSlice::Monthly(self.narrow_to_locations(rows, analysis))
  }

  fn general(&self, analysis: &QueryAnalysis) -> DataSlice {
    let mut rows = self.dataset.monthly().to_vec();
    if let Some(product) = analysis.product.as_deref() {
      rows = filter_by_product(&rows, product);
    }
    DataSlice::Monthly(self.narrow_to_locations(rows, analysis))
  }

  fn narrow_to_locations(
    &self,
    rows: Vec<MonthlyRecord>,
    analysis: &QueryAnalysis,
  ) -> Vec<MonthlyRecord> {
    if analysis.locations.is_empty() {
      rows
    } else {
      filter_by_locations(&rows, &analysis.locations)
    }
  }
}
