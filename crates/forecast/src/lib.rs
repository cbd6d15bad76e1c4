//! Forecast - question answering over demand forecasts
//!
//! Loads monthly and daily demand predictions from CSV, turns a free-text
//! question into the slice of data that answers it, and bounds that slice to
//! a context an LLM assistant can take as input.

pub mod aggregate;
pub mod assistant;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod extract;
pub mod growth;
pub mod ingest;
pub mod intent;
pub mod period;
pub mod planner;
pub mod summarize;

pub use config::Config;
pub use dataset::{DailyRecord, Dataset, DatasetLoader, MonthlyRecord, RecordFilter};
pub use error::{AssistantError, ConfigError, ForecastError, IngestionError, Result};
pub use extract::{EntityExtractor, PeriodHint, QueryAnalysis};
pub use growth::{Growth, GrowthColumn, GrowthRow, GrowthTable, UndefinedGrowth};
pub use intent::{Intent, IntentClassifier};
pub use period::Period;
pub use planner::{DataSlice, PlanWarning, PlannedQuery, QueryPlanner};
pub use summarize::{summarize, ContextPayload, Coverage};
