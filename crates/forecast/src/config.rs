//! Configuration management for forecast
//!
//! Every field has a default, so a missing file, an empty file and a partial
//! file all load. Values that would break a later stage (an unparsable API
//! base, a context template without its placeholder) are rejected up front.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::{ConfigError, Result};

/// Placeholder the context template must contain
pub const CONTEXT_PLACEHOLDER: &str = "{context}";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub data: DataConfig,
  #[serde(default)]
  pub context: ContextConfig,
  #[serde(default)]
  pub planner: PlannerConfig,
  #[serde(default)]
  pub llm: LlmConfig,
  #[serde(default)]
  pub prompts: PromptConfig,
}

/// Where the forecast CSV files live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
  #[serde(default = "default_monthly_path")]
  pub monthly: PathBuf,
  #[serde(default = "default_daily_path")]
  pub daily: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextConfig {
  /// Rows passed to the assistant before sampling kicks in
  #[serde(default = "default_row_cap")]
  pub row_cap: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
  /// Locations kept by a top-locations question
  #[serde(default = "default_top_n")]
  pub top_n: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
  #[serde(default = "default_model")]
  pub model: String,
  #[serde(default = "default_temperature")]
  pub temperature: f32,
  #[serde(default = "default_max_tokens")]
  pub max_tokens: u32,
  /// Base URL of an OpenAI-compatible API
  #[serde(default = "default_api_base")]
  pub api_base: String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
  /// Messages of conversation history kept between questions
  #[serde(default = "default_history_window")]
  pub history_window: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptConfig {
  #[serde(default = "default_system_prompt")]
  pub system: String,
  #[serde(default = "default_context_template")]
  pub context_template: String,
}

fn default_monthly_path() -> PathBuf {
  PathBuf::from("data/monthly_predictions.csv")
}
fn default_daily_path() -> PathBuf {
  PathBuf::from("data/daily_predictions.csv")
}
fn default_row_cap() -> usize {
  crate::summarize::DEFAULT_ROW_CAP
}
fn default_top_n() -> usize {
  crate::planner::DEFAULT_TOP_N
}
fn default_model() -> String {
  "gpt-4o-mini".to_string()
}
fn default_temperature() -> f32 {
  0.3
}
fn default_max_tokens() -> u32 {
  1000
}
fn default_api_base() -> String {
  "https://api.openai.com/v1".to_string()
}
fn default_timeout_secs() -> u64 {
  60
}
fn default_history_window() -> usize {
  10
}
fn default_system_prompt() -> String {
  "You are a supply planning assistant. You answer questions about forecast product demand \
   per city and month, using only the data you are given. Quote figures from the data, say \
   when the data does not answer the question, and keep recommendations concrete."
    .to_string()
}
fn default_context_template() -> String {
  "Here is the forecast data relevant to the question:\n\n{context}\n\nBase your answer on this data."
    .to_string()
}

impl Default for DataConfig {
  fn default() -> Self {
    Self { monthly: default_monthly_path(), daily: default_daily_path() }
  }
}

impl Default for ContextConfig {
  fn default() -> Self {
    Self { row_cap: default_row_cap() }
  }
}

impl Default for PlannerConfig {
  fn default() -> Self {
    Self { top_n: default_top_n() }
  }
}

impl Default for LlmConfig {
  fn default() -> Self {
    Self {
      model: default_model(),
      temperature: default_temperature(),
      max_tokens: default_max_tokens(),
      api_base: default_api_base(),
      timeout_secs: default_timeout_secs(),
      history_window: default_history_window(),
    }
  }
}

impl Default for PromptConfig {
  fn default() -> Self {
    Self { system: default_system_prompt(), context_template: default_context_template() }
  }
}

impl PromptConfig {
  /// Fill the context template with a rendered payload
  pub fn context_message(&self, context: &str) -> String {
    self.context_template.replace(CONTEXT_PLACEHOLDER, context)
  }
}

impl Config {
  /// Load and validate configuration from a YAML file
  pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
      .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;

    // An empty file deserializes to unit, not to an empty mapping
    let config: Config = if content.trim().is_empty() {
      Config::default()
    } else {
      serde_yaml::from_str(&content)
        .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?
    };

    config.validate()?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
  }

  /// Load the first config file found, or defaults
  pub fn load() -> Result<Self> {
    for path in Self::search_paths() {
      if path.exists() {
        return Self::load_from_file(&path);
      }
    }

    Ok(Config::default())
  }

  /// Candidate locations in lookup order
  pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("forecast.yaml"), PathBuf::from(".forecast.yaml")];
    if let Some(config_dir) = dirs::config_dir() {
      paths.push(config_dir.join("forecast").join("config.yaml"));
    }
    paths
  }

  pub fn validate(&self) -> Result<()> {
    if self.context.row_cap == 0 {
      return Err(ConfigError::invalid("context.row_cap", "must be at least 1").into());
    }

    if self.planner.top_n == 0 {
      return Err(ConfigError::invalid("planner.top_n", "must be at least 1").into());
    }

    if !(0.0..=2.0).contains(&self.llm.temperature) {
      return Err(ConfigError::invalid("llm.temperature", "must be between 0 and 2").into());
    }

    if let Err(e) = self.api_base_url() {
      return Err(ConfigError::invalid("llm.api_base", e.to_string()).into());
    }

    if !self.prompts.context_template.contains(CONTEXT_PLACEHOLDER) {
      return Err(
        ConfigError::invalid(
          "prompts.context_template",
          format!("must contain the {CONTEXT_PLACEHOLDER} placeholder"),
        )
        .into(),
      );
    }

    Ok(())
  }

  /// API base as a URL with a trailing slash, ready for `Url::join`
  pub fn api_base_url(&self) -> std::result::Result<Url, url::ParseError> {
    let base = self.llm.api_base.trim_end_matches('/');
    Url::parse(&format!("{base}/"))
  }
}
