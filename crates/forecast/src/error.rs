//! Error types for the forecast crate
//!
//! Only ingestion, configuration and the assistant call can fail. Filtering,
//! extraction and classification are total: "nothing matched" is an empty
//! result, never an error.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
  #[error("Failed to read {source_name}: {message}")]
  Unreadable { source_name: String, message: String },

  #[error("{source_name} is missing required column '{column}'")]
  MissingColumn { source_name: String, column: String },

  #[error("{source_name}, line {line}: {message}")]
  MalformedRecord { source_name: String, line: u64, message: String },

  #[error("Duplicate forecast for {product} / {location} / {period}")]
  DuplicateRecord { product: String, location: String, period: String },
}

impl IngestionError {
  pub fn unreadable(source_name: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Unreadable { source_name: source_name.into(), message: message.into() }
  }

  pub fn missing_column(source_name: impl Into<String>, column: impl Into<String>) -> Self {
    Self::MissingColumn { source_name: source_name.into(), column: column.into() }
  }

  pub fn malformed(source_name: impl Into<String>, line: u64, message: impl Into<String>) -> Self {
    Self::MalformedRecord { source_name: source_name.into(), line, message: message.into() }
  }
}

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("Failed to read config {}: {source}", .path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to parse config {}: {source}", .path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("Invalid config value for {field}: {message}")]
  Invalid { field: String, message: String },
}

impl ConfigError {
  pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Invalid { field: field.into(), message: message.into() }
  }
}

#[derive(Error, Debug)]
pub enum AssistantError {
  #[error("No API key configured (set OPENAI_API_KEY or pass --api-key)")]
  MissingApiKey,

  #[error("Assistant request failed: {message}")]
  RequestFailed { message: String },

  #[error("Assistant returned HTTP {status}: {body}")]
  Http { status: u16, body: String },

  #[error("Assistant response had no content")]
  EmptyResponse,
}

impl AssistantError {
  pub fn request_failed(message: impl Into<String>) -> Self {
    Self::RequestFailed { message: message.into() }
  }
}

#[derive(Error, Debug)]
pub enum ForecastError {
  #[error(transparent)]
  Ingestion(#[from] IngestionError),

  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Assistant(#[from] AssistantError),
}

pub type Result<T> = std::result::Result<T, ForecastError>;
