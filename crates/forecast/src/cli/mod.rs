//! Command-line front end

pub mod commands;
pub mod display;

use clap::ValueEnum;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
  Pretty,
  Json,
}

/// Options shared by every subcommand
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
  pub config: Option<PathBuf>,
  pub monthly: Option<PathBuf>,
  pub daily: Option<PathBuf>,
}
