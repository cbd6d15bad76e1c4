// violet ignore chunk
//! ## Features
//!
//! - Leveled logging (verbose, debug, info, warn, error, success)
//! - Multi-line message support with consistent prefixes
//! - Timestamped event lines for long-running interactive sessions
//! - Banner displays (announce) for section headers
//! - All output to stderr, so stdout stays clean for command results
//!
//! ## Usage
//!
//! Functions: `info()`, `warn()`, `error()`, `debug()`, `success()`, `verbose()`
//!
//! Macros take `format!` arguments: `bentley::info!("loaded {} rows", n)`

use chrono::Local;
use colored::*;

/// Severity attached to every line bentley prints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
  Verbose,
  Debug,
  Info,
  Warn,
  Error,
  Success,
}

impl Level {
  pub fn tag(self) -> &'static str {
    match self {
      Level::Verbose => "verb",
      Level::Debug => "debug",
      Level::Info => "info",
      Level::Warn => "warn",
      Level::Error => "error",
      Level::Success => "sccs",
    }
  }

  fn color(self) -> Color {
    match self {
      Level::Verbose => Color::Cyan,
      Level::Debug => Color::Magenta,
      Level::Info => Color::Blue,
      Level::Warn => Color::Yellow,
      Level::Error => Color::Red,
      Level::Success => Color::Green,
    }
  }
}

/// Write each line of a message to stderr as-is
pub fn log(message: &str) {
  for line in message.lines() {
    eprintln!("{line}");
  }
}

/// Pad tags to a common width so message bodies line up
fn format_prefix(level: Level) -> String {
  let tag = level.tag();
  format!("[{}]{:<width$}", tag.color(level.color()).bold(), "", width = 7 - tag.len() - 2)
}

/// Prefix every line of a message with its level tag
pub fn format_lines(level: Level, message: &str) -> Vec<String> {
  let prefix = format_prefix(level);
  message.lines().map(|line| format!("{prefix} {line}")).collect()
}

pub fn emit(level: Level, message: &str) {
  for line in format_lines(level, message) {
    log(&line);
  }
}

pub fn verbose(message: &str) {
  emit(Level::Verbose, message);
}

/// Detailed diagnostic information
pub fn debug(message: &str) {
  emit(Level::Debug, message);
}

/// General information
pub fn info(message: &str) {
  emit(Level::Info, message);
}

/// Something needs attention but the command can carry on
pub fn warn(message: &str) {
  emit(Level::Warn, message);
}

/// Something went wrong
pub fn error(message: &str) {
  emit(Level::Error, message);
}

/// Something completed successfully
pub fn success(message: &str) {
  emit(Level::Success, message);
}

/// Timestamped line, used by interactive sessions to mark each exchange
pub fn event(level: Level, message: &str) {
  let timestamp = Local::now().format("%H:%M:%S").to_string();
  let prefix = format!("[{}] [{}]", "event".color(level.color()).bold(), timestamp.cyan());
  for line in message.lines() {
    log(&format!("{prefix} {line}"));
  }
}

/// Create a banner line of the specified length and character
pub fn banner_line(length: usize, char: char) -> String {
  char.to_string().repeat(length)
}

/// Lines of a banner: border, message, border
pub fn banner(message: &str, width: usize, border_char: char) -> Vec<String> {
  let border = banner_line(width, border_char);
  let mut lines = vec![border.clone()];
  lines.extend(message.lines().map(str::to_string));
  lines.push(border);
  lines
}

/// Section header for important but not critical messages
pub fn announce(message: &str) {
  for line in banner(message, 50, '-') {
    log(&line.blue().bold().to_string());
  }
}

/// Macros for coverage-excluded logging - these expand with LCOV_EXCL_LINE at call sites
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => {
    $crate::info(&format!($($arg)*)) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! warn {
  ($($arg:tt)*) => {
    $crate::warn(&format!($($arg)*)) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => {
    $crate::error(&format!($($arg)*)) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! debug {
  ($($arg:tt)*) => {
    $crate::debug(&format!($($arg)*)) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! verbose {
  ($($arg:tt)*) => {
    $crate::verbose(&format!($($arg)*)) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => {
    $crate::success(&format!($($arg)*)) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! announce {
  ($($arg:tt)*) => {
    $crate::announce(&format!($($arg)*)) // LCOV_EXCL_LINE
  };
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_prefixes_line_up() {
    colored::control::set_override(false);
    let info_lines = format_lines(Level::Info, "loaded");
    let error_lines = format_lines(Level::Error, "failed");
    assert_eq!(info_lines, vec!["[info]  loaded".to_string()]);
    assert_eq!(error_lines, vec!["[error] failed".to_string()]);
  }

  #[test]
  fn test_every_line_is_prefixed() {
    colored::control::set_override(false);
    let lines = format_lines(Level::Success, "one\ntwo");
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|l| l.starts_with("[sccs]")));
  }

  #[test]
  fn test_banner_wraps_message() {
    let lines = banner("Forecast", 10, '=');
    assert_eq!(lines, vec!["==========", "Forecast", "=========="]);
  }
}
