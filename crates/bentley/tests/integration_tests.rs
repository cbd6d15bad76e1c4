use bentley::*;

#[test]
fn test_basic_logging_functions() {
  info("Test info message");
  warn("Test warning message");
  error("Test error message");
  debug("Test debug message");
  success("Test success message");
  verbose("Test verbose message");
}

#[test]
fn test_multiline_messages() {
  let multiline_msg = "First line\nSecond line\nThird line";
  info(multiline_msg);
  warn(multiline_msg);
  event(Level::Info, multiline_msg);
}

#[test]
fn test_format_macros() {
  let rows = 42;
  bentley::info!("loaded {} rows", rows);
  bentley::warn!("{rows} rows matched nothing");
  bentley::announce!("Forecast v{}", "0.3.0");
}
