//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! - LOG_LEVEL: filter directives; falls back to [`DEFAULT_FILTER`] when unset or invalid.
//! - LOG_FORMAT: "json" for structured logs, anything else for the pretty format.
//!
//! Targets: `codedrill_backend` for server lifecycle, `question` for
//! generation and answer checking.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info,question=debug,codedrill_backend=debug,tower_http=info,axum=info";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

impl LogFormat {
  pub fn from_env_value(value: Option<&str>) -> Self {
    match value.map(str::trim) {
      Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
      _ => LogFormat::Pretty,
    }
  }
}

/// Install the global subscriber. A second call (tests, embedding) is a no-op.
pub fn init_tracing() {
  let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
  let format = LogFormat::from_env_value(std::env::var("LOG_FORMAT").ok().as_deref());

  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(true)
    .with_file(true)
    .with_line_number(true);

  // json() changes the builder type, so each arm initializes on its own.
  let installed = match format {
    LogFormat::Json => builder.json().try_init(),
    LogFormat::Pretty => builder.try_init(),
  };
  if installed.is_err() {
    tracing::debug!(target: "codedrill_backend", "Tracing subscriber already installed");
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn format_defaults_to_pretty() {
    assert_eq!(LogFormat::from_env_value(None), LogFormat::Pretty);
    assert_eq!(LogFormat::from_env_value(Some("pretty")), LogFormat::Pretty);
    assert_eq!(LogFormat::from_env_value(Some("yaml")), LogFormat::Pretty);
    assert_eq!(LogFormat::from_env_value(Some(" JSON ")), LogFormat::Json);
  }

  #[test]
  fn repeated_init_does_not_panic() {
    init_tracing();
    init_tracing();
  }
}
