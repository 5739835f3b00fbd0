//! Loading an optional question bank from TOML.
//!
//! Schema (all sections optional):
//!
//! ```toml
//! [ranges]
//! small = [1, 10]
//!
//! [[names.integer]]
//! name = "lives"
//!
//! [[names.string]]
//! name = "hometown"
//! values = ["Paris", "Tokyo"]
//!
//! [[questions]]
//! id = "compare"
//! activity = "predict_output"
//! code = "let <#int#> = <#small#>\nprint(<#name:1#> > 5)"
//!
//! [[questions.answers]]
//! text = "true"
//! conditions = [{ left = "<#value:1#>", check = ">", right = "5" }]
//!
//! [[questions.answers]]
//! text = "false"
//! ```

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::{NamePools, NumberRanges, QuestionDef};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct BankConfig {
  #[serde(default)]
  pub questions: Vec<QuestionDef>,
  /// Replaces the built-in pools when present.
  #[serde(default)]
  pub names: Option<NamePools>,
  #[serde(default)]
  pub ranges: Option<NumberRanges>,
}

pub fn parse_bank_config(s: &str) -> Result<BankConfig, toml::de::Error> {
  toml::from_str::<BankConfig>(s)
}

/// Attempt to load `BankConfig` from QUESTION_BANK_PATH. On any parsing/IO error, returns None.
pub fn load_bank_config_from_env() -> Option<BankConfig> {
  let path = std::env::var("QUESTION_BANK_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_bank_config(&s) {
      Ok(cfg) => {
        info!(target: "codedrill_backend", %path, questions = cfg.questions.len(), "Loaded question bank (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "codedrill_backend", %path, error = %e, "Failed to parse question bank");
        None
      }
    },
    Err(e) => {
      error!(target: "codedrill_backend", %path, error = %e, "Failed to read question bank file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Activity;

  #[test]
  fn parses_questions_pools_and_ranges() {
    let cfg = parse_bank_config(
      r#"
[ranges]
small = [1, 10]

[[names.string]]
name = "hometown"
values = ["Paris", "Tokyo"]

[[questions]]
id = "compare"
activity = "predict_output"
tags = ["comparison"]
code = "let <#int#> = <#small#>"

[[questions.answers]]
text = "true"
conditions = [{ left = "<#value:1#>", check = ">", right = "5" }]

[[questions.answers]]
text = "false"

[[questions]]
id = "select"
activity = "multiple_selection"
answers = [{ text = "1", correct = true }, { text = "\"1\"" }]
"#,
    )
    .unwrap();

    let ranges = cfg.ranges.unwrap();
    assert_eq!(ranges.small, (1, 10));
    assert_eq!(ranges.tiny, (1, 5));

    let names = cfg.names.unwrap();
    assert_eq!(names.string[0].values, vec!["Paris", "Tokyo"]);
    assert!(names.integer.is_empty());

    assert_eq!(cfg.questions.len(), 2);
    let compare = &cfg.questions[0];
    assert_eq!(compare.activity, Activity::PredictOutput);
    assert_eq!(compare.answers[0].conditions[0].check, ">");
    assert!(compare.answers[1].conditions.is_empty());
    assert!(cfg.questions[1].answers[0].correct);
    assert!(!cfg.questions[1].answers[1].correct);
  }

  #[test]
  fn empty_file_is_an_empty_bank() {
    let cfg = parse_bank_config("").unwrap();
    assert!(cfg.questions.is_empty() && cfg.names.is_none() && cfg.ranges.is_none());
  }

  #[test]
  fn unknown_activity_is_rejected() {
    assert!(parse_bank_config("[[questions]]\nid = \"x\"\nactivity = \"essay\"\n").is_err());
  }
}
