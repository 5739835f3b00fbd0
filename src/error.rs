//! Content-authoring failures.
//!
//! Everything in here means the static question data (or the engine's own
//! pattern pipeline) is broken. A wrong user answer is never an error: it is a
//! plain `false` verdict returned by the checking functions.

use thiserror::Error;

use crate::defect::DefectKind;

#[derive(Debug, Error)]
pub enum ContentError {
  #[error("back-reference <#{kind}:{index}#> is out of range (context has {available})")]
  UnknownBackReference { kind: &'static str, index: usize, available: usize },

  #[error("name pool for {kind} variables is exhausted")]
  NamePoolExhausted { kind: &'static str },

  #[error("unknown filter '{0}'")]
  UnknownFilter(String),

  #[error("unknown comparison operator '{0}'")]
  UnknownOperator(String),

  #[error("arithmetic placeholder '{expr}' failed: {reason}")]
  Arithmetic { expr: String, reason: String },

  #[error("unresolved placeholder '{0}' left in template")]
  UnresolvedPlaceholder(String),

  #[error("no candidate answer matches the generated values")]
  NoMatchingAnswer,

  #[error("question has no answers")]
  MissingAnswers,

  #[error("reference answer is empty")]
  EmptyReferenceAnswer,

  #[error("reference answer produced an invalid pattern: {reference}")]
  InvalidPattern {
    reference: String,
    #[source]
    source: regex::Error,
  },

  #[error("no defect category applies to the sample code")]
  NoApplicableDefect,

  #[error("defect '{0}' does not apply to the sample code")]
  DefectNotApplicable(DefectKind),

  #[error("defect '{0}' left the code unchanged")]
  UndetectableDefect(DefectKind),
}
