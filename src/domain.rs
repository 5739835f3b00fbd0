//! Domain models: static question definitions, name pools, and resolved question instances.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::defect::DefectRecord;

/// Which practice activity a question drives.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
  /// Read the code, pick what it prints. The answer depends on the generated values.
  #[default]
  PredictOutput,
  /// Write code from scratch; checked against structural reference answers.
  FreeCoding,
  /// One defect was injected; the user points at the broken line.
  SpotTheError,
  /// Lines are shuffled; the user restores their order.
  RearrangeLines,
  /// Pick every correct option.
  MultipleSelection,
}

impl Activity {
  pub const ALL: [Activity; 5] = [
    Activity::PredictOutput,
    Activity::FreeCoding,
    Activity::SpotTheError,
    Activity::RearrangeLines,
    Activity::MultipleSelection,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Activity::PredictOutput => "predict_output",
      Activity::FreeCoding => "free_coding",
      Activity::SpotTheError => "spot_the_error",
      Activity::RearrangeLines => "rearrange_lines",
      Activity::MultipleSelection => "multiple_selection",
    }
  }
}

impl fmt::Display for Activity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Inclusive ranges for the three random-literal magnitude classes.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NumberRanges {
  #[serde(default = "default_tiny")] pub tiny: (i64, i64),
  #[serde(default = "default_small")] pub small: (i64, i64),
  #[serde(default = "default_medium")] pub medium: (i64, i64),
}

fn default_tiny() -> (i64, i64) { (1, 5) }
fn default_small() -> (i64, i64) { (1, 20) }
fn default_medium() -> (i64, i64) { (20, 100) }

impl Default for NumberRanges {
  fn default() -> Self {
    Self { tiny: default_tiny(), small: default_small(), medium: default_medium() }
  }
}

/// One candidate answer of a question definition.
///
/// - `predict_output`: `conditions` select the answer for the generated values.
/// - `free_coding`: `text` is a reference solution.
/// - `multiple_selection`: `correct` flags the options to pick.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AnswerDef {
  pub text: String,
  #[serde(default)] pub conditions: Vec<Condition>,
  #[serde(default)] pub correct: bool,
}

impl AnswerDef {
  pub fn new(text: impl Into<String>) -> Self {
    Self { text: text.into(), ..Default::default() }
  }

  pub fn when(mut self, condition: Condition) -> Self {
    self.conditions.push(condition);
    self
  }

  pub fn correct(mut self) -> Self {
    self.correct = true;
    self
  }
}

/// Static question definition. Immutable after load.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct QuestionDef {
  pub id: String,
  #[serde(default)] pub activity: Activity,
  #[serde(default)] pub tags: Vec<String>,
  #[serde(default)] pub prompt: String,
  #[serde(default)] pub code: String,
  #[serde(default)] pub answers: Vec<AnswerDef>,
  #[serde(default)] pub hint: String,
  #[serde(default)] pub ranges: Option<NumberRanges>,
}

/// A variable name candidate. `natural` defaults to the identifier split into words.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NameEntry {
  pub name: String,
  #[serde(default)] pub natural: Option<String>,
  /// Sample values for string-typed names.
  #[serde(default)] pub values: Vec<String>,
}

impl NameEntry {
  pub fn natural_name(&self) -> String {
    self.natural
      .clone()
      .unwrap_or_else(|| crate::util::camel_to_words(&self.name))
  }
}

/// Name pools per variable type.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NamePools {
  #[serde(default)] pub integer: Vec<NameEntry>,
  #[serde(default)] pub string: Vec<NameEntry>,
  #[serde(default)] pub boolean: Vec<NameEntry>,
}

/// How submitted lines are compared with the expected ones.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LineOrder {
  Sequence,
  Set,
}

/// What a correct submission looks like for one instance.
#[derive(Clone, Debug)]
pub enum Expected {
  Output { answer: String },
  /// Resolved reference answers as written; any one of them may match.
  Freeform { references: Vec<String> },
  Defect { record: DefectRecord },
  Lines { lines: Vec<String>, order: LineOrder },
}

impl Expected {
  /// Text shown to the user once the question has been answered.
  pub fn display(&self) -> String {
    match self {
      Expected::Output { answer } => answer.clone(),
      Expected::Freeform { references } => references.first().cloned().unwrap_or_default(),
      Expected::Defect { record } => format!("line {} ({})", record.line + 1, record.kind),
      Expected::Lines { lines, .. } => lines.join("\n"),
    }
  }
}

/// A freshly generated question. Lives in memory until the activity ends.
#[derive(Clone, Debug)]
pub struct ResolvedQuestion {
  pub id: String,
  pub question_id: String,
  pub activity: Activity,
  pub tags: Vec<String>,
  pub prompt: String,
  pub code: String,
  pub hint: String,
  pub options: Vec<String>,
  pub expected: Expected,
}
