//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{Activity, ResolvedQuestion};
use crate::engine::Submission;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
  Ping,
  NewQuestion {
    #[serde(default)]
    activity: Option<Activity>,
  },
  SubmitAnswer {
    #[serde(rename = "questionId")]
    question_id: String,
    answer: AnswerPayload,
  },
  Hint {
    #[serde(rename = "questionId")]
    question_id: String,
  },
  Normalize {
    code: String,
  },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
  Pong,
  Question {
    question: QuestionOut,
  },
  AnswerResult {
    correct: bool,
    expected: String,
    explanation: String,
    captures: Vec<String>,
  },
  Hint {
    text: String,
  },
  Normalized {
    code: String,
    normalized: String,
  },
  Error {
    message: String,
  },
}

/// A submitted answer. `line` is the 0-based index of the line the user picked.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnswerPayload {
  Text { text: String },
  Lines { lines: Vec<String> },
  Line { line: usize },
}

impl From<AnswerPayload> for Submission {
  fn from(p: AnswerPayload) -> Self {
    match p {
      AnswerPayload::Text { text } => Submission::Text(text),
      AnswerPayload::Lines { lines } => Submission::Lines(lines),
      AnswerPayload::Line { line } => Submission::Line(line),
    }
  }
}

/// DTO used by both WS and HTTP for question delivery. Never carries the expected answer.
#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionOut {
  pub id: String,
  #[serde(rename = "questionId")]
  pub question_id: String,
  pub activity: Activity,
  pub tags: Vec<String>,
  pub prompt: String,
  pub code: String,
  pub options: Vec<String>,
}

/// Convert a full `ResolvedQuestion` (internal) to the public DTO.
pub fn to_out(q: &ResolvedQuestion) -> QuestionOut {
  QuestionOut {
    id: q.id.clone(),
    question_id: q.question_id.clone(),
    activity: q.activity,
    tags: q.tags.clone(),
    prompt: q.prompt.clone(),
    code: q.code.clone(),
    options: q.options.clone(),
  }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct QuestionQuery {
  pub activity: Option<Activity>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerIn {
  #[serde(rename = "questionId")]
  pub question_id: String,
  pub answer: AnswerPayload,
}
#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerOut {
  pub correct: bool,
  pub expected: String,
  pub explanation: String,
  pub captures: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct HintQuery {
  #[serde(rename = "questionId")]
  pub question_id: String,
}
#[derive(Serialize)]
pub struct HintOut {
  pub text: String,
}

#[derive(Deserialize)]
pub struct NormalizeIn {
  pub code: String,
}
#[derive(Serialize)]
pub struct NormalizeOut {
  pub normalized: String,
}

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
}

#[derive(Serialize)]
pub struct ErrorOut {
  pub message: String,
}
