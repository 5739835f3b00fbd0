//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and log include parameters and basic result info.

use std::sync::Arc;
use axum::{extract::{State, Query}, http::StatusCode, Json, response::{IntoResponse, Response}};
use tracing::{info, warn, instrument};

use crate::protocol::*;
use crate::state::AppState;
use crate::logic::*;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state), fields(activity = ?q.activity))]
pub async fn http_get_question(
  State(state): State<Arc<AppState>>,
  Query(q): Query<QuestionQuery>,
) -> Response {
  match state.choose_question(q.activity).await {
    Some(question) => {
      info!(target: "question", id = %question.id, question = %question.question_id, "HTTP question served");
      Json(to_out(&question)).into_response()
    }
    None => {
      let wanted = q.activity.map(|a| a.to_string()).unwrap_or_else(|| "any".into());
      warn!(target: "question", activity = %wanted, "HTTP question unavailable");
      let message = format!("No question available for activity {wanted}");
      (StatusCode::SERVICE_UNAVAILABLE, Json(ErrorOut { message })).into_response()
    }
  }
}

#[instrument(level = "info", skip(state, body), fields(%body.question_id))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AnswerIn>,
) -> impl IntoResponse {
  let verdict = evaluate_answer(&state, &body.question_id, body.answer.into()).await;
  info!(target: "question", id = %body.question_id, correct = verdict.correct, "HTTP submit_answer evaluated");
  Json(AnswerOut {
    correct: verdict.correct,
    expected: verdict.expected,
    explanation: verdict.explanation,
    captures: verdict.captures,
  })
}

#[instrument(level = "info", skip(state), fields(%q.question_id))]
pub async fn http_get_hint(
  State(state): State<Arc<AppState>>,
  Query(q): Query<HintQuery>,
) -> impl IntoResponse {
  let text = get_hint_text(&state, &q.question_id).await;
  info!(target: "question", id = %q.question_id, "HTTP hint served");
  Json(HintOut { text })
}

#[instrument(level = "info", skip(body), fields(code_len = body.code.len()))]
pub async fn http_post_normalize(Json(body): Json<NormalizeIn>) -> impl IntoResponse {
  let normalized = do_normalize(&body.code);
  Json(NormalizeOut { normalized })
}
