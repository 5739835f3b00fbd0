//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Evaluating answers against a generated instance
//!   - Serving the instance's resolved hint
//!   - Normalizing code for authors checking their reference answers

use tracing::{debug, error, info, instrument};

use crate::engine::{check_submission, Submission, Verdict};
use crate::normalizer::normalize;
use crate::state::AppState;
use crate::util::trunc_for_log;

/// Check a submission. The instance is consumed: one answer per generated question.
#[instrument(level = "info", skip(state, submission), fields(%question_id))]
pub async fn evaluate_answer(state: &AppState, question_id: &str, submission: Submission) -> Verdict {
  let Some(q) = state.take_instance(question_id).await else {
    return Verdict {
      correct: false,
      expected: String::new(),
      explanation: format!("Unknown questionId: {}", question_id),
      captures: vec![],
    };
  };

  match check_submission(&q.expected, &submission) {
    Ok(verdict) => {
      info!(target: "question", id = %q.id, question = %q.question_id, activity = %q.activity, correct = verdict.correct, "Answer evaluated");
      verdict
    }
    Err(e) => {
      error!(target: "question", id = %q.id, question = %q.question_id, error = %e, "Answer check failed on broken content");
      Verdict {
        correct: false,
        expected: q.expected.display(),
        explanation: "This question could not be checked.".into(),
        captures: vec![],
      }
    }
  }
}

#[instrument(level = "info", skip(state), fields(%question_id))]
pub async fn get_hint_text(state: &AppState, question_id: &str) -> String {
  match state.get_instance(question_id).await {
    Some(q) if !q.hint.trim().is_empty() => q.hint,
    Some(_) => "No hint for this question.".into(),
    None => "No hint: unknown question.".into(),
  }
}

#[instrument(level = "info", skip(code), fields(code_len = code.len()))]
pub fn do_normalize(code: &str) -> String {
  let normalized = normalize(code);
  debug!(target: "question", code = %trunc_for_log(code, 120), normalized = %trunc_for_log(&normalized, 120), "Code normalized");
  normalized
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{Activity, AnswerDef, NumberRanges, QuestionDef};
  use crate::seeds::seed_name_pools;

  fn state() -> AppState {
    let questions = vec![
      QuestionDef {
        id: "echo".into(),
        activity: Activity::PredictOutput,
        code: "print(<#tiny#>)".into(),
        answers: vec![AnswerDef::new("<#value:1#>")],
        hint: "It prints <#value:1#>.".into(),
        ..Default::default()
      },
      QuestionDef {
        id: "silent".into(),
        activity: Activity::FreeCoding,
        answers: vec![AnswerDef::new("print(1)")],
        ..Default::default()
      },
    ];
    AppState::from_parts(questions, seed_name_pools(), NumberRanges::default())
  }

  #[tokio::test]
  async fn evaluates_against_the_stored_instance() {
    let st = state();
    let q = st.choose_question(Some(Activity::PredictOutput)).await.unwrap();
    let shown = q.code.trim_start_matches("print(").trim_end_matches(')').to_string();

    assert_eq!(get_hint_text(&st, &q.id).await, format!("It prints {shown}."));

    let verdict = evaluate_answer(&st, &q.id, Submission::Text(shown.clone())).await;
    assert!(verdict.correct);
    assert_eq!(verdict.expected, shown);

    let other = st.choose_question(Some(Activity::PredictOutput)).await.unwrap();
    let verdict = evaluate_answer(&st, &other.id, Submission::Text("nope".into())).await;
    assert!(!verdict.correct);
  }

  #[tokio::test]
  async fn answered_instances_are_discarded() {
    let st = state();
    let q = st.choose_question(Some(Activity::FreeCoding)).await.unwrap();
    assert!(evaluate_answer(&st, &q.id, Submission::Text("print(1)".into())).await.correct);
    assert!(st.get_instance(&q.id).await.is_none());

    let again = evaluate_answer(&st, &q.id, Submission::Text("print(1)".into())).await;
    assert!(!again.correct);
    assert!(again.explanation.contains(&q.id));
    assert_eq!(get_hint_text(&st, &q.id).await, "No hint: unknown question.");
  }

  #[tokio::test]
  async fn unknown_ids_and_empty_hints() {
    let st = state();
    let verdict = evaluate_answer(&st, "missing", Submission::Text("1".into())).await;
    assert!(!verdict.correct);
    assert!(verdict.explanation.contains("missing"));
    assert_eq!(get_hint_text(&st, "missing").await, "No hint: unknown question.");

    let q = st.choose_question(Some(Activity::FreeCoding)).await.unwrap();
    assert_eq!(get_hint_text(&st, &q.id).await, "No hint for this question.");
    assert!(evaluate_answer(&st, &q.id, Submission::Text("print( 1 )".into())).await.correct);
  }

  #[test]
  fn normalizes_code() {
    assert_eq!(do_normalize("let x = 1;print(x)"), "let @1@ = 1\nprint(@1@)");
  }
}
