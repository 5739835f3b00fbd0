//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::protocol::to_out;
use crate::logic::*;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "codedrill_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "codedrill_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let out = reply_to_text(&txt, &state).await;
        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "codedrill_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "codedrill_backend", "WebSocket disconnected");
}

/// One text frame in, one JSON reply out. Malformed input becomes an `error` message.
async fn reply_to_text(txt: &str, state: &AppState) -> String {
  let reply_msg = match serde_json::from_str::<ClientWsMessage>(txt) {
    Ok(incoming) => {
      debug!(target: "codedrill_backend", ?incoming, "WS received");
      handle_client_ws(incoming, state).await
    }
    Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
  };

  serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  })
}

#[instrument(level = "info", skip(state))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::NewQuestion { activity } => match state.choose_question(activity).await {
      Some(q) => {
        info!(target: "question", id = %q.id, question = %q.question_id, "WS new_question served");
        ServerWsMessage::Question { question: to_out(&q) }
      }
      None => ServerWsMessage::Error {
        message: format!(
          "No question available for activity {}",
          activity.map(|a| a.to_string()).unwrap_or_else(|| "any".into())
        ),
      },
    },

    ClientWsMessage::SubmitAnswer { question_id, answer } => {
      let verdict = evaluate_answer(state, &question_id, answer.into()).await;
      info!(target: "question", id = %question_id, correct = verdict.correct, "WS submit_answer evaluated");
      ServerWsMessage::AnswerResult {
        correct: verdict.correct,
        expected: verdict.expected,
        explanation: verdict.explanation,
        captures: verdict.captures,
      }
    }

    ClientWsMessage::Hint { question_id } => {
      let text = get_hint_text(state, &question_id).await;
      info!(target: "question", id = %question_id, "WS hint served");
      ServerWsMessage::Hint { text }
    }

    ClientWsMessage::Normalize { code } => {
      let normalized = do_normalize(&code);
      ServerWsMessage::Normalized { code, normalized }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::{json, Value};

  use crate::domain::{Activity, AnswerDef, NumberRanges, QuestionDef};
  use crate::seeds::seed_name_pools;

  fn state() -> AppState {
    let questions = vec![QuestionDef {
      id: "echo".into(),
      activity: Activity::PredictOutput,
      code: "print(<#tiny#>)".into(),
      answers: vec![AnswerDef::new("<#value:1#>")],
      hint: "It prints <#value:1#>.".into(),
      ..Default::default()
    }];
    AppState::from_parts(questions, seed_name_pools(), NumberRanges::default())
  }

  async fn exchange(state: &AppState, msg: Value) -> Value {
    let out = reply_to_text(&msg.to_string(), state).await;
    serde_json::from_str(&out).unwrap()
  }

  #[tokio::test]
  async fn ping_and_normalize() {
    let st = state();
    assert_eq!(exchange(&st, json!({ "type": "ping" })).await, json!({ "type": "pong" }));

    let reply = exchange(&st, json!({ "type": "normalize", "code": "let x = 1;print(x)" })).await;
    assert_eq!(reply["type"], "normalized");
    assert_eq!(reply["code"], "let x = 1;print(x)");
    assert_eq!(reply["normalized"], "let @1@ = 1\nprint(@1@)");
  }

  #[tokio::test]
  async fn question_hint_and_answer_flow() {
    let st = state();
    let reply = exchange(&st, json!({ "type": "new_question", "activity": "predict_output" })).await;
    assert_eq!(reply["type"], "question");
    let question = &reply["question"];
    assert_eq!(question["questionId"], "echo");
    assert!(question.get("expected").is_none());
    let id = question["id"].as_str().unwrap().to_string();
    let shown = question["code"].as_str().unwrap().trim_start_matches("print(").trim_end_matches(')').to_string();

    let hint = exchange(&st, json!({ "type": "hint", "questionId": id })).await;
    assert_eq!(hint, json!({ "type": "hint", "text": format!("It prints {shown}.") }));

    let answer = json!({ "type": "submit_answer", "questionId": id, "answer": { "type": "text", "text": shown.clone() } });
    let verdict = exchange(&st, answer.clone()).await;
    assert_eq!(verdict["type"], "answer_result");
    assert_eq!(verdict["correct"], true);
    assert_eq!(verdict["expected"], shown);

    // the instance was consumed by the first answer
    let again = exchange(&st, answer).await;
    assert_eq!(again["correct"], false);
  }

  #[tokio::test]
  async fn missing_activity_and_bad_json_are_errors() {
    let st = state();
    let reply = exchange(&st, json!({ "type": "new_question", "activity": "rearrange_lines" })).await;
    assert_eq!(reply["type"], "error");
    assert!(reply["message"].as_str().unwrap().contains("rearrange_lines"));

    let out = reply_to_text("{not json", &st).await;
    let reply: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(reply["type"], "error");
    assert!(reply["message"].as_str().unwrap().starts_with("Invalid JSON"));

    let reply = exchange(&st, json!({ "type": "dance" })).await;
    assert_eq!(reply["type"], "error");
  }
}
