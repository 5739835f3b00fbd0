//! CodeDrill · Practice Question Backend
//!
//! - Axum HTTP + WebSocket API over the question engine
//! - Built-in question bank, optionally extended from TOML
//!
//! Important env variables:
//!   PORT                : u16 (default 3000)
//!   QUESTION_BANK_PATH  : path to TOML question bank (questions, name pools, ranges)
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use codedrill_backend::routes::build_router;
use codedrill_backend::state::AppState;
use codedrill_backend::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared application state (question bank, name pools, instance store).
  let state = Arc::new(AppState::new());

  let app = build_router(state);

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "codedrill_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "codedrill_backend", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "codedrill_backend", error = %e, "Failed to listen for shutdown signal");
  }
}
