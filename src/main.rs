//! Lessico · Italian vocabulary quiz backend
//!
//! - Axum HTTP API: `POST /api/getGame` (10 questions), `POST /api/getWord` (one new word)
//! - Pluggable generation backends: OpenAI-compatible chat (OpenAI, DeepSeek),
//!   Gemini, a Supabase stored procedure, or an offline diagnostic provider
//! - Every provider response goes through extract → normalize → gates, retried as a whole
//! - Static frontend fallback (STATIC_DIR/index.html)
//!
//! Important env variables:
//!   PORT                 : u16 (default 3000)
//!   GAME_PROVIDER        : openai | deepseek | gemini | supabase | diagnostic (default supabase)
//!   WORD_PROVIDER        : same choices (default deepseek)
//!   OPENAI_API_KEY, DEEPSEEK_API_KEY, GEMINI_API_KEY, SUPABASE_URL, SUPABASE_ANON_KEY
//!   QUIZ_MAX_RETRIES     : attempts per request (default 3)
//!   QUIZ_RETRY_DELAY_MS  : pause between attempts (default 500)
//!   QUIZ_CONFIG_PATH     : TOML file overriding prompts, categories and retry policy
//!   LOG_LEVEL            : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT           : "pretty" (default) or "json"

mod config;
mod domain;
mod error;
mod extract;
mod gates;
mod normalize;
mod protocol;
mod providers;
mod quiz;
mod retry;
mod routes;
mod state;
mod telemetry;
mod util;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Fail fast on missing credentials before accepting any traffic.
  let cfg = AppConfig::from_env().inspect_err(|e| {
    error!(target: "lessico_backend", error = %e, "Invalid configuration");
  })?;
  let state = Arc::new(AppState::from_config(&cfg)?);

  let app = build_router(state, &cfg.static_dir);

  let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "lessico_backend", %addr, static_dir = %cfg.static_dir.display(), "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "lessico_backend", "HTTP server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    error!(target: "lessico_backend", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  info!(target: "lessico_backend", "Shutdown signal received");
}
