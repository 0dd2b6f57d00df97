//! Supabase (PostgREST) stored-procedure backend: pre-authored questions from the database.
//!
//! Only serves full games. The procedure receives `limit_count` and
//! `difficulty_level` and returns rows already close to the canonical shape.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, instrument};

use super::{extract_api_error, GenerationRequest, QuizProvider, RawProviderResponse};
use crate::domain::QuizKind;
use crate::error::QuizError;

#[derive(Clone)]
pub struct SupabaseRpc {
  client: reqwest::Client,
  pub url: String,
  anon_key: String,
  pub function: String,
}

#[derive(Serialize, Debug, PartialEq)]
struct RpcArgs {
  limit_count: usize,
  difficulty_level: u8,
}

impl SupabaseRpc {
  pub fn new(url: String, anon_key: String, function: String, timeout: Duration) -> Result<Self, reqwest::Error> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self { client, url: url.trim_end_matches('/').to_string(), anon_key, function })
  }

  fn endpoint(&self) -> String {
    format!("{}/rest/v1/rpc/{}", self.url, self.function)
  }
}

#[async_trait]
impl QuizProvider for SupabaseRpc {
  fn name(&self) -> &'static str {
    "supabase"
  }

  #[instrument(level = "info", skip(self, req), fields(function = %self.function, difficulty = %req.difficulty, count = req.count))]
  async fn generate(&self, req: &GenerationRequest) -> Result<RawProviderResponse, QuizError> {
    if req.kind != QuizKind::Game {
      return Err(QuizError::provider("supabase", "single-word generation is not supported by the database backend"));
    }
    let args = RpcArgs { limit_count: req.count, difficulty_level: req.difficulty.level() };
    let start = std::time::Instant::now();

    let res = self
      .client
      .post(self.endpoint())
      .header("apikey", self.anon_key.as_str())
      .bearer_auth(&self.anon_key)
      .json(&args)
      .send()
      .await
      .map_err(|e| QuizError::provider("supabase", e.to_string()))?;

    let status = res.status();
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      let msg = postgrest_message(&body).or_else(|| extract_api_error(&body)).unwrap_or(body);
      error!(target: "provider", provider = "supabase", %status, elapsed = ?start.elapsed(), "RPC rejected");
      return Err(QuizError::provider("supabase", format!("HTTP {}: {}", status, msg)));
    }

    let rows: Value = res.json().await.map_err(|e| QuizError::provider("supabase", e.to_string()))?;
    let row_count = rows.as_array().map(Vec::len).unwrap_or(0);
    info!(target: "provider", provider = "supabase", row_count, elapsed = ?start.elapsed(), "RPC rows received");
    Ok(RawProviderResponse::Structured(rows))
  }
}

/// PostgREST errors look like `{"code": "...", "message": "...", "hint": ...}`.
fn postgrest_message(body: &str) -> Option<String> {
  let v: Value = serde_json::from_str(body).ok()?;
  v.get("message").and_then(Value::as_str).map(str::to_string)
}
