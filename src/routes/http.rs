//! HTTP endpoint handlers. Thin wrappers: parse the body, validate difficulty,
//! forward to the quiz services, map failures to 400/500.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, Json};
use serde::de::DeserializeOwned;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::{Difficulty, QuizQuestion};
use crate::error::ApiError;
use crate::protocol::*;
use crate::state::AppState;

const INVALID_DIFFICULTY: &str = "Livello di difficoltà non valido.";
const GAME_FAILED: &str = "Impossibile generare le domande della partita.";
const WORD_FAILED: &str = "Errore durante la generazione della parola.";

/// Empty body means "all defaults"; anything else must be a JSON object.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
  if body.iter().all(u8::is_ascii_whitespace) {
    return Ok(T::default());
  }
  serde_json::from_slice(body).map_err(|e| {
    warn!(target: "quiz", error = %e, "Rejected malformed request body");
    ApiError::BadRequest(format!("Corpo della richiesta non valido: {e}"))
  })
}

fn parse_difficulty(raw: Option<&serde_json::Value>, default: Option<Difficulty>) -> Result<Difficulty, ApiError> {
  match (raw, default) {
    (Some(v), _) => Difficulty::from_json(v).map_err(|e| {
      warn!(target: "quiz", error = %e, "Rejected difficulty");
      ApiError::BadRequest(INVALID_DIFFICULTY.into())
    }),
    (None, Some(d)) => Ok(d),
    (None, None) => Err(ApiError::BadRequest(INVALID_DIFFICULTY.into())),
  }
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> Json<HealthOut> {
  Json(HealthOut { ok: true, game_provider: state.game.provider_name(), word_provider: state.word.provider_name() })
}

#[instrument(level = "info", skip(state, body), fields(request_id = %Uuid::new_v4(), body_len = body.len()))]
pub async fn http_post_game(
  State(state): State<Arc<AppState>>,
  body: Bytes,
) -> Result<Json<Vec<QuizQuestion>>, ApiError> {
  let input: GameIn = parse_body(&body)?;
  let difficulty = parse_difficulty(input.difficulty.as_ref(), Some(Difficulty::Base))?;

  let questions = state
    .game
    .get_game(difficulty)
    .await
    .map_err(|source| ApiError::Generation { summary: GAME_FAILED, source })?;
  info!(target: "quiz", %difficulty, count = questions.len(), "HTTP game served");
  Ok(Json(questions))
}

#[instrument(level = "info", skip(state, body), fields(request_id = %Uuid::new_v4(), body_len = body.len()))]
pub async fn http_post_word(
  State(state): State<Arc<AppState>>,
  body: Bytes,
) -> Result<Json<QuizQuestion>, ApiError> {
  let input: WordIn = parse_body(&body)?;
  let difficulty = parse_difficulty(input.difficulty.as_ref(), None)?;

  let question = state
    .word
    .get_word(difficulty, &input.used_words)
    .await
    .map_err(|source| ApiError::Generation { summary: WORD_FAILED, source })?;
  info!(target: "quiz", %difficulty, word = %question.word, used = input.used_words.len(), "HTTP word served");
  Ok(Json(question))
}
