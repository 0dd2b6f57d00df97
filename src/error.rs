//! Error taxonomy for quiz generation plus the HTTP-facing error response.
//!
//! Everything that can go wrong inside one generation attempt is a `QuizError`.
//! The retry controller treats all of them alike; only after exhaustion does the
//! last one surface to the client, wrapped in `ApiError::Generation`.

use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

use crate::protocol::ErrorOut;

#[derive(Debug, Error)]
pub enum QuizError {
  #[error("no JSON found in provider response")]
  Extraction,

  #[error("invalid JSON from provider: {0}")]
  Parse(String),

  #[error("invalid question: {0}")]
  Validation(String),

  #[error("insufficient valid questions: found {found}, required {required}")]
  Quota { found: usize, required: usize },

  #[error("duplicate words in batch: {}", .words.join(", "))]
  Duplicate { words: Vec<String> },

  #[error("word already used: {0}")]
  RepeatedWord(String),

  #[error("provider {provider} failed: {message}")]
  Provider { provider: &'static str, message: String },

  #[error("invalid request: {0}")]
  Config(String),
}

impl QuizError {
  pub fn provider(provider: &'static str, message: impl Into<String>) -> Self {
    QuizError::Provider { provider, message: message.into() }
  }

  /// Stable label for structured logs.
  pub fn kind(&self) -> &'static str {
    match self {
      QuizError::Extraction => "extraction",
      QuizError::Parse(_) => "parse",
      QuizError::Validation(_) => "validation",
      QuizError::Quota { .. } => "quota",
      QuizError::Duplicate { .. } => "duplicate",
      QuizError::RepeatedWord(_) => "repeated_word",
      QuizError::Provider { .. } => "provider",
      QuizError::Config(_) => "config",
    }
  }
}

impl From<serde_json::Error> for QuizError {
  fn from(e: serde_json::Error) -> Self {
    QuizError::Parse(e.to_string())
  }
}

/// Terminal failure of the retry loop: how many attempts ran and the last cause.
#[derive(Debug, Error)]
#[error("generation failed after {attempts} attempt(s): {last}")]
pub struct RetryExhausted {
  pub attempts: u32,
  #[source]
  pub last: QuizError,
}

/// Errors returned by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  BadRequest(String),

  #[error("{summary}")]
  Generation { summary: &'static str, source: RetryExhausted },
}

impl IntoResponse for ApiError {
  fn into_response(self) -> axum::response::Response {
    match self {
      ApiError::BadRequest(error) => {
        (StatusCode::BAD_REQUEST, Json(ErrorOut { error, details: None })).into_response()
      }
      ApiError::Generation { summary, source } => (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorOut { error: summary.to_string(), details: Some(source.to_string()) }),
      )
        .into_response(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn exhausted_message_carries_last_cause() {
    let e = RetryExhausted { attempts: 3, last: QuizError::RepeatedWord("Gioia".into()) };
    assert_eq!(e.to_string(), "generation failed after 3 attempt(s): word already used: Gioia");
  }

  #[test]
  fn kinds_are_distinct_for_quota_and_duplicate() {
    let q = QuizError::Quota { found: 9, required: 10 };
    let d = QuizError::Duplicate { words: vec!["Mare".into()] };
    assert_eq!(q.kind(), "quota");
    assert_eq!(d.kind(), "duplicate");
    assert_eq!(d.to_string(), "duplicate words in batch: Mare");
  }
}
