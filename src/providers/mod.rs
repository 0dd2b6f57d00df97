//! Generation backends behind one trait.
//!
//! A provider only produces raw content; extraction, normalization, gates and
//! retries happen in `quiz::QuizService` and are shared by every backend.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{Difficulty, QuizKind};
use crate::error::QuizError;

pub mod diagnostic;
pub mod gemini;
pub mod openai;
pub mod supabase;

/// Untyped provider output, created per attempt and dropped after normalization.
#[derive(Clone, Debug, PartialEq)]
pub enum RawProviderResponse {
  /// Free text that may embed a JSON fragment.
  Text(String),
  /// Already-decoded data (tool-call arguments, database rows).
  Structured(Value),
}

/// One rendered request for a single attempt.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
  pub kind: QuizKind,
  pub difficulty: Difficulty,
  pub system: String,
  pub user: String,
  /// Number of questions wanted (1 for `QuizKind::Word`).
  pub count: usize,
}

#[async_trait]
pub trait QuizProvider: Send + Sync {
  fn name(&self) -> &'static str;

  async fn generate(&self, req: &GenerationRequest) -> Result<RawProviderResponse, QuizError>;
}

/// Try to extract a clean error message from an `{"error": {"message": ...}}` body.
pub(crate) fn extract_api_error(body: &str) -> Option<String> {
  let v: Value = serde_json::from_str(body).ok()?;
  let err = v.get("error")?;
  err
    .get("message")
    .and_then(Value::as_str)
    .or_else(|| err.as_str())
    .map(str::to_string)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn api_error_body_is_unwrapped() {
    assert_eq!(
      extract_api_error(r#"{"error":{"message":"Invalid API key","type":"auth"}}"#).as_deref(),
      Some("Invalid API key")
    );
    assert_eq!(extract_api_error(r#"{"error":"quota"}"#).as_deref(), Some("quota"));
    assert_eq!(extract_api_error("<html>bad gateway</html>"), None);
  }
}
