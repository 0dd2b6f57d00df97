//! Locating a JSON fragment inside noisy model output.
//!
//! Models wrap JSON in commentary or ```json fences. We take the first opening
//! bracket and the last closing bracket of the same kind. This is lenient: two
//! independent fragments, or a stray bracket in trailing prose, yield a span
//! that fails later in `decode_raw` with a parse error.

use serde_json::Value;

use crate::error::QuizError;
use crate::providers::RawProviderResponse;

pub fn extract_json_fragment(text: &str) -> Result<&str, QuizError> {
  let start = text.find(['{', '[']).ok_or(QuizError::Extraction)?;
  let close = if text[start..].starts_with('{') { '}' } else { ']' };
  let end = text.rfind(close).ok_or(QuizError::Extraction)?;
  if end < start {
    return Err(QuizError::Extraction);
  }
  Ok(&text[start..=end])
}

/// Turn whatever the provider produced into a decoded JSON value.
pub fn decode_raw(raw: RawProviderResponse) -> Result<Value, QuizError> {
  match raw {
    RawProviderResponse::Text(text) => parse_fragment(&text),
    // Some backends double-encode: a JSON string holding the document.
    RawProviderResponse::Structured(Value::String(text)) => parse_fragment(&text),
    RawProviderResponse::Structured(value) => Ok(value),
  }
}

fn parse_fragment(text: &str) -> Result<Value, QuizError> {
  let fragment = extract_json_fragment(text)?;
  Ok(serde_json::from_str(fragment)?)
}
