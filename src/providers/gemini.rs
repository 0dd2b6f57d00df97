//! Google Gemini `generateContent` backend with JSON response MIME type.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use super::{extract_api_error, GenerationRequest, QuizProvider, RawProviderResponse};
use crate::error::QuizError;

const ENDPOINT_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Clone)]
pub struct Gemini {
  client: reqwest::Client,
  api_key: String,
  pub model: String,
}

impl Gemini {
  pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, reqwest::Error> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self { client, api_key, model })
  }

  fn endpoint(&self) -> String {
    format!("{}/{}:generateContent", ENDPOINT_BASE, self.model)
  }
}

#[async_trait]
impl QuizProvider for Gemini {
  fn name(&self) -> &'static str {
    "gemini"
  }

  #[instrument(level = "info", skip(self, req), fields(model = %self.model, kind = ?req.kind))]
  async fn generate(&self, req: &GenerationRequest) -> Result<RawProviderResponse, QuizError> {
    let payload = GenerateRequest::new(&req.system, &req.user);
    let start = std::time::Instant::now();
    let res = self
      .client
      .post(self.endpoint())
      .header("x-goog-api-key", self.api_key.as_str())
      .json(&payload)
      .send()
      .await
      .map_err(|e| QuizError::provider("gemini", e.to_string()))?;

    let status = res.status();
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      let msg = extract_api_error(&body).unwrap_or(body);
      error!(target: "provider", provider = "gemini", %status, elapsed = ?start.elapsed(), "Gemini request rejected");
      return Err(QuizError::provider("gemini", format!("HTTP {}: {}", status, msg)));
    }

    let body: GenerateResponse = res.json().await.map_err(|e| QuizError::provider("gemini", e.to_string()))?;
    info!(target: "provider", provider = "gemini", elapsed = ?start.elapsed(), "Gemini response received");
    first_text(body).map(RawProviderResponse::Text)
  }
}

fn first_text(body: GenerateResponse) -> Result<String, QuizError> {
  body
    .candidates
    .unwrap_or_default()
    .into_iter()
    .find_map(Candidate::into_text)
    .filter(|t| !t.trim().is_empty())
    .ok_or_else(|| QuizError::provider("gemini", "response contained no text"))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
  contents: [Content<'a>; 1],
  system_instruction: Content<'a>,
  generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
  #[serde(skip_serializing_if = "Option::is_none")]
  role: Option<&'a str>,
  parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
  text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
  temperature: f32,
  response_mime_type: &'static str,
}

impl<'a> GenerateRequest<'a> {
  fn new(system: &'a str, user: &'a str) -> Self {
    Self {
      contents: [Content { role: Some("user"), parts: [Part { text: user }] }],
      system_instruction: Content { role: None, parts: [Part { text: system }] },
      generation_config: GenerationConfig { temperature: 0.9, response_mime_type: "application/json" },
    }
  }
}

#[derive(Deserialize)]
struct GenerateResponse {
  #[serde(default)]
  candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
  #[serde(default)]
  content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
  #[serde(default)]
  parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
  #[serde(default)]
  text: Option<String>,
}

impl Candidate {
  fn into_text(self) -> Option<String> {
    let text: String = self.content?.parts.into_iter().filter_map(|p| p.text).collect();
    if text.is_empty() { None } else { Some(text) }
  }
}
