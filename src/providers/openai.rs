//! OpenAI-compatible chat.completions client (OpenAI, DeepSeek, any compatible base URL).
//!
//! Three ways to ask for a quiz:
//!   - `Plain`: free text, the JSON is dug out later by the extractor
//!   - `JsonObject`: `response_format = json_object`, content is a JSON document
//!   - `ToolCall`: a forced function call whose arguments follow our schema
//!
//! Calls log model, latency and token usage, never prompt contents or the key.

use std::{str::FromStr, time::Duration};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, instrument};

use super::{extract_api_error, GenerationRequest, QuizProvider, RawProviderResponse};
use crate::domain::QuizKind;
use crate::error::QuizError;

pub const TOOL_NAME: &str = "submit_quiz";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatMode {
  Plain,
  JsonObject,
  ToolCall,
}

impl FromStr for ChatMode {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "plain" | "text" => Ok(ChatMode::Plain),
      "json" | "json_object" => Ok(ChatMode::JsonObject),
      "tool" | "tools" | "function" => Ok(ChatMode::ToolCall),
      other => Err(other.to_string()),
    }
  }
}

#[derive(Clone)]
pub struct OpenAiChat {
  client: reqwest::Client,
  label: &'static str,
  api_key: String,
  pub base_url: String,
  pub model: String,
  pub mode: ChatMode,
}

impl OpenAiChat {
  pub fn new(
    label: &'static str,
    api_key: String,
    base_url: String,
    model: String,
    mode: ChatMode,
    timeout: Duration,
  ) -> Result<Self, reqwest::Error> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self { client, label, api_key, base_url: base_url.trim_end_matches('/').to_string(), model, mode })
  }

  fn build_request(&self, req: &GenerationRequest) -> ChatCompletionRequest {
    let (response_format, tools, tool_choice) = match self.mode {
      ChatMode::Plain => (None, None, None),
      ChatMode::JsonObject => (Some(ResponseFormat { r#type: "json_object".into() }), None, None),
      ChatMode::ToolCall => (
        None,
        Some(vec![quiz_tool(req.kind, req.count)]),
        Some(json!({ "type": "function", "function": { "name": TOOL_NAME } })),
      ),
    };
    ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: req.system.clone() },
        ChatMessageReq { role: "user".into(), content: req.user.clone() },
      ],
      temperature: 0.9,
      response_format,
      tools,
      tool_choice,
    }
  }

  fn read_response(&self, body: ChatCompletionResponse) -> Result<RawProviderResponse, QuizError> {
    if let Some(usage) = &body.usage {
      info!(target: "provider", provider = self.label, prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "Chat usage");
    }
    let message = body
      .choices
      .into_iter()
      .next()
      .map(|c| c.message)
      .ok_or_else(|| QuizError::provider(self.label, "response contained no choices"))?;

    if self.mode == ChatMode::ToolCall {
      if let Some(call) = message.tool_calls.into_iter().flatten().find(|c| c.function.name == TOOL_NAME) {
        let args: Value = serde_json::from_str(&call.function.arguments)?;
        return Ok(RawProviderResponse::Structured(args));
      }
    }

    match message.content {
      Some(text) if !text.trim().is_empty() => Ok(RawProviderResponse::Text(text)),
      _ => Err(QuizError::provider(self.label, "response contained no content")),
    }
  }
}

#[async_trait]
impl QuizProvider for OpenAiChat {
  fn name(&self) -> &'static str {
    self.label
  }

  #[instrument(level = "info", skip(self, req), fields(provider = self.label, model = %self.model, mode = ?self.mode, kind = ?req.kind))]
  async fn generate(&self, req: &GenerationRequest) -> Result<RawProviderResponse, QuizError> {
    let url = format!("{}/chat/completions", self.base_url);
    let start = std::time::Instant::now();

    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "lessico-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&self.build_request(req))
      .send()
      .await
      .map_err(|e| QuizError::provider(self.label, e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_api_error(&body).unwrap_or(body);
      error!(target: "provider", provider = self.label, %status, elapsed = ?start.elapsed(), "Chat request rejected");
      return Err(QuizError::provider(self.label, format!("HTTP {}: {}", status, msg)));
    }

    let body: ChatCompletionResponse =
      res.json().await.map_err(|e| QuizError::provider(self.label, e.to_string()))?;
    info!(target: "provider", provider = self.label, elapsed = ?start.elapsed(), "Chat response received");
    self.read_response(body)
  }
}

fn question_schema() -> Value {
  let text = json!({ "type": "string" });
  json!({
    "type": "object",
    "properties": {
      "word": text,
      "category": text,
      "level": { "type": "integer", "enum": [1, 2, 3] },
      "correct": text,
      "distractors": { "type": "array", "items": text, "minItems": 3, "maxItems": 3 }
    },
    "required": ["word", "category", "correct", "distractors"]
  })
}

/// Function schema forcing the model to return quiz data as call arguments.
fn quiz_tool(kind: QuizKind, count: usize) -> Value {
  let parameters = match kind {
    QuizKind::Word => question_schema(),
    QuizKind::Game => json!({
      "type": "object",
      "properties": {
        "questions": { "type": "array", "items": question_schema(), "minItems": count }
      },
      "required": ["questions"]
    }),
  };
  json!({
    "type": "function",
    "function": {
      "name": TOOL_NAME,
      "description": "Consegna le domande del quiz generate.",
      "parameters": parameters
    }
  })
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
  #[serde(skip_serializing_if = "Option::is_none")]
  tools: Option<Vec<Value>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  tool_choice: Option<Value>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }
#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp {
  #[serde(default)] content: Option<String>,
  #[serde(default)] tool_calls: Option<Vec<ToolCall>>,
}
#[derive(Deserialize)]
struct ToolCall { function: ToolCallFunction }
#[derive(Deserialize)]
struct ToolCallFunction { name: String, arguments: String }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}
