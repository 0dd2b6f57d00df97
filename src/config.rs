//! Process configuration: environment variables plus an optional TOML override file.
//!
//! Built once at startup and handed to `AppState`. A selected provider whose
//! credentials are missing is a startup error, never a per-request surprise.

use std::{path::PathBuf, str::FromStr, time::Duration};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::providers::openai::ChatMode;
use crate::retry::{RetryPolicy, DEFAULT_DELAY, DEFAULT_MAX_ATTEMPTS};

pub const GAME_SIZE: usize = 10;
const DEFAULT_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Error)]
pub enum SetupError {
  #[error("missing required environment variable {0}")]
  MissingEnv(&'static str),

  #[error("invalid value for {name}: {value}")]
  InvalidEnv { name: &'static str, value: String },

  #[error("failed to read config file {path}: {source}")]
  ReadFile { path: String, source: std::io::Error },

  #[error("failed to parse config file {path}: {source}")]
  ParseFile { path: String, source: toml::de::Error },

  #[error("failed to build HTTP client: {0}")]
  HttpClient(#[from] reqwest::Error),
}

/// Prompt templates. Placeholders: `{difficulty}`, `{count}`, `{categories}`, `{used_words}`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub game_system: String,
  pub game_user_template: String,
  pub word_system: String,
  pub word_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      game_system: "Sei un esperto di vocabolario italiano per adolescenti. Il tuo unico compito è creare domande per un gioco a quiz. Fornisci la risposta ESCLUSIVAMENTE in formato JSON valido, senza testo introduttivo, commenti o markdown. Il formato deve essere esattamente:\n{\"questions\": [{\"word\": \"Parola\", \"category\": \"Categoria\", \"correct\": \"Definizione corretta\", \"distractors\": [\"Distrattore 1\", \"Distrattore 2\", \"Distrattore 3\"]}]}".into(),
      game_user_template: "Genera {count} domande con {count} parole tutte diverse tra loro. Livello di difficoltà richiesto: {difficulty}. Categorie a tua scelta tra: {categories}.".into(),
      word_system: "Sei un esperto di vocabolario italiano per adolescenti. Il tuo unico compito è creare una domanda per un gioco a quiz. Devi generare UNA SOLA parola, la sua definizione e 3 distrattori. Fornisci la risposta ESCLUSIVAMENTE in formato JSON valido, senza testo introduttivo, commenti o markdown. Il formato deve essere esattamente:\n{\"word\": \"La tua parola generata\", \"category\": \"La categoria scelta\", \"level\": 1, \"correct\": \"La definizione corretta\", \"distractors\": [\"Distrattore 1\", \"Distrattore 2\", \"Distrattore 3\"]}".into(),
      word_user_template: "Genera una nuova domanda. Parole già usate (da non ripetere): {used_words}. Livello di difficoltà richiesto: {difficulty}. Categoria a tua scelta tra: {categories}.".into(),
    }
  }
}

pub fn default_categories() -> Vec<String> {
  ["Emozioni", "Natura", "Sport", "Scienza", "Cibo", "Arte", "Geografia"]
    .map(String::from)
    .to_vec()
}

/// Optional TOML file (`QUIZ_CONFIG_PATH`).
#[derive(Clone, Debug, Deserialize, Default)]
pub struct FileConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub categories: Option<Vec<String>>,
  #[serde(default)]
  pub retry: Option<FileRetry>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FileRetry {
  pub max_attempts: Option<u32>,
  pub delay_ms: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
  OpenAi,
  DeepSeek,
  Gemini,
  Supabase,
  Diagnostic,
}

impl FromStr for ProviderKind {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "openai" => Ok(ProviderKind::OpenAi),
      "deepseek" => Ok(ProviderKind::DeepSeek),
      "gemini" | "google" => Ok(ProviderKind::Gemini),
      "supabase" => Ok(ProviderKind::Supabase),
      "diagnostic" => Ok(ProviderKind::Diagnostic),
      other => Err(other.to_string()),
    }
  }
}

/// Fully-resolved settings for one backend. Secrets live here and nowhere else.
#[derive(Clone)]
pub enum ProviderSettings {
  Chat { label: &'static str, api_key: String, base_url: String, model: String, mode: ChatMode },
  Gemini { api_key: String, model: String },
  Supabase { url: String, anon_key: String, rpc: String },
  Diagnostic,
}

impl std::fmt::Debug for ProviderSettings {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ProviderSettings::Chat { label, base_url, model, mode, .. } => f
        .debug_struct("Chat")
        .field("label", label)
        .field("base_url", base_url)
        .field("model", model)
        .field("mode", mode)
        .finish_non_exhaustive(),
      ProviderSettings::Gemini { model, .. } => f.debug_struct("Gemini").field("model", model).finish_non_exhaustive(),
      ProviderSettings::Supabase { url, rpc, .. } => {
        f.debug_struct("Supabase").field("url", url).field("rpc", rpc).finish_non_exhaustive()
      }
      ProviderSettings::Diagnostic => f.write_str("Diagnostic"),
    }
  }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
  pub port: u16,
  pub static_dir: PathBuf,
  pub game_provider: ProviderSettings,
  pub word_provider: ProviderSettings,
  pub retry: RetryPolicy,
  pub provider_timeout: Duration,
  pub prompts: Prompts,
  pub categories: Vec<String>,
  pub game_size: usize,
}

impl AppConfig {
  pub fn from_env() -> Result<Self, SetupError> {
    Self::from_lookup(|k| std::env::var(k).ok())
  }

  /// Build from an arbitrary variable lookup (the real environment in production).
  pub fn from_lookup(env: impl Fn(&str) -> Option<String>) -> Result<Self, SetupError> {
    let var = |k: &str| env(k).filter(|v| !v.trim().is_empty());

    let port = parse_var(&var, "PORT", 3000u16)?;
    let static_dir: PathBuf = var("STATIC_DIR").unwrap_or_else(|| "./static".into()).into();

    let file = match var("QUIZ_CONFIG_PATH") {
      Some(path) => load_file_config(&path)?,
      None => FileConfig::default(),
    };

    let file_retry = file.retry.clone();
    let max_attempts = match var("QUIZ_MAX_RETRIES") {
      Some(_) => parse_var(&var, "QUIZ_MAX_RETRIES", DEFAULT_MAX_ATTEMPTS)?,
      None => file_retry.as_ref().and_then(|r| r.max_attempts).unwrap_or(DEFAULT_MAX_ATTEMPTS),
    };
    let delay_ms = match var("QUIZ_RETRY_DELAY_MS") {
      Some(_) => parse_var(&var, "QUIZ_RETRY_DELAY_MS", DEFAULT_DELAY.as_millis() as u64)?,
      None => file_retry
        .and_then(|r| r.delay_ms)
        .unwrap_or(DEFAULT_DELAY.as_millis() as u64),
    };
    let timeout_secs = parse_var(&var, "PROVIDER_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;

    let game_kind = provider_kind(&var, "GAME_PROVIDER", ProviderKind::Supabase)?;
    let word_kind = provider_kind(&var, "WORD_PROVIDER", ProviderKind::DeepSeek)?;

    Ok(Self {
      port,
      static_dir,
      game_provider: provider_settings(&var, game_kind)?,
      word_provider: provider_settings(&var, word_kind)?,
      retry: RetryPolicy::new(max_attempts, Duration::from_millis(delay_ms)),
      provider_timeout: Duration::from_secs(timeout_secs),
      prompts: file.prompts,
      categories: file.categories.filter(|c| !c.is_empty()).unwrap_or_else(default_categories),
      game_size: GAME_SIZE,
    })
  }
}

fn parse_var<T: FromStr>(var: &impl Fn(&str) -> Option<String>, name: &'static str, default: T) -> Result<T, SetupError> {
  match var(name) {
    None => Ok(default),
    Some(v) => v.trim().parse().map_err(|_| SetupError::InvalidEnv { name, value: v }),
  }
}

fn required(var: &impl Fn(&str) -> Option<String>, name: &'static str) -> Result<String, SetupError> {
  var(name).ok_or(SetupError::MissingEnv(name))
}

fn provider_kind(var: &impl Fn(&str) -> Option<String>, name: &'static str, default: ProviderKind) -> Result<ProviderKind, SetupError> {
  match var(name) {
    None => Ok(default),
    Some(v) => v.parse().map_err(|value| SetupError::InvalidEnv { name, value }),
  }
}

fn chat_mode(var: &impl Fn(&str) -> Option<String>, default: ChatMode) -> Result<ChatMode, SetupError> {
  match var("OPENAI_CHAT_MODE") {
    None => Ok(default),
    Some(v) => v.parse().map_err(|value| SetupError::InvalidEnv { name: "OPENAI_CHAT_MODE", value }),
  }
}

fn provider_settings(var: &impl Fn(&str) -> Option<String>, kind: ProviderKind) -> Result<ProviderSettings, SetupError> {
  Ok(match kind {
    ProviderKind::OpenAi => ProviderSettings::Chat {
      label: "openai",
      api_key: required(var, "OPENAI_API_KEY")?,
      base_url: var("OPENAI_BASE_URL").unwrap_or_else(|| "https://api.openai.com/v1".into()),
      model: var("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".into()),
      mode: chat_mode(var, ChatMode::ToolCall)?,
    },
    ProviderKind::DeepSeek => ProviderSettings::Chat {
      label: "deepseek",
      api_key: required(var, "DEEPSEEK_API_KEY")?,
      base_url: var("DEEPSEEK_BASE_URL").unwrap_or_else(|| "https://api.deepseek.com".into()),
      model: var("DEEPSEEK_MODEL").unwrap_or_else(|| "deepseek-chat".into()),
      mode: ChatMode::JsonObject,
    },
    ProviderKind::Gemini => ProviderSettings::Gemini {
      api_key: required(var, "GEMINI_API_KEY")?,
      model: var("GEMINI_MODEL").unwrap_or_else(|| "gemini-1.5-flash".into()),
    },
    ProviderKind::Supabase => ProviderSettings::Supabase {
      url: required(var, "SUPABASE_URL")?,
      anon_key: required(var, "SUPABASE_ANON_KEY")?,
      rpc: var("SUPABASE_RPC").unwrap_or_else(|| "get_random_questions_by_difficulty".into()),
    },
    ProviderKind::Diagnostic => ProviderSettings::Diagnostic,
  })
}

fn load_file_config(path: &str) -> Result<FileConfig, SetupError> {
  let s = std::fs::read_to_string(path).map_err(|source| SetupError::ReadFile { path: path.into(), source })?;
  let cfg = toml::from_str::<FileConfig>(&s).map_err(|source| SetupError::ParseFile { path: path.into(), source })?;
  info!(target: "lessico_backend", %path, "Loaded quiz config (TOML)");
  Ok(cfg)
}
