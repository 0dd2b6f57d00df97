//! Application state: one `QuizService` per endpoint, each wired to its configured backend.
//!
//! Built once from `AppConfig` and shared read-only behind an `Arc`.

use std::{sync::Arc, time::Duration};

use tracing::{info, instrument};

use crate::config::{AppConfig, ProviderSettings, SetupError};
use crate::providers::{
  diagnostic::Diagnostic, gemini::Gemini, openai::OpenAiChat, supabase::SupabaseRpc, QuizProvider,
};
use crate::quiz::QuizService;

#[derive(Clone)]
pub struct AppState {
  pub game: QuizService,
  pub word: QuizService,
}

impl AppState {
  #[instrument(level = "info", skip_all)]
  pub fn from_config(cfg: &AppConfig) -> Result<Self, SetupError> {
    let game_provider = build_provider(&cfg.game_provider, cfg.provider_timeout)?;
    let word_provider = build_provider(&cfg.word_provider, cfg.provider_timeout)?;

    info!(
      target: "lessico_backend",
      game_provider = game_provider.name(),
      word_provider = word_provider.name(),
      max_attempts = cfg.retry.max_attempts,
      retry_delay = ?cfg.retry.delay,
      "Quiz providers ready"
    );

    Ok(Self::new(game_provider, word_provider, cfg))
  }

  /// Wire explicit providers; tests inject scripted ones here.
  pub fn new(game_provider: Arc<dyn QuizProvider>, word_provider: Arc<dyn QuizProvider>, cfg: &AppConfig) -> Self {
    let service = |provider: Arc<dyn QuizProvider>| {
      QuizService::new(provider, cfg.prompts.clone(), cfg.categories.clone(), cfg.retry.clone(), cfg.game_size)
    };
    Self { game: service(game_provider), word: service(word_provider) }
  }
}

pub fn build_provider(settings: &ProviderSettings, timeout: Duration) -> Result<Arc<dyn QuizProvider>, SetupError> {
  let provider: Arc<dyn QuizProvider> = match settings.clone() {
    ProviderSettings::Chat { label, api_key, base_url, model, mode } => {
      info!(target: "lessico_backend", provider = label, %base_url, %model, ?mode, "Chat provider enabled");
      Arc::new(OpenAiChat::new(label, api_key, base_url, model, mode, timeout)?)
    }
    ProviderSettings::Gemini { api_key, model } => {
      info!(target: "lessico_backend", %model, "Gemini provider enabled");
      Arc::new(Gemini::new(api_key, model, timeout)?)
    }
    ProviderSettings::Supabase { url, anon_key, rpc } => {
      info!(target: "lessico_backend", %url, %rpc, "Supabase RPC provider enabled");
      Arc::new(SupabaseRpc::new(url, anon_key, rpc, timeout)?)
    }
    ProviderSettings::Diagnostic => {
      info!(target: "lessico_backend", "Diagnostic provider enabled (canned content)");
      Arc::new(Diagnostic)
    }
  };
  Ok(provider)
}
