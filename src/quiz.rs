//! Quiz generation: one attempt = render prompt, call provider, extract,
//! normalize, gate. The retry controller repeats whole attempts.

use std::{collections::HashSet, sync::Arc};

use tracing::{debug, info, instrument};

use crate::config::Prompts;
use crate::domain::{Difficulty, QuizKind, QuizQuestion};
use crate::error::{QuizError, RetryExhausted};
use crate::extract::decode_raw;
use crate::gates::{check_batch, check_not_used};
use crate::normalize::{normalize_batch, normalize_question};
use crate::providers::{GenerationRequest, QuizProvider, RawProviderResponse};
use crate::retry::{run_with_retry, RetryPolicy};
use crate::util::{fill_template, shuffled_list, trunc_for_log};

fn log_raw(raw: &RawProviderResponse, attempt: u32) {
  if let RawProviderResponse::Text(text) = raw {
    debug!(target: "quiz", attempt, text_len = text.len(), preview = %trunc_for_log(text, 80), "Provider text received");
  }
}

#[derive(Clone)]
pub struct QuizService {
  provider: Arc<dyn QuizProvider>,
  prompts: Prompts,
  categories: Vec<String>,
  retry: RetryPolicy,
  game_size: usize,
}

impl QuizService {
  pub fn new(
    provider: Arc<dyn QuizProvider>,
    prompts: Prompts,
    categories: Vec<String>,
    retry: RetryPolicy,
    game_size: usize,
  ) -> Self {
    Self { provider, prompts, categories, retry, game_size }
  }

  pub fn provider_name(&self) -> &'static str {
    self.provider.name()
  }

  fn render(&self, kind: QuizKind, difficulty: Difficulty, used_words: &[String]) -> GenerationRequest {
    let categories = shuffled_list(&self.categories);
    let count = match kind {
      QuizKind::Game => self.game_size,
      QuizKind::Word => 1,
    };
    let count_s = count.to_string();
    let used = if used_words.is_empty() { "nessuna".to_string() } else { used_words.join(", ") };
    let pairs = [
      ("difficulty", difficulty.description()),
      ("count", count_s.as_str()),
      ("categories", categories.as_str()),
      ("used_words", used.as_str()),
    ];
    let (system, user) = match kind {
      QuizKind::Game => (&self.prompts.game_system, &self.prompts.game_user_template),
      QuizKind::Word => (&self.prompts.word_system, &self.prompts.word_user_template),
    };
    GenerationRequest {
      kind,
      difficulty,
      system: fill_template(system, &pairs),
      user: fill_template(user, &pairs),
      count,
    }
  }

  async fn game_attempt(&self, difficulty: Difficulty, attempt: u32) -> Result<Vec<QuizQuestion>, QuizError> {
    let req = self.render(QuizKind::Game, difficulty, &[]);
    let raw = self.provider.generate(&req).await?;
    log_raw(&raw, attempt);
    let normalized = normalize_batch(&decode_raw(raw)?)?;
    debug!(target: "quiz", attempt, valid = normalized.len(), "Batch normalized");
    check_batch(normalized, self.game_size)
  }

  async fn word_attempt(
    &self,
    difficulty: Difficulty,
    used_words: &[String],
    used_set: &HashSet<String>,
    attempt: u32,
  ) -> Result<QuizQuestion, QuizError> {
    let req = self.render(QuizKind::Word, difficulty, used_words);
    let raw = self.provider.generate(&req).await?;
    log_raw(&raw, attempt);
    let mut question = normalize_question(&decode_raw(raw)?)?;
    check_not_used(&question, used_set)?;
    question.level = question.level.or(Some(difficulty.level()));
    debug!(target: "quiz", attempt, word = %question.word, "Word accepted");
    Ok(question)
  }

  /// A full game of `game_size` questions with pairwise distinct words.
  #[instrument(level = "info", skip(self), fields(provider = self.provider.name()))]
  pub async fn get_game(&self, difficulty: Difficulty) -> Result<Vec<QuizQuestion>, RetryExhausted> {
    let questions = run_with_retry(&self.retry, "get_game", |n| self.game_attempt(difficulty, n)).await?;
    info!(target: "quiz", %difficulty, count = questions.len(), "Game generated");
    Ok(questions)
  }

  /// One question whose word is not among `used_words`.
  #[instrument(level = "info", skip(self, used_words), fields(provider = self.provider.name(), used = used_words.len()))]
  pub async fn get_word(&self, difficulty: Difficulty, used_words: &[String]) -> Result<QuizQuestion, RetryExhausted> {
    let used_set: HashSet<String> = used_words.iter().cloned().collect();
    let question = run_with_retry(&self.retry, "get_word", |n| self.word_attempt(difficulty, used_words, &used_set, n)).await?;
    info!(target: "quiz", %difficulty, word = %question.word, "Word generated");
    Ok(question)
  }
}
