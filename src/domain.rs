//! Domain models: difficulty tiers and the canonical quiz question.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::QuizError;

/// Difficulty tier requested by the game (1..=3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Difficulty {
  Base = 1,
  Intermedio = 2,
  Avanzato = 3,
}

impl Difficulty {
  pub fn level(self) -> u8 {
    self as u8
  }

  /// Natural-language description interpolated into prompts.
  pub fn description(self) -> &'static str {
    match self {
      Difficulty::Base => "Base (facile, per ragazzi di 12 anni)",
      Difficulty::Intermedio => "Intermedio (di media difficoltà, per ragazzi di 14 anni)",
      Difficulty::Avanzato => "Avanzato (più difficile ma non tecnico, per ragazzi di 16 anni)",
    }
  }

  /// Strict parse from a request body value: only the JSON integers 1, 2, 3.
  pub fn from_json(value: &Value) -> Result<Self, QuizError> {
    value
      .as_u64()
      .and_then(|n| u8::try_from(n).ok())
      .and_then(|n| Difficulty::try_from(n).ok())
      .ok_or_else(|| QuizError::Config(format!("invalid difficulty: {value}")))
  }
}

impl TryFrom<u8> for Difficulty {
  type Error = String;

  fn try_from(n: u8) -> Result<Self, Self::Error> {
    match n {
      1 => Ok(Difficulty::Base),
      2 => Ok(Difficulty::Intermedio),
      3 => Ok(Difficulty::Avanzato),
      other => Err(format!("difficulty must be 1, 2 or 3 (got {other})")),
    }
  }
}

impl From<Difficulty> for u8 {
  fn from(d: Difficulty) -> u8 {
    d.level()
  }
}

impl std::fmt::Display for Difficulty {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.level())
  }
}

/// Canonical question shape returned to the game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
  pub word: String,
  pub category: String,
  pub correct: String,
  pub distractors: [String; 3],
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub level: Option<u8>,
}

/// What the provider is being asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuizKind {
  /// A full game: `count` questions with distinct words.
  Game,
  /// One question whose word is not in the caller's used list.
  Word,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn difficulty_accepts_only_integer_tiers() {
    assert_eq!(Difficulty::from_json(&json!(2)).unwrap(), Difficulty::Intermedio);
    for bad in [json!(0), json!(4), json!("2"), json!(null), json!(-1), json!(1.5)] {
      assert!(matches!(Difficulty::from_json(&bad), Err(QuizError::Config(_))), "{bad}");
    }
  }

  #[test]
  fn question_omits_absent_level() {
    let q = QuizQuestion {
      word: "Gioia".into(),
      category: "Emozioni".into(),
      correct: "Sentimento di grande contentezza".into(),
      distractors: ["a".into(), "b".into(), "c".into()],
      level: None,
    };
    let v = serde_json::to_value(&q).unwrap();
    assert!(v.get("level").is_none());
    assert_eq!(v["distractors"], json!(["a", "b", "c"]));
  }
}
