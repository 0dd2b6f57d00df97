//! Acceptance gates applied after normalization.
//!
//! Word comparisons are exact (case-sensitive): "gioia" and "Gioia" are different words.

use std::collections::HashSet;

use crate::domain::QuizQuestion;
use crate::error::QuizError;

/// Batch quality gate: at least `required` questions, all words distinct.
/// On success the batch is cut to exactly `required`.
pub fn check_batch(mut questions: Vec<QuizQuestion>, required: usize) -> Result<Vec<QuizQuestion>, QuizError> {
  if questions.len() < required {
    return Err(QuizError::Quota { found: questions.len(), required });
  }

  let mut seen = HashSet::with_capacity(questions.len());
  let mut repeated: Vec<String> = Vec::new();
  for q in &questions {
    if !seen.insert(q.word.as_str()) && !repeated.contains(&q.word) {
      repeated.push(q.word.clone());
    }
  }
  if !repeated.is_empty() {
    return Err(QuizError::Duplicate { words: repeated });
  }

  questions.truncate(required);
  Ok(questions)
}

/// Exclusion gate for single-question mode.
pub fn check_not_used(question: &QuizQuestion, used_words: &HashSet<String>) -> Result<(), QuizError> {
  if used_words.contains(&question.word) {
    return Err(QuizError::RepeatedWord(question.word.clone()));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn q(word: &str) -> QuizQuestion {
    QuizQuestion {
      word: word.into(),
      category: "Natura".into(),
      correct: format!("definizione di {word}"),
      distractors: ["a".into(), "b".into(), "c".into()],
      level: None,
    }
  }

  fn batch(n: usize) -> Vec<QuizQuestion> {
    (0..n).map(|i| q(&format!("parola{i}"))).collect()
  }

  #[test]
  fn unique_batches_of_ten_or_more_pass() {
    for n in [10, 11, 15] {
      let out = check_batch(batch(n), 10).unwrap();
      assert_eq!(out.len(), 10);
      assert_eq!(out[0].word, "parola0");
    }
  }

  #[test]
  fn any_duplicate_is_rejected() {
    for (i, j) in [(0, 1), (3, 9), (0, 11)] {
      let mut b = batch(12);
      b[j].word = b[i].word.clone();
      match check_batch(b, 10) {
        Err(QuizError::Duplicate { words }) => assert_eq!(words, vec![format!("parola{i}")]),
        other => panic!("expected duplicate error, got {other:?}"),
      }
    }
  }

  #[test]
  fn short_batches_fail_quota() {
    assert!(matches!(check_batch(batch(9), 10), Err(QuizError::Quota { found: 9, required: 10 })));
    assert!(matches!(check_batch(Vec::new(), 10), Err(QuizError::Quota { found: 0, .. })));
  }

  #[test]
  fn case_variants_are_not_duplicates() {
    let mut b = batch(10);
    b[0].word = "Gioia".into();
    b[1].word = "gioia".into();
    assert!(check_batch(b, 10).is_ok());
  }

  #[test]
  fn exclusion_gate_matches_exactly() {
    let used: HashSet<String> = ["Gioia".to_string()].into();
    assert!(matches!(check_not_used(&q("Gioia"), &used), Err(QuizError::RepeatedWord(w)) if w == "Gioia"));
    assert!(check_not_used(&q("gioia"), &used).is_ok());
    assert!(check_not_used(&q("Mare"), &HashSet::new()).is_ok());
  }
}
