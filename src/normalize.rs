//! Mapping provider-specific (Italian/English) field names onto `QuizQuestion`.
//!
//! Each canonical field has an ordered alias list; `resolve` returns the first
//! alias holding a usable value. Single questions are validated strictly. In a
//! batch, invalid entries are dropped and the quota gate reports the shortfall.

use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::QuizQuestion;
use crate::error::QuizError;

pub const WORD_ALIASES: &[&str] = &["word", "parola"];
pub const CATEGORY_ALIASES: &[&str] = &["category", "categoria"];
pub const CORRECT_ALIASES: &[&str] = &["correct", "corretta", "definizione"];
pub const DISTRACTOR_ALIASES: &[&str] = &["distractors", "distrattori"];
pub const LEVEL_ALIASES: &[&str] = &["level", "livello"];

/// Keys under which a batch may be wrapped when the model must return an object.
pub const BATCH_ALIASES: &[&str] = &["questions", "domande", "quiz", "items", "data"];

pub const DISTRACTOR_COUNT: usize = 3;

fn is_truthy(v: &Value) -> bool {
  match v {
    Value::Null | Value::Bool(false) => false,
    Value::String(s) => !s.trim().is_empty(),
    Value::Array(a) => !a.is_empty(),
    _ => true,
  }
}

/// First alias in `aliases` whose value is present and non-empty.
pub fn resolve<'a>(obj: &'a Value, aliases: &[&str]) -> Option<&'a Value> {
  aliases.iter().filter_map(|k| obj.get(*k)).find(|v| is_truthy(v))
}

fn required_text(obj: &Value, aliases: &[&str]) -> Result<String, QuizError> {
  match resolve(obj, aliases) {
    Some(Value::String(s)) => Ok(s.trim().to_string()),
    Some(other) => Err(QuizError::Validation(format!("{} is not a string: {other}", aliases[0]))),
    None => Err(QuizError::Validation(format!("missing {}", aliases[0]))),
  }
}

fn distractors(obj: &Value, correct: &str) -> Result<[String; DISTRACTOR_COUNT], QuizError> {
  let list = match resolve(obj, DISTRACTOR_ALIASES) {
    Some(Value::Array(items)) => items,
    Some(_) => return Err(QuizError::Validation("distractors is not a list".into())),
    None => return Err(QuizError::Validation("missing distractors".into())),
  };
  if list.len() < DISTRACTOR_COUNT {
    return Err(QuizError::Validation(format!(
      "expected {DISTRACTOR_COUNT} distractors, got {}",
      list.len()
    )));
  }

  let mut out: [String; DISTRACTOR_COUNT] = Default::default();
  for (slot, item) in out.iter_mut().zip(list) {
    let text = item.as_str().map(str::trim).unwrap_or_default();
    if text.is_empty() {
      return Err(QuizError::Validation(format!("empty or non-string distractor: {item}")));
    }
    if text == correct {
      return Err(QuizError::Validation("distractor repeats the correct definition".into()));
    }
    *slot = text.to_string();
  }
  Ok(out)
}

fn level(obj: &Value) -> Option<u8> {
  let raw = resolve(obj, LEVEL_ALIASES)?;
  match raw.as_u64() {
    Some(n @ 1..=3) => Some(n as u8),
    _ => {
      debug!(target: "quiz", level = %raw, "Ignoring out-of-range level");
      None
    }
  }
}

/// Normalize one decoded question; any missing or malformed field is a `Validation` error.
pub fn normalize_question(value: &Value) -> Result<QuizQuestion, QuizError> {
  if !value.is_object() {
    return Err(QuizError::Validation(format!("expected an object, got {value}")));
  }
  let word = required_text(value, WORD_ALIASES)?;
  let category = required_text(value, CATEGORY_ALIASES)?;
  let correct = required_text(value, CORRECT_ALIASES)?;
  let distractors = distractors(value, &correct)?;

  Ok(QuizQuestion { word, category, correct, distractors, level: level(value) })
}

/// Normalize a batch payload, dropping invalid entries.
///
/// Accepts a bare array or an object wrapping one under a `BATCH_ALIASES` key.
/// A lone question object is treated as a batch of one.
pub fn normalize_batch(value: &Value) -> Result<Vec<QuizQuestion>, QuizError> {
  let items: Vec<&Value> = match value {
    Value::Array(items) => items.iter().collect(),
    Value::Object(_) => match resolve(value, BATCH_ALIASES) {
      Some(Value::Array(items)) => items.iter().collect(),
      Some(other) => {
        return Err(QuizError::Validation(format!("batch wrapper is not a list: {other}")))
      }
      None if resolve(value, WORD_ALIASES).is_some() => vec![value],
      None => return Err(QuizError::Validation("no question list in response".into())),
    },
    other => return Err(QuizError::Validation(format!("expected a list of questions, got {other}"))),
  };

  let mut out = Vec::with_capacity(items.len());
  for (index, item) in items.into_iter().enumerate() {
    match normalize_question(item) {
      Ok(q) => out.push(q),
      Err(e) => warn!(target: "quiz", index, error = %e, "Dropping invalid question from batch"),
    }
  }
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn italian() -> Value {
    json!({
      "parola": "Gioia",
      "categoria": "Emozioni",
      "corretta": "Sentimento di viva contentezza",
      "distrattori": ["Tristezza profonda", "Rabbia improvvisa", "Paura del buio"]
    })
  }

  #[test]
  fn resolves_italian_aliases_to_canonical_shape() {
    let q = normalize_question(&italian()).unwrap();
    assert_eq!(q.word, "Gioia");
    assert_eq!(q.category, "Emozioni");
    assert_eq!(q.correct, "Sentimento di viva contentezza");
    assert_eq!(q.distractors[2], "Paura del buio");
    assert_eq!(q.level, None);
  }

  #[test]
  fn primary_alias_wins_and_empty_primary_falls_back() {
    let v = json!({
      "word": "Vento", "parola": "Pioggia",
      "category": "", "categoria": "Natura",
      "correct": "Aria in movimento", "definizione": "altro",
      "distractors": ["x", "y", "z"], "level": 2
    });
    let q = normalize_question(&v).unwrap();
    assert_eq!(q.word, "Vento");
    assert_eq!(q.category, "Natura");
    assert_eq!(q.correct, "Aria in movimento");
    assert_eq!(q.level, Some(2));
  }

  #[test]
  fn definizione_is_accepted_for_correct() {
    let mut v = italian();
    let obj = v.as_object_mut().unwrap();
    let correct = obj.remove("corretta").unwrap();
    obj.insert("definizione".into(), correct);
    assert!(normalize_question(&v).is_ok());
  }

  #[test]
  fn missing_required_fields_fail_validation() {
    for field in ["parola", "categoria", "corretta", "distrattori"] {
      let mut v = italian();
      v.as_object_mut().unwrap().remove(field);
      assert!(matches!(normalize_question(&v), Err(QuizError::Validation(_))), "without {field}");
    }
    let mut blank = italian();
    blank["parola"] = json!("   ");
    assert!(matches!(normalize_question(&blank), Err(QuizError::Validation(_))));
  }

  #[test]
  fn fewer_than_three_distractors_fail_and_extra_are_truncated() {
    let mut short = italian();
    short["distrattori"] = json!(["a", "b"]);
    assert!(matches!(normalize_question(&short), Err(QuizError::Validation(_))));

    let mut long = italian();
    long["distrattori"] = json!(["a", "b", "c", "d"]);
    assert_eq!(normalize_question(&long).unwrap().distractors, ["a", "b", "c"].map(String::from));
  }

  #[test]
  fn distractor_equal_to_correct_is_rejected() {
    let mut v = italian();
    v["distrattori"] = json!(["a", "Sentimento di viva contentezza", "c"]);
    assert!(matches!(normalize_question(&v), Err(QuizError::Validation(_))));
  }

  #[test]
  fn out_of_range_level_is_dropped() {
    let mut v = italian();
    v["livello"] = json!(7);
    assert_eq!(normalize_question(&v).unwrap().level, None);
  }

  #[test]
  fn batch_drops_invalid_entries_and_unwraps_objects() {
    let wrapped = json!({ "domande": [italian(), {"parola": "Solo"}, italian()] });
    assert_eq!(normalize_batch(&wrapped).unwrap().len(), 2);
    assert_eq!(normalize_batch(&json!([italian()])).unwrap().len(), 1);
    assert!(matches!(normalize_batch(&json!({"foo": 1})), Err(QuizError::Validation(_))));
    assert!(matches!(normalize_batch(&json!("testo")), Err(QuizError::Validation(_))));
  }
}
