//! Offline backend with canned content. Lets a deployment be smoke-tested
//! end to end without credentials or network access.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{GenerationRequest, QuizProvider, RawProviderResponse};
use crate::domain::QuizKind;
use crate::error::QuizError;

const BANK: &[(&str, &str, &str, [&str; 3])] = &[
  ("Gioia", "Emozioni", "Sentimento di viva contentezza", ["Profonda tristezza", "Rabbia improvvisa", "Timore del futuro"]),
  ("Ruscello", "Natura", "Piccolo corso d'acqua", ["Grande lago salato", "Montagna innevata", "Deserto sabbioso"]),
  ("Arbitro", "Sport", "Chi dirige una gara facendo rispettare le regole", ["Chi allena la squadra", "Chi tifa dagli spalti", "Chi cura il campo"]),
  ("Molecola", "Scienza", "Insieme di atomi legati tra loro", ["Unità di misura del tempo", "Tipo di roccia vulcanica", "Organo delle piante"]),
  ("Mestolo", "Cibo", "Grande cucchiaio per servire i liquidi", ["Coltello per il pane", "Pentola a pressione", "Teglia da forno"]),
  ("Affresco", "Arte", "Pittura eseguita su intonaco fresco", ["Statua di marmo", "Disegno a matita", "Fotografia d'epoca"]),
  ("Arcipelago", "Geografia", "Gruppo di isole vicine tra loro", ["Catena di montagne", "Fiume molto lungo", "Pianura coltivata"]),
  ("Nostalgia", "Emozioni", "Desiderio malinconico di ciò che è lontano", ["Paura improvvisa", "Allegria contagiosa", "Noia profonda"]),
  ("Rugiada", "Natura", "Goccioline d'acqua che si formano di notte sulle superfici", ["Vento caldo del sud", "Neve che si scioglie", "Nebbia del mattino"]),
  ("Staffetta", "Sport", "Gara a squadre in cui gli atleti si danno il cambio", ["Salto in lungo", "Lancio del peso", "Corsa a ostacoli singola"]),
];

/// Fixed word returned in single-question mode.
pub const DIAGNOSTIC_WORD: &str = "Diagnosi";

#[derive(Clone, Debug, Default)]
pub struct Diagnostic;

fn bank_entry((word, category, correct, distractors): &(&str, &str, &str, [&str; 3])) -> Value {
  json!({ "word": word, "category": category, "correct": correct, "distractors": distractors })
}

#[async_trait]
impl QuizProvider for Diagnostic {
  fn name(&self) -> &'static str {
    "diagnostic"
  }

  async fn generate(&self, req: &GenerationRequest) -> Result<RawProviderResponse, QuizError> {
    Ok(RawProviderResponse::Structured(match req.kind {
      QuizKind::Word => json!({
        "word": DIAGNOSTIC_WORD,
        "category": "Test Finale",
        "level": req.difficulty.level(),
        "correct": "La struttura del sito funziona",
        "distractors": ["La chiave API funziona", "Errore nel codice", "Problema di hosting"]
      }),
      QuizKind::Game => Value::Array(BANK.iter().take(req.count).map(bank_entry).collect()),
    }))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Difficulty;
  use crate::extract::decode_raw;
  use crate::gates::check_batch;
  use crate::normalize::{normalize_batch, normalize_question};

  fn req(kind: QuizKind, count: usize) -> GenerationRequest {
    GenerationRequest { kind, difficulty: Difficulty::Avanzato, system: String::new(), user: String::new(), count }
  }

  #[tokio::test]
  async fn canned_game_passes_the_quality_gate() {
    let raw = Diagnostic.generate(&req(QuizKind::Game, 10)).await.unwrap();
    let batch = normalize_batch(&decode_raw(raw).unwrap()).unwrap();
    assert_eq!(check_batch(batch, 10).unwrap().len(), 10);
  }

  #[tokio::test]
  async fn canned_word_is_valid_and_carries_level() {
    let raw = Diagnostic.generate(&req(QuizKind::Word, 1)).await.unwrap();
    let q = normalize_question(&decode_raw(raw).unwrap()).unwrap();
    assert_eq!(q.word, DIAGNOSTIC_WORD);
    assert_eq!(q.level, Some(3));
  }
}
