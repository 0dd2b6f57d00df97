//! Public HTTP request/response structs (serde ready).
//! Field names follow the game frontend (`usedWords`, camelCase health fields).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `POST getGame` body. `difficulty` stays a raw value so bad input becomes a 400 with our message.
#[derive(Debug, Default, Deserialize)]
pub struct GameIn {
    #[serde(default)]
    pub difficulty: Option<Value>,
}

/// `POST getWord` body.
#[derive(Debug, Default, Deserialize)]
pub struct WordIn {
    #[serde(default)]
    pub difficulty: Option<Value>,
    #[serde(default, rename = "usedWords")]
    pub used_words: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorOut {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthOut {
    pub ok: bool,
    pub game_provider: &'static str,
    pub word_provider: &'static str,
}
