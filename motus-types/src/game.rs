use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum LetterStatus {
    Correct,   // Right letter, right position
    Misplaced, // Letter appears elsewhere in the target
    Wrong,     // Letter not in the target
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LetterResult {
    pub letter: String,
    pub status: LetterStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GuessRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub guess: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GuessResponse {
    pub won: bool,
    pub result: Vec<LetterResult>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SeedResponse {
    #[ts(type = "number")]
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WordResponse {
    pub word: String,
}

/// A player-supplied seed source. The front-end sends whatever was typed
/// into the seed box, so both strings and bare numbers are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export)]
pub enum SeedInput {
    Text(String),
    Integer(i64),
}

impl SeedInput {
    /// The string the seed is hashed from. Empty text means "no source".
    pub fn source(&self) -> Option<String> {
        match self {
            SeedInput::Text(text) if text.is_empty() => None,
            SeedInput::Text(text) => Some(text.clone()),
            SeedInput::Integer(value) => Some(value.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SetSeedRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub seed: Option<SeedInput>,
}
