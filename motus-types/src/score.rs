use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One ledger record per (user, day, word).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GuessAttempt {
    pub user_id: String,
    pub nickname: String,
    pub date: String, // YYYY-MM-DD, UTC
    pub word: String,
    pub tries: u32,
    pub score: u8, // 1 once the word has been found
}

impl GuessAttempt {
    pub fn is_won(&self) -> bool {
        self.score == 1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScoreRequest {
    pub user_id: String,
    pub score: u8,
    pub word: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResetScoreRequest {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserScore {
    #[serde(rename = "user_id")]
    pub user_id: String,
    pub total_guessed_words: u32,
    pub average_tries: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LeaderboardEntry {
    #[serde(rename = "user_id")]
    pub user_id: String,
    pub nickname: String,
    pub total_guessed_words: u32,
    pub average_tries: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Leaderboards {
    pub leaderboard_by_total: Vec<LeaderboardEntry>,
    pub leaderboard_by_average: Vec<LeaderboardEntry>,
}
