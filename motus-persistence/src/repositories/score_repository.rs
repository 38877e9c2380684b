//! Attempt ledger: one record per (user, day, word).
//!
//! Redis layout is a hash per record at `stats:{user_id}:{date}:{word}` with
//! the fields `user_id`, `nickname`, `date`, `word`, `tries` and `score`.
//! Identity fields are stored in the hash so reads never have to parse keys.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use redis::{AsyncCommands, Script, aio::ConnectionManager};
use tracing::{info, warn};

use motus_types::GuessAttempt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttemptKey {
    pub user_id: String,
    pub date: String,
    pub word: String,
}

impl AttemptKey {
    pub fn new(user_id: &str, date: &str, word: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            date: date.to_string(),
            word: word.to_string(),
        }
    }

    /// Key for the current UTC day.
    pub fn today(user_id: &str, word: &str) -> Self {
        let date = chrono::Utc::now().format("%Y-%m-%d").to_string();
        Self::new(user_id, &date, word)
    }

    fn redis_key(&self) -> String {
        format!("stats:{}:{}:{}", self.user_id, self.date, self.word)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded { tries: u32 },
    /// The word was already won today; nothing was written.
    AlreadySolved,
}

#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Count one more try for the key and store the outcome, unless the
    /// word is already marked as won.
    async fn record_attempt(
        &self,
        key: &AttemptKey,
        nickname: &str,
        won: bool,
    ) -> Result<RecordOutcome>;

    async fn attempts_for_user(&self, user_id: &str) -> Result<Vec<GuessAttempt>>;

    async fn all_attempts(&self) -> Result<Vec<GuessAttempt>>;

    /// Delete every record of a user. Returns how many were removed.
    async fn reset_user(&self, user_id: &str) -> Result<usize>;
}

/// Check, count and store in one step. Returns the new try count, or -1
/// when the record is already won.
const RECORD_ATTEMPT_SCRIPT: &str = r"
if redis.call('HGET', KEYS[1], 'score') == '1' then
    return -1
end
local tries = redis.call('HINCRBY', KEYS[1], 'tries', 1)
redis.call('HSET', KEYS[1],
    'user_id', ARGV[1], 'nickname', ARGV[2], 'date', ARGV[3],
    'word', ARGV[4], 'score', ARGV[5])
return tries
";

pub struct RedisScoreStore {
    connection: ConnectionManager,
    record_script: Script,
}

impl RedisScoreStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self {
            connection,
            record_script: Script::new(RECORD_ATTEMPT_SCRIPT),
        }
    }

    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let connection = client.get_connection_manager().await?;
        info!("Connected to Redis score store");
        Ok(Self::new(connection))
    }

    fn parse_attempt(key: &str, fields: HashMap<String, String>) -> Option<GuessAttempt> {
        let attempt = (|| {
            Some(GuessAttempt {
                user_id: fields.get("user_id")?.clone(),
                nickname: fields.get("nickname").cloned().unwrap_or_default(),
                date: fields.get("date")?.clone(),
                word: fields.get("word")?.clone(),
                tries: fields.get("tries")?.parse().ok()?,
                score: fields.get("score")?.parse().ok()?,
            })
        })();

        if attempt.is_none() {
            warn!("Skipping malformed score record {}", key);
        }
        attempt
    }

    async fn fetch_matching(&self, pattern: &str) -> Result<Vec<(String, GuessAttempt)>> {
        let mut connection = self.connection.clone();
        let keys: Vec<String> = connection.keys(pattern).await?;

        let mut attempts = Vec::with_capacity(keys.len());
        for key in keys {
            let fields: HashMap<String, String> = connection.hgetall(&key).await?;
            if let Some(attempt) = Self::parse_attempt(&key, fields) {
                attempts.push((key, attempt));
            }
        }
        Ok(attempts)
    }

    async fn fetch_user(&self, user_id: &str) -> Result<Vec<(String, GuessAttempt)>> {
        let mut attempts = self.fetch_matching(&format!("stats:{user_id}:*")).await?;
        // The glob also matches ids that merely start with `user_id:`
        attempts.retain(|(_, attempt)| attempt.user_id == user_id);
        Ok(attempts)
    }
}

#[async_trait]
impl ScoreStore for RedisScoreStore {
    async fn record_attempt(
        &self,
        key: &AttemptKey,
        nickname: &str,
        won: bool,
    ) -> Result<RecordOutcome> {
        let mut connection = self.connection.clone();
        let tries: i64 = self
            .record_script
            .key(key.redis_key())
            .arg(&key.user_id)
            .arg(nickname)
            .arg(&key.date)
            .arg(&key.word)
            .arg(if won { "1" } else { "0" })
            .invoke_async(&mut connection)
            .await?;

        if tries < 0 {
            return Ok(RecordOutcome::AlreadySolved);
        }
        Ok(RecordOutcome::Recorded {
            tries: u32::try_from(tries)?,
        })
    }

    async fn attempts_for_user(&self, user_id: &str) -> Result<Vec<GuessAttempt>> {
        let attempts = self.fetch_user(user_id).await?;
        Ok(attempts.into_iter().map(|(_, attempt)| attempt).collect())
    }

    async fn all_attempts(&self) -> Result<Vec<GuessAttempt>> {
        let attempts = self.fetch_matching("stats:*").await?;
        Ok(attempts.into_iter().map(|(_, attempt)| attempt).collect())
    }

    async fn reset_user(&self, user_id: &str) -> Result<usize> {
        let keys: Vec<String> = self
            .fetch_user(user_id)
            .await?
            .into_iter()
            .map(|(key, _)| key)
            .collect();

        if keys.is_empty() {
            return Ok(0);
        }

        let mut connection = self.connection.clone();
        let removed: usize = connection.del(&keys).await?;
        Ok(removed)
    }
}

/// Process-local ledger for tests and single-node runs.
#[derive(Default)]
pub struct MemoryScoreStore {
    records: DashMap<AttemptKey, GuessAttempt>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScoreStore for MemoryScoreStore {
    async fn record_attempt(
        &self,
        key: &AttemptKey,
        nickname: &str,
        won: bool,
    ) -> Result<RecordOutcome> {
        let mut record = self
            .records
            .entry(key.clone())
            .or_insert_with(|| GuessAttempt {
                user_id: key.user_id.clone(),
                nickname: nickname.to_string(),
                date: key.date.clone(),
                word: key.word.clone(),
                tries: 0,
                score: 0,
            });

        if record.is_won() {
            return Ok(RecordOutcome::AlreadySolved);
        }

        record.tries += 1;
        record.score = u8::from(won);
        record.nickname = nickname.to_string();
        Ok(RecordOutcome::Recorded {
            tries: record.tries,
        })
    }

    async fn attempts_for_user(&self, user_id: &str) -> Result<Vec<GuessAttempt>> {
        Ok(self
            .records
            .iter()
            .filter(|entry| entry.key().user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn all_attempts(&self) -> Result<Vec<GuessAttempt>> {
        Ok(self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn reset_user(&self, user_id: &str) -> Result<usize> {
        let before = self.records.len();
        self.records.retain(|key, _| key.user_id != user_id);
        Ok(before - self.records.len())
    }
}
