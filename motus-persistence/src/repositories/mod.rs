pub mod score_repository;
pub mod user_repository;

pub use score_repository::{
    AttemptKey, MemoryScoreStore, RecordOutcome, RedisScoreStore, ScoreStore,
};
pub use user_repository::UserRepository;
