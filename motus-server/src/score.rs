use std::convert::Infallible;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use warp::{Filter, Rejection, Reply};

use motus_core::{compute_leaderboards, summarize_user};
use motus_persistence::repositories::{AttemptKey, RecordOutcome, ScoreStore};
use motus_types::{Leaderboards, MessageResponse, ResetScoreRequest, ScoreRequest, UserScore};

use crate::clients::{ScoreLedger, UserDirectory};
use crate::error::{ApiError, handle_rejection, reply};
use crate::user_path::UserIdSegment;

pub struct ScoreService {
    store: Arc<dyn ScoreStore>,
    users: Arc<dyn UserDirectory>,
}

impl ScoreService {
    pub fn new(store: Arc<dyn ScoreStore>, users: Arc<dyn UserDirectory>) -> Self {
        Self { store, users }
    }
}

#[async_trait]
impl ScoreLedger for ScoreService {
    async fn record(&self, request: &ScoreRequest) -> Result<MessageResponse, ApiError> {
        if request.score > 1 {
            return Err(ApiError::InvalidInput("Invalid score".to_string()));
        }
        if request.word.is_empty() {
            return Err(ApiError::InvalidInput("Missing word".to_string()));
        }

        let nickname = self.users.get_nickname(&request.user_id).await?;
        let key = AttemptKey::today(&request.user_id, &request.word);

        let outcome = self
            .store
            .record_attempt(&key, &nickname, request.score == 1)
            .await
            .map_err(|e| ApiError::internal("Error setting score", e))?;

        match outcome {
            RecordOutcome::AlreadySolved => Err(ApiError::AlreadySolvedToday),
            RecordOutcome::Recorded { tries } => {
                debug!(
                    "Recorded try {} of '{}' for user {}",
                    tries, request.word, request.user_id
                );
                Ok(MessageResponse::new("Score set successfully"))
            }
        }
    }

    async fn user_score(&self, user_id: &str) -> Result<UserScore, ApiError> {
        let attempts = self
            .store
            .attempts_for_user(user_id)
            .await
            .map_err(|e| ApiError::internal("Error getting tries", e))?;

        Ok(summarize_user(user_id, &attempts))
    }

    async fn reset(&self, user_id: &str) -> Result<MessageResponse, ApiError> {
        let removed = self
            .store
            .reset_user(user_id)
            .await
            .map_err(|e| ApiError::internal("Error resetting score", e))?;

        info!("Removed {} score records of user {}", removed, user_id);
        Ok(MessageResponse::new("Score reset successfully"))
    }

    async fn leaderboard(&self) -> Result<Leaderboards, ApiError> {
        let attempts = self
            .store
            .all_attempts()
            .await
            .map_err(|e| ApiError::internal("Error getting leaderboard", e))?;

        Ok(compute_leaderboards(&attempts))
    }
}

pub fn create_routes(
    scores: Arc<ScoreService>,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let scores_filter = warp::any().map({
        let scores = scores.clone();
        move || scores.clone()
    });

    let record = warp::path!("score")
        .and(warp::post())
        .and(warp::body::json())
        .and(scores_filter.clone())
        .and_then(handle_record);

    let user_score = warp::path!("score" / UserIdSegment)
        .and(warp::get())
        .and(scores_filter.clone())
        .and_then(handle_user_score);

    let reset = warp::path!("reset-score")
        .and(warp::post())
        .and(warp::body::json())
        .and(scores_filter.clone())
        .and_then(handle_reset);

    let leaderboard = warp::path!("leaderboard")
        .and(warp::get())
        .and(scores_filter.clone())
        .and_then(handle_leaderboard);

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    record
        .or(user_score)
        .or(reset)
        .or(leaderboard)
        .or(health)
        .recover(handle_rejection)
        .with(warp::log("motus::score"))
}

async fn handle_record(
    request: ScoreRequest,
    scores: Arc<ScoreService>,
) -> Result<impl Reply, Rejection> {
    Ok(reply(scores.record(&request).await))
}

async fn handle_user_score(
    user_id: UserIdSegment,
    scores: Arc<ScoreService>,
) -> Result<impl Reply, Rejection> {
    Ok(reply(scores.user_score(&user_id.into_inner()).await))
}

async fn handle_reset(
    request: ResetScoreRequest,
    scores: Arc<ScoreService>,
) -> Result<impl Reply, Rejection> {
    let result = match request.user_id.as_deref() {
        Some(user_id) if !user_id.is_empty() => scores.reset(user_id).await,
        _ => Err(ApiError::InvalidInput("Missing user_id".to_string())),
    };
    Ok(reply(result))
}

async fn handle_leaderboard(scores: Arc<ScoreService>) -> Result<impl Reply, Rejection> {
    Ok(reply(scores.leaderboard().await))
}
