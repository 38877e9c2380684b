use std::convert::Infallible;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use warp::{Filter, Rejection, Reply};

use motus_core::{ScoringEngine, WordList, generate_seed};
use motus_types::{
    GuessRequest, GuessResponse, MessageResponse, ScoreRequest, SeedInput, SeedResponse,
    SetSeedRequest, WordResponse,
};

use crate::clients::{GameApi, ScoreLedger, UserDirectory};
use crate::error::{ApiError, handle_rejection, reply};
use crate::user_path::UserIdSegment;

pub const WIN_MESSAGE: &str = "Congratulations, you have won!";
pub const LOSE_MESSAGE: &str = "Sorry, you have lost. Better luck next time!";

/// Owns the word list; seeds live in the users service and attempts in
/// the score service.
pub struct GameService {
    words: Arc<WordList>,
    users: Arc<dyn UserDirectory>,
    scores: Arc<dyn ScoreLedger>,
}

impl GameService {
    pub fn new(
        words: Arc<WordList>,
        users: Arc<dyn UserDirectory>,
        scores: Arc<dyn ScoreLedger>,
    ) -> Self {
        Self {
            words,
            users,
            scores,
        }
    }

    pub fn words(&self) -> &WordList {
        &self.words
    }

    async fn word_for(&self, user_id: &str) -> Result<String, ApiError> {
        let seed = self.users.get_seed(user_id).await?;
        Ok(self.words.select(seed).to_string())
    }

    async fn reseed(&self, user_id: &str, source: Option<&str>) -> Result<u64, ApiError> {
        let seed = generate_seed(source);
        self.users.set_seed(user_id, seed).await?;
        Ok(seed)
    }
}

fn required_user(user_id: Option<&str>) -> Result<&str, ApiError> {
    match user_id {
        Some(user_id) if !user_id.is_empty() => Ok(user_id),
        _ => Err(ApiError::InvalidInput("Missing user_id".to_string())),
    }
}

#[async_trait]
impl GameApi for GameService {
    async fn get_seed(&self, user_id: &str) -> Result<SeedResponse, ApiError> {
        let seed = self.users.get_seed(user_id).await?;
        Ok(SeedResponse { seed })
    }

    async fn set_seed(&self, request: &SetSeedRequest) -> Result<MessageResponse, ApiError> {
        let user_id = required_user(request.user_id.as_deref())?;
        let source = request.seed.as_ref().and_then(SeedInput::source);

        self.reseed(user_id, source.as_deref()).await?;
        Ok(MessageResponse::new("Seed set successfully"))
    }

    async fn get_word(&self, user_id: &str) -> Result<WordResponse, ApiError> {
        let word = self.word_for(user_id).await?;
        Ok(WordResponse { word })
    }

    async fn guess(&self, request: &GuessRequest) -> Result<GuessResponse, ApiError> {
        let user_id = required_user(request.user_id.as_deref())?;

        // Cheap checks first, so bad guesses never reach the users service
        ScoringEngine::validate_guess(&request.guess, &self.words)?;

        let target = self.word_for(user_id).await?;
        let evaluation = ScoringEngine::evaluate_guess(&request.guess, &target, &self.words)?;

        self.scores
            .record(&ScoreRequest {
                user_id: user_id.to_string(),
                score: u8::from(evaluation.won),
                word: target,
            })
            .await?;

        if !evaluation.won {
            return Ok(GuessResponse {
                won: false,
                result: evaluation.result,
                message: LOSE_MESSAGE.to_string(),
            });
        }

        self.reseed(user_id, None).await?;
        info!("User {} won", user_id);

        Ok(GuessResponse {
            won: true,
            result: evaluation.result,
            message: WIN_MESSAGE.to_string(),
        })
    }

    async fn generate_seed(&self) -> Result<SeedResponse, ApiError> {
        Ok(SeedResponse {
            seed: generate_seed(None),
        })
    }
}

pub fn create_routes(
    game: Arc<GameService>,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let game_filter = warp::any().map({
        let game = game.clone();
        move || game.clone()
    });

    let get_seed = warp::path!("seed" / UserIdSegment)
        .and(warp::get())
        .and(game_filter.clone())
        .and_then(handle_get_seed);

    let set_seed = warp::path!("seed")
        .and(warp::post())
        .and(warp::body::json())
        .and(game_filter.clone())
        .and_then(handle_set_seed);

    let get_word = warp::path!("word" / UserIdSegment)
        .and(warp::get())
        .and(game_filter.clone())
        .and_then(handle_get_word);

    let guess = warp::path!("guess")
        .and(warp::post())
        .and(warp::body::json())
        .and(game_filter.clone())
        .and_then(handle_guess);

    let new_seed = warp::path!("generateSeed")
        .and(warp::get())
        .and(game_filter.clone())
        .and_then(handle_generate_seed);

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    get_seed
        .or(set_seed)
        .or(get_word)
        .or(guess)
        .or(new_seed)
        .or(health)
        .recover(handle_rejection)
        .with(warp::log("motus::game"))
}

async fn handle_get_seed(
    user_id: UserIdSegment,
    game: Arc<GameService>,
) -> Result<impl Reply, Rejection> {
    Ok(reply(game.get_seed(&user_id.into_inner()).await))
}

async fn handle_set_seed(
    request: SetSeedRequest,
    game: Arc<GameService>,
) -> Result<impl Reply, Rejection> {
    Ok(reply(game.set_seed(&request).await))
}

async fn handle_get_word(
    user_id: UserIdSegment,
    game: Arc<GameService>,
) -> Result<impl Reply, Rejection> {
    Ok(reply(game.get_word(&user_id.into_inner()).await))
}

async fn handle_guess(
    request: GuessRequest,
    game: Arc<GameService>,
) -> Result<impl Reply, Rejection> {
    let result = game.guess(&request).await;
    if let Err(err) = &result {
        tracing::debug!("Guess rejected: {}", err);
    }
    Ok(reply(result))
}

async fn handle_generate_seed(game: Arc<GameService>) -> Result<impl Reply, Rejection> {
    Ok(reply(game.generate_seed().await))
}
