//! Server-rendered pages. The caller's identity only ever arrives as a
//! gateway-signed token; anything else is treated as anonymous.

pub mod pages;

use std::convert::Infallible;
use std::sync::Arc;

use futures_util::future::try_join;
use tracing::error;
use warp::path::FullPath;
use warp::{Filter, Rejection, Reply};

use motus_types::Identity;

use crate::clients::{GameApi, ScoreLedger};
use crate::error::{ApiError, handle_rejection};
use crate::identity::{IDENTITY_HEADER, IdentityCodec};

pub struct FrontService {
    game: Arc<dyn GameApi>,
    scores: Arc<dyn ScoreLedger>,
}

impl FrontService {
    pub fn new(game: Arc<dyn GameApi>, scores: Arc<dyn ScoreLedger>) -> Self {
        Self { game, scores }
    }

    pub async fn home(&self, identity: Option<&Identity>) -> Result<String, ApiError> {
        let Some(identity) = identity else {
            return Ok(pages::landing());
        };

        let (seed, word) = try_join(
            self.game.get_seed(&identity.user_id),
            self.game.get_word(&identity.user_id),
        )
        .await?;

        Ok(pages::board(identity, seed.seed, word.word.chars().count()))
    }

    pub async fn score(&self, identity: Option<&Identity>) -> Result<String, ApiError> {
        let identity = identity
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;
        let score = self.scores.user_score(&identity.user_id).await?;
        Ok(pages::score(identity, &score))
    }

    pub async fn leaderboard(&self, identity: Option<&Identity>) -> Result<String, ApiError> {
        let boards = self.scores.leaderboard().await?;
        Ok(pages::leaderboard(identity, &boards))
    }
}

fn html_reply(result: Result<String, ApiError>) -> warp::reply::Response {
    match result {
        Ok(html) => warp::reply::html(html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn create_routes(
    front: Arc<FrontService>,
    codec: Arc<IdentityCodec>,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let front_filter = warp::any().map({
        let front = front.clone();
        move || front.clone()
    });

    let identity = warp::header::optional::<String>(IDENTITY_HEADER).map({
        let codec = codec.clone();
        move |token: Option<String>| token.and_then(|token| codec.verify(&token))
    });

    let home = warp::path::end()
        .and(warp::get())
        .and(identity.clone())
        .and(front_filter.clone())
        .and_then(handle_home);

    let score = warp::path!("score")
        .and(warp::get())
        .and(identity.clone())
        .and(front_filter.clone())
        .and_then(handle_score);

    let leaderboard = warp::path!("leaderboard")
        .and(warp::get())
        .and(identity.clone())
        .and(front_filter.clone())
        .and_then(handle_leaderboard);

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    let not_found = warp::path::full()
        .and(identity.clone())
        .map(|path: FullPath, identity: Option<Identity>| {
            let user = identity
                .as_ref()
                .map(|identity| identity.user_id.as_str())
                .unwrap_or("none");
            error!("URL not found: {} (user {})", path.as_str(), user);
            warp::reply::with_status(
                warp::reply::html(pages::not_found(identity.as_ref())),
                warp::http::StatusCode::NOT_FOUND,
            )
        });

    home.or(score)
        .or(leaderboard)
        .or(health)
        .or(not_found)
        .recover(handle_rejection)
        .with(warp::log("motus::front"))
}

async fn handle_home(
    identity: Option<Identity>,
    front: Arc<FrontService>,
) -> Result<impl Reply, Rejection> {
    Ok(html_reply(front.home(identity.as_ref()).await))
}

async fn handle_score(
    identity: Option<Identity>,
    front: Arc<FrontService>,
) -> Result<impl Reply, Rejection> {
    Ok(html_reply(front.score(identity.as_ref()).await))
}

async fn handle_leaderboard(
    identity: Option<Identity>,
    front: Arc<FrontService>,
) -> Result<impl Reply, Rejection> {
    Ok(html_reply(front.leaderboard(identity.as_ref()).await))
}
