//! Public entry point: authenticates callers, provisions their profile on
//! first sight, exposes `/api/*` and proxies everything else to front.

pub mod metrics;
pub mod proxy;
pub mod rate_limiter;

use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{error, info, warn};
use warp::hyper::body::Bytes;
use warp::path::FullPath;
use warp::{Filter, Rejection, Reply};

use motus_types::{
    CreateUserRequest, GuessRequest, GuessResponse, Identity, Leaderboards, MessageResponse,
    ResetScoreRequest, SeedResponse, SetSeedRequest, UserScore, WordResponse,
};

use crate::auth::{AuthService, bearer_token};
use crate::clients::{GameApi, ScoreLedger, UserDirectory};
use crate::error::{ApiError, handle_rejection, reply};
use crate::identity::IdentityCodec;
use crate::user_path::UserIdSegment;

pub use metrics::LeaderboardMetrics;
pub use proxy::{FrontProxy, ProxyRequest};
pub use rate_limiter::RateLimiter;

const PROVISIONING_FAILED: &str = "An error occurred on user authentication.";

pub struct Gateway {
    auth: Arc<AuthService>,
    identity: Arc<IdentityCodec>,
    game: Arc<dyn GameApi>,
    scores: Arc<dyn ScoreLedger>,
    users: Arc<dyn UserDirectory>,
    proxy: FrontProxy,
    limiter: RateLimiter,
    metrics: LeaderboardMetrics,
}

impl Gateway {
    pub fn new(
        auth: Arc<AuthService>,
        identity: Arc<IdentityCodec>,
        game: Arc<dyn GameApi>,
        scores: Arc<dyn ScoreLedger>,
        users: Arc<dyn UserDirectory>,
        proxy: FrontProxy,
        limiter: RateLimiter,
    ) -> Self {
        Self {
            auth,
            identity,
            game,
            scores,
            users,
            proxy,
            limiter,
            metrics: LeaderboardMetrics::new(),
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Authenticate if a token is present. Invalid tokens count as anonymous.
    async fn identify(&self, token: Option<String>) -> Result<Option<Identity>, ApiError> {
        let Some(token) = token else {
            return Ok(None);
        };

        match self.auth.validate_token(&token).await {
            Ok(identity) => {
                self.ensure_profile(&identity).await?;
                Ok(Some(identity))
            }
            Err(e) => {
                warn!("Ignoring invalid credentials: {}", e);
                Ok(None)
            }
        }
    }

    async fn require_identity(&self, token: Option<String>) -> Result<Identity, ApiError> {
        self.identify(token)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
    }

    /// Create the user's profile with a fresh seed the first time they show up.
    async fn ensure_profile(&self, identity: &Identity) -> Result<(), ApiError> {
        let missing = match self.users.get_nickname(&identity.user_id).await {
            Ok(_) => false,
            Err(e) if e.is_not_found() => true,
            Err(e) => return Err(self.provisioning_failed(identity, e)),
        };
        if !missing {
            return Ok(());
        }

        let seed = self
            .game
            .generate_seed()
            .await
            .map_err(|e| self.provisioning_failed(identity, e))?
            .seed;

        self.users
            .create_user(&CreateUserRequest {
                user_id: identity.user_id.clone(),
                nickname: identity.nickname.clone(),
                seed,
            })
            .await
            .map_err(|e| self.provisioning_failed(identity, e))?;

        info!("Provisioned profile for {}", identity.user_id);
        Ok(())
    }

    fn provisioning_failed(&self, identity: &Identity, err: ApiError) -> ApiError {
        error!("User authentication failed for {}: {}", identity.user_id, err);
        ApiError::Internal(PROVISIONING_FAILED.to_string())
    }

    pub async fn get_seed(
        &self,
        token: Option<String>,
        requested: Option<String>,
    ) -> Result<SeedResponse, ApiError> {
        let identity = self.require_identity(token).await?;
        let user_id = identity.target_user(requested.as_deref());
        self.game.get_seed(&user_id).await
    }

    pub async fn set_seed(
        &self,
        token: Option<String>,
        body: &[u8],
    ) -> Result<MessageResponse, ApiError> {
        let identity = self.require_identity(token).await?;
        let mut request: SetSeedRequest = parse_body(body)?;
        request.user_id = Some(identity.target_user(request.user_id.as_deref()));
        self.game.set_seed(&request).await
    }

    pub async fn get_word(
        &self,
        token: Option<String>,
        requested: Option<String>,
    ) -> Result<WordResponse, ApiError> {
        let identity = self.require_identity(token).await?;
        let user_id = identity.target_user(requested.as_deref());
        self.game.get_word(&user_id).await
    }

    pub async fn get_score(
        &self,
        token: Option<String>,
        requested: Option<String>,
    ) -> Result<UserScore, ApiError> {
        let identity = self.require_identity(token).await?;
        let user_id = identity.target_user(requested.as_deref());
        self.scores.user_score(&user_id).await
    }

    pub async fn guess(
        &self,
        token: Option<String>,
        client_ip: IpAddr,
        body: &[u8],
    ) -> Result<GuessResponse, ApiError> {
        let identity = self.require_identity(token).await?;

        if !self.limiter.check(client_ip) {
            warn!(
                "Too many requests from {} (user {})",
                client_ip, identity.user_id
            );
            return Err(ApiError::RateLimited);
        }

        let mut request: GuessRequest = parse_body(body)?;
        request.user_id = Some(identity.target_user(request.user_id.as_deref()));
        self.game.guess(&request).await
    }

    pub async fn reset_score(
        &self,
        token: Option<String>,
        body: &[u8],
    ) -> Result<MessageResponse, ApiError> {
        let identity = self.require_identity(token).await?;
        let request: ResetScoreRequest = parse_body(body)?;
        let user_id = identity.target_user(request.user_id.as_deref());

        let response = self.scores.reset(&user_id).await?;
        warn!("User {} reset the scores of {}", identity.user_id, user_id);
        Ok(response)
    }

    pub async fn leaderboard(&self) -> Result<Leaderboards, ApiError> {
        self.metrics.record_request();
        let result = self.scores.leaderboard().await;
        if result.is_err() {
            self.metrics.record_error();
        }
        result
    }

    pub fn scrape_metrics(&self) -> String {
        self.metrics.scrape()
    }

    /// Forward a page request to front. `/front/*` is served without the
    /// prefix; `/score` needs a signed-in user.
    pub async fn forward_to_front(
        &self,
        mut request: ProxyRequest,
        token: Option<String>,
    ) -> warp::reply::Response {
        let asset_path = request
            .path
            .strip_prefix("/front")
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
            .map(|rest| (if rest.is_empty() { "/" } else { rest }).to_string());
        if let Some(path) = asset_path {
            request.path = path;
            return self.proxy.forward(request, None).await;
        }

        let identity = match self.identify(token).await {
            Ok(identity) => identity,
            Err(e) => return e.into_response(),
        };

        if request.path == "/score" && identity.is_none() {
            return ApiError::Unauthorized("Authentication required".to_string()).into_response();
        }

        let signed = identity.as_ref().and_then(|identity| {
            self.identity
                .sign(identity)
                .map_err(|e| error!("Failed to sign identity for {}: {}", identity.user_id, e))
                .ok()
        });

        self.proxy.forward(request, signed.as_deref()).await
    }
}

/// An empty body means "all defaults"; anything else must be valid JSON.
fn parse_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    serde_json::from_slice(body)
        .map_err(|e| ApiError::InvalidInput(format!("Invalid request body: {}", e)))
}

fn with_token() -> impl Filter<Extract = (Option<String>,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and(warp::cookie::optional::<String>("appSession"))
        .map(|authorization: Option<String>, session: Option<String>| {
            bearer_token(authorization.as_deref(), session.as_deref())
        })
}

pub fn create_routes(
    gateway: Arc<Gateway>,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let gateway_filter = warp::any().map({
        let gateway = gateway.clone();
        move || gateway.clone()
    });

    // `/api/seed` and `/api/seed/{user_id}` share one handler
    let seed_target = warp::path!("api" / "seed" / UserIdSegment)
        .map(|user_id: UserIdSegment| Some(user_id.into_inner()))
        .or(warp::path!("api" / "seed").map(|| None))
        .unify();
    let word_target = warp::path!("api" / "word" / UserIdSegment)
        .map(|user_id: UserIdSegment| Some(user_id.into_inner()))
        .or(warp::path!("api" / "word").map(|| None))
        .unify();
    let score_target = warp::path!("api" / "score" / UserIdSegment)
        .map(|user_id: UserIdSegment| Some(user_id.into_inner()))
        .or(warp::path!("api" / "score").map(|| None))
        .unify();

    let get_seed = seed_target
        .and(warp::get())
        .and(with_token())
        .and(gateway_filter.clone())
        .and_then(handle_get_seed);

    let set_seed = warp::path!("api" / "seed")
        .and(warp::post())
        .and(with_token())
        .and(warp::body::bytes())
        .and(gateway_filter.clone())
        .and_then(handle_set_seed);

    let get_word = word_target
        .and(warp::get())
        .and(with_token())
        .and(gateway_filter.clone())
        .and_then(handle_get_word);

    let get_score = score_target
        .and(warp::get())
        .and(with_token())
        .and(gateway_filter.clone())
        .and_then(handle_get_score);

    let guess = warp::path!("api" / "guess")
        .and(warp::post())
        .and(with_token())
        .and(warp::addr::remote())
        .and(warp::body::bytes())
        .and(gateway_filter.clone())
        .and_then(handle_guess);

    let reset_score = warp::path!("api" / "reset-score")
        .and(warp::post())
        .and(with_token())
        .and(warp::body::bytes())
        .and(gateway_filter.clone())
        .and_then(handle_reset_score);

    let leaderboard = warp::path!("api" / "leaderboard")
        .and(warp::get())
        .and(gateway_filter.clone())
        .and_then(handle_leaderboard);

    let metrics = warp::path!("api" / "metrics")
        .and(warp::get())
        .and(gateway_filter.clone())
        .map(|gateway: Arc<Gateway>| gateway.scrape_metrics());

    let query = warp::query::raw()
        .map(Some)
        .or(warp::any().map(|| None))
        .unify();

    // Everything else belongs to the front service
    let front = warp::method()
        .and(warp::path::full())
        .and(query)
        .and(warp::header::headers_cloned())
        .and(warp::body::bytes())
        .and(with_token())
        .and(gateway_filter.clone())
        .and_then(handle_front);

    get_seed
        .or(set_seed)
        .or(get_word)
        .or(get_score)
        .or(guess)
        .or(reset_score)
        .or(leaderboard)
        .or(metrics)
        .or(front)
        .recover(handle_rejection)
        .with(warp::log("motus::gateway"))
}

async fn handle_get_seed(
    requested: Option<String>,
    token: Option<String>,
    gateway: Arc<Gateway>,
) -> Result<impl Reply, Rejection> {
    Ok(reply(gateway.get_seed(token, requested).await))
}

async fn handle_set_seed(
    token: Option<String>,
    body: Bytes,
    gateway: Arc<Gateway>,
) -> Result<impl Reply, Rejection> {
    Ok(reply(gateway.set_seed(token, &body).await))
}

async fn handle_get_word(
    requested: Option<String>,
    token: Option<String>,
    gateway: Arc<Gateway>,
) -> Result<impl Reply, Rejection> {
    Ok(reply(gateway.get_word(token, requested).await))
}

async fn handle_get_score(
    requested: Option<String>,
    token: Option<String>,
    gateway: Arc<Gateway>,
) -> Result<impl Reply, Rejection> {
    Ok(reply(gateway.get_score(token, requested).await))
}

async fn handle_guess(
    token: Option<String>,
    remote: Option<SocketAddr>,
    body: Bytes,
    gateway: Arc<Gateway>,
) -> Result<impl Reply, Rejection> {
    let client_ip = remote
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    Ok(reply(gateway.guess(token, client_ip, &body).await))
}

async fn handle_reset_score(
    token: Option<String>,
    body: Bytes,
    gateway: Arc<Gateway>,
) -> Result<impl Reply, Rejection> {
    Ok(reply(gateway.reset_score(token, &body).await))
}

async fn handle_leaderboard(gateway: Arc<Gateway>) -> Result<impl Reply, Rejection> {
    Ok(reply(gateway.leaderboard().await))
}

async fn handle_front(
    method: warp::http::Method,
    path: FullPath,
    query: Option<String>,
    headers: warp::http::HeaderMap,
    body: Bytes,
    token: Option<String>,
    gateway: Arc<Gateway>,
) -> Result<impl Reply, Rejection> {
    let request = ProxyRequest {
        method,
        path: path.as_str().to_string(),
        query,
        headers,
        body,
    };
    Ok(gateway.forward_to_front(request, token).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_body_defaults_on_empty() {
        let request: GuessRequest = parse_body(b"").unwrap();
        assert_eq!(request.user_id, None);
        assert_eq!(request.guess, "");

        let request: ResetScoreRequest = parse_body(b"  \n").unwrap();
        assert_eq!(request.user_id, None);
    }

    #[test]
    fn test_parse_body_reads_json() {
        let request: GuessRequest = parse_body(br#"{"guess":"chat"}"#).unwrap();
        assert_eq!(request.guess, "chat");

        let err = parse_body::<GuessRequest>(b"{guess").unwrap_err();
        assert_eq!(err.status(), warp::http::StatusCode::BAD_REQUEST);
    }
}
