use std::convert::Infallible;
use std::sync::Arc;

use async_trait::async_trait;
use warp::{Filter, Rejection, Reply};

use motus_persistence::repositories::UserRepository;
use motus_types::{CreateUserRequest, MessageResponse, NicknameResponse, SeedResponse, StoreSeedRequest};

use crate::clients::UserDirectory;
use crate::error::{ApiError, handle_rejection, reply};
use crate::user_path::UserIdSegment;

const USER_NOT_FOUND: &str = "User not found";

fn user_not_found() -> ApiError {
    ApiError::NotFound(USER_NOT_FOUND.to_string())
}

#[async_trait]
impl UserDirectory for UserRepository {
    async fn get_seed(&self, user_id: &str) -> Result<u64, ApiError> {
        match UserRepository::get_seed(self, user_id).await {
            Ok(Some(seed)) => Ok(seed),
            Ok(None) => Err(user_not_found()),
            Err(err) => Err(ApiError::internal("Error getting seed", err)),
        }
    }

    async fn set_seed(&self, user_id: &str, seed: u64) -> Result<(), ApiError> {
        match UserRepository::set_seed(self, user_id, seed).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(user_not_found()),
            Err(err) => Err(ApiError::internal("Error setting seed", err)),
        }
    }

    async fn get_nickname(&self, user_id: &str) -> Result<String, ApiError> {
        match UserRepository::get_nickname(self, user_id).await {
            Ok(Some(nickname)) => Ok(nickname),
            Ok(None) => Err(user_not_found()),
            Err(err) => Err(ApiError::internal("Error getting nickname", err)),
        }
    }

    async fn create_user(&self, user: &CreateUserRequest) -> Result<(), ApiError> {
        UserRepository::create_user(self, &user.user_id, &user.nickname, user.seed)
            .await
            .map(|_| ())
            .map_err(|err| ApiError::internal("Error creating user", err))
    }
}

pub fn create_routes(
    users: Arc<dyn UserDirectory>,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let users_filter = warp::any().map({
        let users = users.clone();
        move || users.clone()
    });

    let get_seed = warp::path!("seed" / UserIdSegment)
        .and(warp::get())
        .and(users_filter.clone())
        .and_then(handle_get_seed);

    let set_seed = warp::path!("seed")
        .and(warp::post())
        .and(warp::body::json())
        .and(users_filter.clone())
        .and_then(handle_set_seed);

    let nickname = warp::path!("nickname" / UserIdSegment)
        .and(warp::get())
        .and(users_filter.clone())
        .and_then(handle_get_nickname);

    let create_user = warp::path!("user")
        .and(warp::post())
        .and(warp::body::json())
        .and(users_filter.clone())
        .and_then(handle_create_user);

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    get_seed
        .or(set_seed)
        .or(nickname)
        .or(create_user)
        .or(health)
        .recover(handle_rejection)
        .with(warp::log("motus::users"))
}

async fn handle_get_seed(
    user_id: UserIdSegment,
    users: Arc<dyn UserDirectory>,
) -> Result<impl Reply, Rejection> {
    let result = users.get_seed(&user_id.into_inner()).await;
    Ok(reply(result.map(|seed| SeedResponse { seed })))
}

async fn handle_set_seed(
    request: StoreSeedRequest,
    users: Arc<dyn UserDirectory>,
) -> Result<impl Reply, Rejection> {
    let result = users.set_seed(&request.user_id, request.seed).await;
    if let Err(err) = &result {
        tracing::warn!("Failed to store seed for {}: {}", request.user_id, err);
    }
    Ok(reply(
        result.map(|()| MessageResponse::new("Seed set successfully")),
    ))
}

async fn handle_get_nickname(
    user_id: UserIdSegment,
    users: Arc<dyn UserDirectory>,
) -> Result<impl Reply, Rejection> {
    let result = users.get_nickname(&user_id.into_inner()).await;
    Ok(reply(result.map(|nickname| NicknameResponse { nickname })))
}

async fn handle_create_user(
    request: CreateUserRequest,
    users: Arc<dyn UserDirectory>,
) -> Result<impl Reply, Rejection> {
    if request.user_id.is_empty() || request.nickname.is_empty() {
        return Ok(reply::<MessageResponse>(Err(ApiError::InvalidInput(
            "user_id and nickname are required".to_string(),
        ))));
    }

    let result = users.create_user(&request).await;
    if result.is_ok() {
        tracing::info!("Created user {}", request.user_id);
    }
    Ok(reply(
        result.map(|()| MessageResponse::new("User created successfully")),
    ))
}
