use std::convert::Infallible;

use serde::Serialize;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Rejection, Reply};

use motus_core::GuessError;
use motus_types::MessageResponse;

/// Every failure a service can answer with. The reply body is always
/// `{"message": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    NotFound(String),
    #[error("This word was already guessed today!")]
    AlreadySolvedToday,
    #[error("{0}")]
    Unauthorized(String),
    #[error("Too many requests from this IP, please try again later")]
    RateLimited,
    #[error("Method not allowed")]
    MethodNotAllowed,
    /// A downstream service answered with an error; relayed as is.
    #[error("{message}")]
    Upstream { status: u16, message: String },
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) | ApiError::AlreadySolvedToday => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == StatusCode::NOT_FOUND
    }

    /// Log the underlying failure and answer with `message` only.
    pub fn internal(message: &str, err: impl std::fmt::Display) -> Self {
        tracing::error!("{}: {}", message, err);
        ApiError::Internal(message.to_string())
    }
}

impl Reply for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warp::reply::with_status(
            warp::reply::json(&MessageResponse::new(self.to_string())),
            status,
        )
        .into_response()
    }
}

impl From<GuessError> for ApiError {
    fn from(err: GuessError) -> Self {
        ApiError::InvalidInput(err.to_string())
    }
}

/// JSON body on success, `{message}` with the error's status otherwise.
pub fn reply<T: Serialize>(result: Result<T, ApiError>) -> Response {
    match result {
        Ok(body) => warp::reply::json(&body).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let error = if err.is_not_found() {
        ApiError::NotFound("Not found".to_string())
    } else if let Some(body_error) = err.find::<warp::filters::body::BodyDeserializeError>() {
        ApiError::InvalidInput(body_error.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        ApiError::MethodNotAllowed
    } else if err.find::<warp::reject::MissingHeader>().is_some()
        || err.find::<warp::reject::InvalidHeader>().is_some()
        || err.find::<warp::reject::InvalidQuery>().is_some()
    {
        ApiError::InvalidInput("Invalid request".to_string())
    } else {
        tracing::error!("Unhandled rejection: {:?}", err);
        ApiError::Internal("Internal server error".to_string())
    };

    Ok(error)
}
