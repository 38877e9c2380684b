//! Service-to-service seams.
//!
//! Each downstream service is reached through a trait so a caller can use
//! either the HTTP client below or the in-process service directly.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use motus_types::{
    CreateUserRequest, GuessRequest, GuessResponse, Leaderboards, MessageResponse,
    NicknameResponse, ResetScoreRequest, ScoreRequest, SeedResponse, SetSeedRequest,
    StoreSeedRequest, UserScore, WordResponse,
};

use crate::error::ApiError;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_seed(&self, user_id: &str) -> Result<u64, ApiError>;
    async fn set_seed(&self, user_id: &str, seed: u64) -> Result<(), ApiError>;
    async fn get_nickname(&self, user_id: &str) -> Result<String, ApiError>;
    async fn create_user(&self, user: &CreateUserRequest) -> Result<(), ApiError>;
}

#[async_trait]
pub trait ScoreLedger: Send + Sync {
    async fn record(&self, request: &ScoreRequest) -> Result<MessageResponse, ApiError>;
    async fn user_score(&self, user_id: &str) -> Result<UserScore, ApiError>;
    async fn reset(&self, user_id: &str) -> Result<MessageResponse, ApiError>;
    async fn leaderboard(&self) -> Result<Leaderboards, ApiError>;
}

#[async_trait]
pub trait GameApi: Send + Sync {
    async fn get_seed(&self, user_id: &str) -> Result<SeedResponse, ApiError>;
    async fn set_seed(&self, request: &SetSeedRequest) -> Result<MessageResponse, ApiError>;
    async fn get_word(&self, user_id: &str) -> Result<WordResponse, ApiError>;
    async fn guess(&self, request: &GuessRequest) -> Result<GuessResponse, ApiError>;
    async fn generate_seed(&self) -> Result<SeedResponse, ApiError>;
}

/// JSON over HTTP to one downstream service. Error replies are relayed
/// with their status and `message`; `fallback` covers everything else.
#[derive(Clone)]
pub struct ServiceClient {
    client: Client,
    base_url: String,
}

impl ServiceClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Each segment is percent-encoded on its own, so a user id holding
    /// `/`, `?` or spaces stays one segment.
    pub fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::internal("Invalid service URL", e))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Internal("Invalid service URL".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        fallback: &str,
    ) -> Result<T, ApiError> {
        let url = self.url(segments)?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Self::transport_error(&url, e, fallback))?;

        Self::read_json(response, fallback).await
    }

    pub async fn post_json<B, T>(
        &self,
        segments: &[&str],
        body: &B,
        fallback: &str,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(segments)?;
        let response = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| Self::transport_error(&url, e, fallback))?;

        Self::read_json(response, fallback).await
    }

    fn transport_error(url: &Url, err: reqwest::Error, fallback: &str) -> ApiError {
        warn!("Request to {} failed: {}", url, err);
        ApiError::Upstream {
            status: 500,
            message: fallback.to_string(),
        }
    }

    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
        fallback: &str,
    ) -> Result<T, ApiError> {
        let status = response.status();
        let url = response.url().to_string();

        if status.is_success() {
            return response.json::<T>().await.map_err(|e| {
                warn!("Unreadable reply from {}: {}", url, e);
                ApiError::Upstream {
                    status: 500,
                    message: fallback.to_string(),
                }
            });
        }

        let message = response
            .json::<MessageResponse>()
            .await
            .map(|body| body.message)
            .unwrap_or_else(|_| fallback.to_string());

        Err(ApiError::Upstream {
            status: status.as_u16(),
            message,
        })
    }
}

pub struct HttpUserDirectory {
    client: ServiceClient,
}

impl HttpUserDirectory {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: ServiceClient::new(base_url),
        }
    }
}

#[async_trait]
impl UserDirectory for HttpUserDirectory {
    async fn get_seed(&self, user_id: &str) -> Result<u64, ApiError> {
        let response: SeedResponse = self
            .client
            .get_json(&["seed", user_id], "Error getting seed")
            .await?;
        Ok(response.seed)
    }

    async fn set_seed(&self, user_id: &str, seed: u64) -> Result<(), ApiError> {
        let request = StoreSeedRequest {
            user_id: user_id.to_string(),
            seed,
        };
        let _: MessageResponse = self
            .client
            .post_json(&["seed"], &request, "Error setting seed")
            .await?;
        Ok(())
    }

    async fn get_nickname(&self, user_id: &str) -> Result<String, ApiError> {
        let response: NicknameResponse = self
            .client
            .get_json(&["nickname", user_id], "Error getting nickname")
            .await?;
        Ok(response.nickname)
    }

    async fn create_user(&self, user: &CreateUserRequest) -> Result<(), ApiError> {
        let _: MessageResponse = self
            .client
            .post_json(&["user"], user, "Error creating user")
            .await?;
        Ok(())
    }
}

pub struct HttpScoreLedger {
    client: ServiceClient,
}

impl HttpScoreLedger {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: ServiceClient::new(base_url),
        }
    }
}

#[async_trait]
impl ScoreLedger for HttpScoreLedger {
    async fn record(&self, request: &ScoreRequest) -> Result<MessageResponse, ApiError> {
        self.client
            .post_json(&["score"], request, "Error setting score")
            .await
    }

    async fn user_score(&self, user_id: &str) -> Result<UserScore, ApiError> {
        self.client
            .get_json(&["score", user_id], "Error getting score")
            .await
    }

    async fn reset(&self, user_id: &str) -> Result<MessageResponse, ApiError> {
        let request = ResetScoreRequest {
            user_id: Some(user_id.to_string()),
        };
        self.client
            .post_json(&["reset-score"], &request, "Error resetting score")
            .await
    }

    async fn leaderboard(&self) -> Result<Leaderboards, ApiError> {
        self.client
            .get_json(&["leaderboard"], "Error getting leaderboard")
            .await
    }
}

pub struct HttpGameApi {
    client: ServiceClient,
}

impl HttpGameApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: ServiceClient::new(base_url),
        }
    }
}

#[async_trait]
impl GameApi for HttpGameApi {
    async fn get_seed(&self, user_id: &str) -> Result<SeedResponse, ApiError> {
        self.client
            .get_json(&["seed", user_id], "Error getting seed")
            .await
    }

    async fn set_seed(&self, request: &SetSeedRequest) -> Result<MessageResponse, ApiError> {
        self.client
            .post_json(&["seed"], request, "Error setting seed")
            .await
    }

    async fn get_word(&self, user_id: &str) -> Result<WordResponse, ApiError> {
        self.client
            .get_json(&["word", user_id], "Error getting word")
            .await
    }

    async fn guess(&self, request: &GuessRequest) -> Result<GuessResponse, ApiError> {
        self.client
            .post_json(&["guess"], request, "Error making guess")
            .await
    }

    async fn generate_seed(&self) -> Result<SeedResponse, ApiError> {
        self.client
            .get_json(&["generateSeed"], "Error generating seed")
            .await
    }
}
