use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct User {
    pub user_id: String,
    pub nickname: String,
    #[ts(type = "number")]
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateUserRequest {
    pub user_id: String,
    pub nickname: String,
    #[ts(type = "number")]
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StoreSeedRequest {
    pub user_id: String,
    #[ts(type = "number")]
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NicknameResponse {
    pub nickname: String,
}

/// The authenticated caller, as established by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Identity {
    pub user_id: String,
    pub nickname: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|role| role == ADMIN_ROLE)
    }

    /// Resolve which user a request acts on. Only admins may act on behalf
    /// of someone else; a lone "," stands for an empty path segment.
    pub fn target_user(&self, requested: Option<&str>) -> String {
        match requested {
            Some(user_id) if self.is_admin() && !user_id.is_empty() && user_id != "," => {
                user_id.to_string()
            }
            _ => self.user_id.clone(),
        }
    }
}
