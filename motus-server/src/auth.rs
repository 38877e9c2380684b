use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use motus_types::Identity;

const JWKS_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Claims of an OIDC ID token. The roles claim name is configurable, so it
/// is looked up in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OidcClaims {
    pub sub: String,
    pub iss: Option<String>,
    pub exp: Option<u64>,
    pub nickname: Option<String>,
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwksKey {
    pub kty: String,
    pub kid: String,
    pub n: Option<String>,
    pub e: Option<String>,
    pub x5c: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwksResponse {
    pub keys: Vec<JwksKey>,
}

pub struct AuthService {
    client: Client,
    jwks_cache: Arc<RwLock<HashMap<String, (DecodingKey, SystemTime)>>>,
    issuer: String,
    audience: String,
    roles_claim: String,
    dev_mode: bool,
}

impl AuthService {
    pub fn new(issuer: String, audience: String, roles_claim: String) -> Self {
        Self {
            client: Client::new(),
            jwks_cache: Arc::new(RwLock::new(HashMap::new())),
            issuer,
            audience,
            roles_claim,
            dev_mode: false,
        }
    }

    pub fn new_dev_mode(roles_claim: String) -> Self {
        Self {
            client: Client::new(),
            jwks_cache: Arc::new(RwLock::new(HashMap::new())),
            issuer: "dev".to_string(),
            audience: "dev".to_string(),
            roles_claim,
            dev_mode: true,
        }
    }

    pub async fn validate_token(&self, token: &str) -> Result<Identity, AuthError> {
        if self.dev_mode {
            return self.validate_dev_token(token);
        }

        // Decode header to get key ID
        let header = decode_header(token).map_err(|e| {
            tracing::warn!("Failed to decode JWT header: {:?}", e);
            AuthError::InvalidToken
        })?;
        let kid = header.kid.ok_or_else(|| {
            tracing::warn!("JWT header missing 'kid' field");
            AuthError::InvalidToken
        })?;

        let decoding_key = self.get_decoding_key(&kid).await?;

        let issuer = self.issuer.trim_end_matches('/');
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.audience]);
        // Providers differ on the trailing slash
        validation.set_issuer(&[issuer.to_string(), format!("{}/", issuer)]);

        let token_data =
            decode::<OidcClaims>(token, &decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => {
                        tracing::warn!("JWT token validation failed for kid {}: {:?}", kid, e);
                        AuthError::InvalidToken
                    }
                }
            })?;

        Ok(self.claims_to_identity(token_data.claims))
    }

    fn claims_to_identity(&self, claims: OidcClaims) -> Identity {
        let roles = match claims.extra.get(&self.roles_claim) {
            Some(serde_json::Value::Array(values)) => values
                .iter()
                .filter_map(|value| value.as_str().map(str::to_string))
                .collect(),
            Some(serde_json::Value::String(role)) => vec![role.clone()],
            _ => Vec::new(),
        };

        let nickname = claims
            .nickname
            .or(claims.name)
            .unwrap_or_else(|| claims.sub.clone());

        Identity {
            user_id: claims.sub,
            nickname,
            roles,
        }
    }

    async fn get_decoding_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        // Check cache first
        {
            let cache = self.jwks_cache.read().await;
            if let Some((key, cached_time)) = cache.get(kid) {
                let elapsed = cached_time.elapsed().unwrap_or(JWKS_CACHE_TTL);
                if elapsed < JWKS_CACHE_TTL {
                    return Ok(key.clone());
                }
                tracing::debug!("Cached key for kid '{}' is stale, fetching fresh", kid);
            }
        }

        let jwks_url = format!(
            "{}/.well-known/jwks.json",
            self.issuer.trim_end_matches('/')
        );
        tracing::debug!("Fetching JWKS from {}", jwks_url);

        let response = self.client.get(&jwks_url).send().await.map_err(|e| {
            tracing::warn!("Failed to fetch JWKS: {:?}", e);
            AuthError::JwksFetchError
        })?;

        if !response.status().is_success() {
            tracing::warn!("JWKS fetch returned status: {}", response.status());
            return Err(AuthError::JwksFetchError);
        }

        let jwks: JwksResponse = response.json().await.map_err(|e| {
            tracing::warn!("Failed to parse JWKS JSON: {:?}", e);
            AuthError::JwksFetchError
        })?;

        let jwks_key = jwks.keys.iter().find(|key| key.kid == kid).ok_or_else(|| {
            tracing::warn!("Key with kid '{}' not found in JWKS", kid);
            AuthError::KeyNotFound
        })?;

        let decoding_key = if let (Some(n), Some(e)) = (&jwks_key.n, &jwks_key.e) {
            DecodingKey::from_rsa_components(n, e).map_err(|e| {
                tracing::warn!("Failed to create decoding key from RSA components: {:?}", e);
                AuthError::InvalidKey
            })?
        } else if let Some(cert) = jwks_key.x5c.as_ref().and_then(|chain| chain.first()) {
            let cert_der = STANDARD.decode(cert).map_err(|e| {
                tracing::warn!("Failed to decode x5c certificate: {:?}", e);
                AuthError::InvalidKey
            })?;
            DecodingKey::from_rsa_der(&cert_der)
        } else {
            tracing::warn!("JWKS key has neither n,e components nor x5c certificate");
            return Err(AuthError::InvalidKey);
        };

        {
            let mut cache = self.jwks_cache.write().await;
            cache.insert(kid.to_string(), (decoding_key.clone(), SystemTime::now()));
        }

        Ok(decoding_key)
    }

    /// Dev tokens are trusted as-is. Accepted shapes: an unsigned JWT
    /// (payload only is read), an `Identity` JSON object, or
    /// `user_id:nickname[:role,role]`.
    fn validate_dev_token(&self, token: &str) -> Result<Identity, AuthError> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() == 3 {
            let payload = URL_SAFE_NO_PAD
                .decode(parts[1].trim_end_matches('='))
                .map_err(|e| {
                    tracing::warn!("Failed to decode JWT payload in dev mode: {:?}", e);
                    AuthError::InvalidToken
                })?;

            let claims: OidcClaims = serde_json::from_slice(&payload).map_err(|e| {
                tracing::warn!("Failed to parse JWT claims in dev mode: {:?}", e);
                AuthError::InvalidToken
            })?;

            return Ok(self.claims_to_identity(claims));
        }

        if token.starts_with('{') {
            return serde_json::from_str(token).map_err(|_| AuthError::InvalidToken);
        }

        let mut fields = token.splitn(3, ':');
        match (fields.next(), fields.next()) {
            (Some(user_id), Some(nickname)) if !user_id.is_empty() && !nickname.is_empty() => {
                let roles = fields
                    .next()
                    .map(|roles| {
                        roles
                            .split(',')
                            .filter(|role| !role.is_empty())
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();

                Ok(Identity {
                    user_id: user_id.to_string(),
                    nickname: nickname.to_string(),
                    roles,
                })
            }
            _ => Err(AuthError::InvalidToken),
        }
    }
}

/// Pick the token from `Authorization: Bearer ...`, falling back to the
/// session cookie.
pub fn bearer_token(authorization: Option<&str>, session_cookie: Option<&str>) -> Option<String> {
    authorization
        .and_then(|header| header.strip_prefix("Bearer "))
        .or(session_cookie)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Failed to fetch JWKS")]
    JwksFetchError,
    #[error("Key not found")]
    KeyNotFound,
    #[error("Invalid key")]
    InvalidKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev_service() -> AuthService {
        AuthService::new_dev_mode("test/roles".to_string())
    }

    #[test]
    fn test_auth_service_creation() {
        let auth_service = AuthService::new(
            "https://motus.example.com/".to_string(),
            "motus-client".to_string(),
            "test/roles".to_string(),
        );

        assert_eq!(auth_service.issuer, "https://motus.example.com/");
        assert_eq!(auth_service.audience, "motus-client");
        assert!(!auth_service.dev_mode);
    }

    #[tokio::test]
    async fn test_invalid_token_validation() {
        let auth_service = AuthService::new(
            "https://motus.example.com/".to_string(),
            "motus-client".to_string(),
            "test/roles".to_string(),
        );

        let result = auth_service.validate_token("invalid-token").await;
        assert!(matches!(result.unwrap_err(), AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn test_dev_string_token() {
        let identity = dev_service()
            .validate_token("auth0|alice:alice")
            .await
            .unwrap();
        assert_eq!(identity.user_id, "auth0|alice");
        assert_eq!(identity.nickname, "alice");
        assert!(identity.roles.is_empty());

        let admin = dev_service()
            .validate_token("auth0|root:root:admin,editor")
            .await
            .unwrap();
        assert_eq!(admin.roles, vec!["admin", "editor"]);
        assert!(admin.is_admin());

        assert!(dev_service().validate_token("lonely").await.is_err());
        assert!(dev_service().validate_token(":nick").await.is_err());
    }

    #[tokio::test]
    async fn test_dev_json_token() {
        let identity = dev_service()
            .validate_token(r#"{"user_id":"u1","nickname":"Une","roles":["admin"]}"#)
            .await
            .unwrap();
        assert_eq!(identity.user_id, "u1");
        assert!(identity.is_admin());

        assert!(dev_service().validate_token("{not json").await.is_err());
    }

    #[tokio::test]
    async fn test_dev_jwt_payload_reads_roles_claim() {
        let payload = URL_SAFE_NO_PAD.encode(
            r#"{"sub":"auth0|bob","name":"Bob","test/roles":["admin"],"exp":1}"#,
        );
        let token = format!("e30.{}.signature", payload);

        let identity = dev_service().validate_token(&token).await.unwrap();
        assert_eq!(identity.user_id, "auth0|bob");
        assert_eq!(identity.nickname, "Bob");
        assert_eq!(identity.roles, vec!["admin"]);
    }

    #[test]
    fn test_nickname_falls_back_to_subject() {
        let claims: OidcClaims = serde_json::from_str(r#"{"sub":"auth0|x"}"#).unwrap();
        let identity = dev_service().claims_to_identity(claims);
        assert_eq!(identity.nickname, "auth0|x");
        assert!(identity.roles.is_empty());
    }

    #[test]
    fn test_bearer_token_sources() {
        assert_eq!(
            bearer_token(Some("Bearer abc"), Some("cookie")),
            Some("abc".to_string())
        );
        assert_eq!(bearer_token(None, Some("cookie")), Some("cookie".to_string()));
        assert_eq!(bearer_token(Some("Basic xyz"), None), None);
        assert_eq!(bearer_token(Some("Bearer "), None), None);
        assert_eq!(bearer_token(None, None), None);
    }
}
