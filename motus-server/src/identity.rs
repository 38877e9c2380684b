//! Signed identity passed from the gateway to the front service.
//!
//! The gateway authenticates the caller, then forwards an HS256 token in
//! [`IDENTITY_HEADER`]. The front service only trusts identities whose
//! signature, issuer, audience and expiry all check out.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use motus_types::Identity;

pub const IDENTITY_HEADER: &str = "x-motus-identity";

const ISSUER: &str = "motus-gateway";
const AUDIENCE: &str = "motus-front";
const TOKEN_LIFETIME_SECONDS: i64 = 60;

#[derive(Debug, Serialize, Deserialize)]
struct IdentityClaims {
    sub: String,
    nickname: String,
    #[serde(default)]
    roles: Vec<String>,
    iss: String,
    aud: String,
    exp: i64,
}

pub struct IdentityCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl IdentityCodec {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_audience(&[AUDIENCE]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn sign(&self, identity: &Identity) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = IdentityClaims {
            sub: identity.user_id.clone(),
            nickname: identity.nickname.clone(),
            roles: identity.roles.clone(),
            iss: ISSUER.to_string(),
            aud: AUDIENCE.to_string(),
            exp: Utc::now().timestamp() + TOKEN_LIFETIME_SECONDS,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
    }

    /// `None` for anything that is not a valid, unexpired gateway token.
    pub fn verify(&self, token: &str) -> Option<Identity> {
        match decode::<IdentityClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Some(Identity {
                user_id: data.claims.sub,
                nickname: data.claims.nickname,
                roles: data.claims.roles,
            }),
            Err(e) => {
                tracing::warn!("Rejected identity header: {}", e);
                None
            }
        }
    }
}
