use anyhow::Context;
use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, get_current_timestamp, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::{
    auth::{
        claims::{Claims, Principal},
        repo_types::Role,
    },
    config::JwtConfig,
    state::AppState,
};

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token")]
    Invalid(#[from] jsonwebtoken::errors::Error),
    #[error("token expired")]
    Expired,
}

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub algorithm: Algorithm,
    pub ttl: TimeDuration,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            algorithm: cfg.algorithm,
            ttl: TimeDuration::seconds(cfg.ttl_minutes.saturating_mul(60)),
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

impl JwtKeys {
    /// Signs a token for the given identity that expires `ttl` from now.
    pub fn issue(
        &self,
        username: &str,
        user_id: i64,
        role: Role,
        ttl: TimeDuration,
    ) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now
            .checked_add(ttl)
            .context("token lifetime out of range")?;
        let claims = Claims {
            sub: username.to_string(),
            id: user_id,
            role,
            iat: now.unix_timestamp().max(0) as usize,
            exp: exp.unix_timestamp().max(0) as usize,
        };
        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding)?;
        debug!(user_id, %role, "jwt signed");
        Ok(token)
    }

    /// Signs a token with the configured lifetime.
    pub fn issue_default(&self, username: &str, user_id: i64, role: Role) -> anyhow::Result<String> {
        self.issue(username, user_id, role, self.ttl)
    }

    /// Checks signature, algorithm and expiry, and requires `sub` and `id`.
    pub fn validate(&self, token: &str) -> Result<Principal, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        // jsonwebtoken still accepts a token during its expiry second.
        if data.claims.exp as u64 <= get_current_timestamp() {
            return Err(TokenError::Expired);
        }
        debug!(user_id = data.claims.id, "jwt verified");
        Ok(data.claims.into())
    }
}
