use std::time::Duration;

use axum::extract::FromRef;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use time::OffsetDateTime;

use crate::auth::repo::Role;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Identity assertion carried by a token. `exp` is an absolute epoch
/// millisecond instant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub email: String,
    pub role: Role,
    pub exp: i64,
}

/// Opaque verification failure. Bad tag, malformed body and expiry all
/// collapse here so callers cannot tell which check rejected the token.
#[derive(Debug, thiserror::Error)]
#[error("invalid token")]
pub struct InvalidToken;

/// Mints and verifies `base64url(claims json) + "." + base64url(hmac tag)`
/// tokens. No server-side session state is involved.
#[derive(Clone)]
pub struct TokenKeys {
    secret: Vec<u8>,
    ttl: Duration,
}

impl FromRef<AppState> for TokenKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::new(
            &state.config.auth.secret,
            Duration::from_secs(state.config.auth.token_ttl_hours.max(0) as u64 * 3600),
        )
    }
}

impl TokenKeys {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            ttl,
        }
    }

    pub fn mint(&self, user_id: i64, email: &str, role: Role) -> anyhow::Result<String> {
        let exp = now_millis() + self.ttl.as_millis() as i64;
        self.mint_with_expiry(user_id, email, role, exp)
    }

    fn mint_with_expiry(
        &self,
        user_id: i64,
        email: &str,
        role: Role,
        exp: i64,
    ) -> anyhow::Result<String> {
        let claims = Claims {
            user_id,
            email: email.to_string(),
            role,
            exp,
        };
        let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let tag = URL_SAFE_NO_PAD.encode(self.tag(body.as_bytes())?);
        Ok(format!("{body}.{tag}"))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, InvalidToken> {
        let (body, tag) = token.split_once('.').ok_or(InvalidToken)?;
        let tag = URL_SAFE_NO_PAD.decode(tag).map_err(|_| InvalidToken)?;

        // Mac::verify_slice compares in constant time.
        let mut mac = HmacSha256::new_from_slice(&self.secret).map_err(|_| InvalidToken)?;
        mac.update(body.as_bytes());
        mac.verify_slice(&tag).map_err(|_| InvalidToken)?;

        let payload = URL_SAFE_NO_PAD.decode(body).map_err(|_| InvalidToken)?;
        let claims: Claims = serde_json::from_slice(&payload).map_err(|_| InvalidToken)?;
        if claims.exp <= now_millis() {
            return Err(InvalidToken);
        }
        Ok(claims)
    }

    fn tag(&self, body: &[u8]) -> anyhow::Result<Vec<u8>> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).map_err(|e| anyhow::anyhow!("{e}"))?;
        mac.update(body);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

pub(crate) fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
