use axum::{
    extract::{FromRef, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::auth::repo::Role;
use crate::auth::token::TokenKeys;
use crate::error::ApiError;
use crate::state::AppState;

/// Shared-secret header for non-interactive (scheduled) triggering. A coarse
/// bearer credential, not tied to any user identity.
const CRON_TOKEN_HEADER: &str = "x-cron-token";

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub message: String,
    pub topics: Vec<String>,
}

#[instrument(skip(state, headers))]
pub async fn generate_content(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<GenerateResponse>, ApiError> {
    authorize_trigger(&state, &headers)?;

    let titles = super::generate_drafts(&state).await?;
    info!(count = titles.len(), "content drafts generated");
    Ok(Json(GenerateResponse {
        success: true,
        message: format!("Generated {} content draft(s)", titles.len()),
        topics: titles,
    }))
}

/// Accepts either the cron shared secret or an admin token. The cron header
/// wins when both are present.
fn authorize_trigger(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    if let Some(cron) = headers.get(CRON_TOKEN_HEADER).and_then(|v| v.to_str().ok()) {
        if cron != state.config.cron_secret {
            warn!("generation trigger with bad cron token");
            return Err(ApiError::Unauthorized("Invalid cron token".to_string()));
        }
        return Ok(());
    }

    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|h| h.strip_prefix("Bearer ").unwrap_or(h))
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?;

    let claims = TokenKeys::from_ref(state)
        .verify(token)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;
    if claims.role != Role::Admin {
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_cron(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CRON_TOKEN_HEADER, value.parse().unwrap());
        headers
    }

    fn with_bearer(state: &AppState, role: Role) -> HeaderMap {
        let token = TokenKeys::from_ref(state)
            .mint(1, "admin@admin.com", role)
            .expect("mint");
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {token}").parse().unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn cron_secret_authorizes_without_a_user() {
        let state = AppState::fake();
        let secret = state.config.cron_secret.clone();
        assert!(authorize_trigger(&state, &with_cron(&secret)).is_ok());
    }

    #[tokio::test]
    async fn bad_cron_token_is_unauthorized_even_with_admin_token_present() {
        let state = AppState::fake();
        let mut headers = with_bearer(&state, Role::Admin);
        headers.insert(CRON_TOKEN_HEADER, "wrong".parse().unwrap());
        let err = authorize_trigger(&state, &headers).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn admin_token_authorizes_and_user_token_is_forbidden() {
        let state = AppState::fake();
        assert!(authorize_trigger(&state, &with_bearer(&state, Role::Admin)).is_ok());
        let err = authorize_trigger(&state, &with_bearer(&state, Role::User)).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));
    }

    #[tokio::test]
    async fn no_credentials_is_unauthorized() {
        let state = AppState::fake();
        let err = authorize_trigger(&state, &HeaderMap::new()).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn trigger_reports_generated_titles() {
        let state = AppState::for_tests().await;
        let secret = state.config.cron_secret.clone();
        let Json(response) = generate_content(State(state), with_cron(&secret))
            .await
            .expect("generate");
        assert!(response.success);
        assert_eq!(response.topics.len(), 2);
        assert_eq!(response.message, "Generated 2 content draft(s)");
    }
}
