use axum::{
    extract::{FromRef, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest},
        password::verify_password,
        repo::User,
        token::TokenKeys,
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    // Unknown email and bad password answer identically so accounts cannot
    // be enumerated.
    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!("login with unknown email");
            ApiError::Unauthorized("Invalid email or password".to_string())
        })?;

    if !verify_password(&payload.password, &user.password_hash, &user.salt) {
        warn!(user_id = user.id, "login with invalid password");
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let keys = TokenKeys::from_ref(&state);
    let token = keys.mint(user.id, &user.email, user.role)?;

    info!(user_id = user.id, "user logged in");
    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}
