use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::auth::repo::Role;
use crate::auth::token::{Claims, TokenKeys};
use crate::error::ApiError;

/// Requires a valid token with the admin role. Missing or invalid tokens
/// reject with 401; a valid non-admin token rejects with 403.
#[derive(Debug)]
pub struct AdminUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    TokenKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = TokenKeys::from_ref(state);
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?;

        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            ApiError::Unauthorized("Invalid or expired token".to_string())
        })?;

        if claims.role != Role::Admin {
            return Err(ApiError::Forbidden);
        }
        Ok(AdminUser(claims))
    }
}

/// Never rejects; yields the claims only when a valid admin token is
/// presented. Used by public reads that widen for admins.
pub struct OptionalAdmin(pub Option<Claims>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalAdmin
where
    S: Send + Sync,
    TokenKeys: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = TokenKeys::from_ref(state);
        let claims = bearer_token(parts)
            .and_then(|token| keys.verify(token).ok())
            .filter(|claims| claims.role == Role::Admin);
        Ok(OptionalAdmin(claims))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    Some(header.strip_prefix("Bearer ").unwrap_or(header))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use axum::http::Request;

    fn parts_with_auth(token: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/posts");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn mint(state: &AppState, role: Role) -> String {
        TokenKeys::from_ref(state)
            .mint(1, "admin@admin.com", role)
            .expect("mint")
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let state = AppState::fake();
        let mut parts = parts_with_auth(None);
        let err = AdminUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let state = AppState::fake();
        let mut parts = parts_with_auth(Some("garbage"));
        let err = AdminUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn valid_non_admin_token_is_forbidden() {
        let state = AppState::fake();
        let token = mint(&state, Role::User);
        let mut parts = parts_with_auth(Some(&token));
        let err = AdminUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));
    }

    #[tokio::test]
    async fn valid_admin_token_passes() {
        let state = AppState::fake();
        let token = mint(&state, Role::Admin);
        let mut parts = parts_with_auth(Some(&token));
        let AdminUser(claims) = AdminUser::from_request_parts(&mut parts, &state)
            .await
            .expect("admin");
        assert_eq!(claims.user_id, 1);
    }

    #[tokio::test]
    async fn optional_admin_is_none_for_invalid_or_non_admin() {
        let state = AppState::fake();
        for token in [None, Some("garbage".to_string()), Some(mint(&state, Role::User))] {
            let mut parts = parts_with_auth(token.as_deref());
            let OptionalAdmin(claims) = OptionalAdmin::from_request_parts(&mut parts, &state)
                .await
                .unwrap();
            assert!(claims.is_none());
        }

        let token = mint(&state, Role::Admin);
        let mut parts = parts_with_auth(Some(&token));
        let OptionalAdmin(claims) = OptionalAdmin::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert!(claims.is_some());
    }
}
