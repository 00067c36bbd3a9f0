use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use crate::app::auth::AuthService;
use crate::http::AppError;
use crate::AppState;

/// Resolved identity for a protected route. Extraction short-circuits with a
/// 401 on a missing header, a malformed header, an invalid or expired token,
/// or a token whose subject no longer exists.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthorized("invalid Authorization header"))?;

        let service = AuthService::new(state.db.clone(), state.token_key, state.token_ttl_hours);

        let username = service
            .verify_token(token)
            .map_err(|_| AppError::internal("failed to verify token"))?
            .ok_or_else(|| AppError::unauthorized("invalid or expired token"))?;

        let exists = service.subject_exists(&username).await.map_err(|err| {
            tracing::error!(error = ?err, "failed to resolve token subject");
            AppError::internal("failed to resolve token subject")
        })?;
        if !exists {
            return Err(AppError::unauthorized("unknown user"));
        }

        Ok(AuthUser { username })
    }
}
