use axum::{extract::State, http::StatusCode, Json};
use sea_orm::EntityTrait;
use serde::Deserialize;
use std::sync::Arc;

use super::jwt::{generate_token_pair, validate_token, TokenPair, TokenSubject, TokenType};
use crate::api::{api_error, ApiError};
use schoolhub_db::entities::user;
use schoolhub_db::AppState;

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// POST /api/auth/refresh: trade a refresh token for a new pair.
///
/// Name, role and job title are re-read from the users table, so a changed
/// role takes effect on the next refresh.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let claims = validate_token(&body.refresh_token, &state.jwt_secret).map_err(|_| {
        api_error(StatusCode::UNAUTHORIZED, "Invalid or expired refresh token")
    })?;

    if claims.token_type != TokenType::Refresh {
        return Err(api_error(StatusCode::UNAUTHORIZED, "Invalid token type"));
    }

    let user = user::Entity::find_by_id(claims.sub)
        .one(&state.db)
        .await
        .map_err(|e| {
            tracing::error!("db error: {e}");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        })?
        .ok_or_else(|| api_error(StatusCode::UNAUTHORIZED, "User no longer exists"))?;

    let tokens = generate_token_pair(&TokenSubject::from(&user), &state.jwt_secret).map_err(|e| {
        tracing::error!("token error: {e}");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate tokens")
    })?;

    tracing::debug!(civil_id = %user.civil_id, "tokens refreshed");
    Ok(Json(tokens))
}
