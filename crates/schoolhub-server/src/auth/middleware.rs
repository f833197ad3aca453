use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::EntityTrait;
use serde_json::json;
use std::sync::Arc;

use super::jwt::{validate_token, Claims, TokenType};
use schoolhub_core::Actor;
use schoolhub_db::entities::user;
use schoolhub_db::AppState;

/// Extension type to access authenticated user claims in handlers
#[derive(Clone, Debug)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Snapshot of this user for the audit log.
    pub fn actor(&self) -> Actor {
        Actor {
            civil_id: Some(self.0.sub.clone()),
            name: Some(self.0.name.clone()),
            subject: self.0.subject.clone(),
            job_title: self.0.job_title.clone(),
        }
    }
}

const ADMIN_ROLES: &[&str] = &["admin", "content_admin"];

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
}

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
}

fn forbidden() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "error": "Admin access required" })),
    )
        .into_response()
}

/// Middleware: require an administrative role (admin or content admin)
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(&request) else {
        return unauthorized("Missing or invalid Authorization header");
    };

    let claims = match validate_token(token, &state.jwt_secret) {
        Ok(claims) if claims.token_type == TokenType::Access => claims,
        Ok(_) => return unauthorized("Invalid token type, access token required"),
        Err(_) => return unauthorized("Invalid or expired token"),
    };

    if !ADMIN_ROLES.contains(&claims.role.as_str()) {
        return forbidden();
    }

    // SECURITY: verify the role from the DB, not just the JWT
    let is_admin = match user::Entity::find_by_id(claims.sub.clone())
        .one(&state.db)
        .await
    {
        Ok(Some(u)) => u.role.is_administrative(),
        Ok(None) => false,
        Err(e) => {
            tracing::warn!(civil_id = %claims.sub, "admin role check failed: {e}");
            false
        }
    };

    if !is_admin {
        return forbidden();
    }

    request.extensions_mut().insert(AuthUser(claims));
    next.run(request).await
}
