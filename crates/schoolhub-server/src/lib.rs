//! HTTP surface of the school portal's administration backend.

use axum::{
    http::{HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post, put},
    Json, Router,
};
use schoolhub_db::AppState;
use serde::Serialize;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

pub mod api;
pub mod auth;
pub mod config;

#[derive(Serialize)]
struct ApiStatus {
    status: &'static str,
    version: &'static str,
}

async fn healthz() -> Json<ApiStatus> {
    Json(ApiStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Every route, with tracing and security headers applied.
pub fn router(state: Arc<AppState>) -> Router {
    let admin = Router::new()
        .route("/settings", get(api::admin::get_settings))
        .route("/settings/{key}", put(api::admin::update_setting))
        .route(
            "/inquiries/{audience}/toggle",
            post(api::admin::toggle_inquiries),
        )
        .route(
            "/profile",
            get(api::admin::get_profile).put(api::admin::update_profile),
        )
        .route(
            "/audit-log",
            get(api::audit_log::list_entries).delete(api::audit_log::clear_entries),
        )
        .route("/audit-log/{id}", get(api::audit_log::entry_detail))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_admin,
        ));

    let api_routes = Router::new()
        .route("/auth/refresh", post(auth::routes::refresh))
        .route("/school/profile", get(api::school::public_profile))
        .nest("/admin", admin);

    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state)
}

/// CORS for the configured origins. With none configured, no cross-origin
/// request is allowed.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if origins.is_empty() {
        tracing::warn!("CORS_ORIGINS not set, cross-origin requests are refused. Set CORS_ORIGINS=http://localhost:3000 for dev.");
        return CorsLayer::new().allow_methods(methods);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|s| HeaderValue::from_str(s).ok())
        .collect();
    tracing::info!("CORS allowed origins: {:?}", origins);
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(methods)
        .allow_headers(tower_http::cors::Any)
}
