//! Audit log browsing for administrators.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use super::{api_error, ApiError};
use schoolhub_core::{AuditEntryDetail, AuditFilter, AuditLog, AuditPage, AuditQueryParams, FilterOptions};
use schoolhub_db::AppState;

#[derive(Debug, Serialize)]
pub struct AuditLogResponse {
    #[serde(flatten)]
    pub page: AuditPage,
    pub filter_options: FilterOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// GET /api/admin/audit-log: filtered, paginated entries, newest first
pub async fn list_entries(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuditQueryParams>,
) -> Json<AuditLogResponse> {
    let log = AuditLog::new(state.db.clone());
    let filter = AuditFilter::from_params(&params);

    let page = log
        .query(&filter, params.page(), params.per_page(state.audit_page_size))
        .await;
    let options = log.filter_options().await;

    // One notice is enough; the page warning is the more useful of the two.
    let warning = page.warning.clone().or_else(|| options.warning.clone());

    Json(AuditLogResponse {
        page: page.value,
        filter_options: options.value,
        warning,
    })
}

/// GET /api/admin/audit-log/:id: one entry with decoded snapshots
pub async fn entry_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<AuditEntryDetail>, ApiError> {
    let entry = AuditLog::new(state.db.clone()).get(id).await.map_err(|e| {
        tracing::error!(id, "failed to load audit entry: {e}");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "DB error")
    })?;

    entry
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Audit entry not found"))
}

/// DELETE /api/admin/audit-log: remove every entry
pub async fn clear_entries(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<serde_json::Value>) {
    match AuditLog::new(state.db.clone()).clear_all().await {
        Ok(deleted) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "deleted": deleted,
                "message": format!("Deleted {deleted} audit entries"),
            })),
        ),
        Err(e) => {
            tracing::error!("failed to clear audit log: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "message": "The audit log could not be cleared",
                })),
            )
        }
    }
}
