//! Admin API: feature-flag settings and the school profile.
//!
//! Every mutation here is written to the audit log after it succeeds.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use super::{api_error, ApiError, ClientMeta};
use crate::auth::middleware::AuthUser;
use schoolhub_core::settings::{STUDENT_INQUIRIES_ENABLED, TEACHER_INQUIRIES_ENABLED};
use schoolhub_core::{
    AuditLog, AuditRecord, Operation, ProfileUpdate, SchoolProfiles, SettingsStore,
};
use schoolhub_db::entities::{school_profile, system_setting};
use schoolhub_db::AppState;

const SETTINGS_TABLE: &str = "system_settings";
const PROFILE_TABLE: &str = "school_profile";

// ─── Settings ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SettingResponse {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    pub updated_at: String,
}

impl From<system_setting::Model> for SettingResponse {
    fn from(s: system_setting::Model) -> Self {
        Self {
            key: s.key,
            value: s.value,
            description: s.description,
            updated_at: s.updated_at.to_rfc3339(),
        }
    }
}

/// GET /api/admin/settings: list all settings
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SettingResponse>>, ApiError> {
    let settings = SettingsStore::new(state.db.clone())
        .list()
        .await
        .map_err(|e| {
            tracing::error!("failed to list settings: {e}");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "DB error")
        })?;

    Ok(Json(settings.into_iter().map(SettingResponse::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingRequest {
    pub value: String,
    pub description: Option<String>,
}

/// PUT /api/admin/settings/:key: upsert a single setting
pub async fn update_setting(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ClientMeta(meta): ClientMeta,
    Path(key): Path<String>,
    Json(body): Json<UpdateSettingRequest>,
) -> Result<Json<SettingResponse>, ApiError> {
    let key = key.trim().to_string();
    if key.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Setting key is required"));
    }

    let store = SettingsStore::new(state.db.clone());
    let previous = save_setting(&store, &key, &body.value, body.description.as_deref()).await?;

    let mut record = AuditRecord::new(Operation::Update, SETTINGS_TABLE)
        .record_id(&key)
        .new_state(&json!({ "key": key, "value": body.value }))
        .description(format!("Updated setting {key}"));
    if let Some(old) = &previous {
        record = record.old_state(&json!({ "key": old.key, "value": old.value }));
    }
    AuditLog::new(state.db.clone())
        .record(&auth_user.actor(), &meta, record)
        .await;

    tracing::info!(key = %key, by = %auth_user.0.sub, "setting updated");

    let saved = store
        .lookup(&key)
        .await
        .map_err(|_| api_error(StatusCode::INTERNAL_SERVER_ERROR, "DB error"))?
        .ok_or_else(|| api_error(StatusCode::INTERNAL_SERVER_ERROR, "Setting vanished"))?;
    Ok(Json(saved.into()))
}

/// Write `key` and return the row as it was before the write.
async fn save_setting(
    store: &SettingsStore,
    key: &str,
    value: &str,
    description: Option<&str>,
) -> Result<Option<system_setting::Model>, ApiError> {
    let previous = match store.lookup(key).await {
        Ok(previous) => previous,
        Err(e) => {
            tracing::warn!(key, "could not snapshot setting before write: {e}");
            None
        }
    };

    store
        .set(key, value, description)
        .await
        .map_err(|_| api_error(StatusCode::INTERNAL_SERVER_ERROR, "Update failed"))?;

    Ok(previous)
}

#[derive(Debug, Deserialize)]
pub struct ToggleInquiriesRequest {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct ToggleInquiriesResponse {
    pub audience: String,
    pub enabled: bool,
    pub message: String,
}

/// POST /api/admin/inquiries/:audience/toggle: open or close inquiries for
/// students or teachers
pub async fn toggle_inquiries(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ClientMeta(meta): ClientMeta,
    Path(audience): Path<String>,
    Json(body): Json<ToggleInquiriesRequest>,
) -> Result<Json<ToggleInquiriesResponse>, ApiError> {
    let (key, label) = match audience.as_str() {
        "student" => (STUDENT_INQUIRIES_ENABLED, "student"),
        "teacher" => (TEACHER_INQUIRIES_ENABLED, "teacher"),
        _ => {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                "Audience must be 'student' or 'teacher'",
            ))
        }
    };

    let (value, description) = if body.enabled {
        ("1", format!("Enable {label} inquiries"))
    } else {
        ("0", format!("Disable {label} inquiries"))
    };

    let store = SettingsStore::new(state.db.clone());
    let previous = save_setting(&store, key, value, Some(&description)).await?;

    let mut record = AuditRecord::new(Operation::Update, SETTINGS_TABLE)
        .record_id(key)
        .new_state(&json!({ "key": key, "value": value }))
        .description(description.clone());
    if let Some(old) = &previous {
        record = record.old_state(&json!({ "key": old.key, "value": old.value }));
    }
    AuditLog::new(state.db.clone())
        .record(&auth_user.actor(), &meta, record)
        .await;

    tracing::info!(key, enabled = body.enabled, by = %auth_user.0.sub, "inquiries toggled");

    let message = if body.enabled {
        format!("{} inquiries enabled", capitalize(label))
    } else {
        format!("{} inquiries disabled", capitalize(label))
    };

    Ok(Json(ToggleInquiriesResponse {
        audience: label.to_string(),
        enabled: body.enabled,
        message,
    }))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ─── School profile ─────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: school_profile::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// GET /api/admin/profile: full profile, created with defaults on first read
pub async fn get_profile(State(state): State<Arc<AppState>>) -> Json<ProfileResponse> {
    let outcome = SchoolProfiles::new(state.db.clone()).get_profile().await;
    Json(ProfileResponse {
        warning: outcome.warning.clone(),
        profile: outcome.value,
    })
}

/// PUT /api/admin/profile: replace the profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ClientMeta(meta): ClientMeta,
    Json(body): Json<ProfileUpdate>,
) -> Result<Json<ProfileResponse>, ApiError> {
    if body.name.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "School name is required"));
    }

    let profiles = SchoolProfiles::new(state.db.clone());
    let before = match profiles.current().await {
        Ok(before) => before,
        Err(e) => {
            tracing::warn!("could not snapshot school profile before write: {e}");
            None
        }
    };

    let saved = profiles.update_profile(body).await.map_err(|e| {
        tracing::error!("failed to update school profile: {e}");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Update failed")
    })?;

    let mut record = AuditRecord::new(Operation::Update, PROFILE_TABLE)
        .record_id(saved.id)
        .new_state(&saved)
        .description("Updated school profile");
    if let Some(before) = &before {
        record = record.old_state(before);
    }
    AuditLog::new(state.db.clone())
        .record(&auth_user.actor(), &meta, record)
        .await;

    tracing::info!(by = %auth_user.0.sub, "school profile updated");

    Ok(Json(ProfileResponse {
        profile: saved,
        warning: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalize_first_letter() {
        assert_eq!(capitalize("student"), "Student");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn update_setting_request_description_optional() {
        let req: UpdateSettingRequest = serde_json::from_str(r#"{"value": "0"}"#).unwrap();
        assert_eq!(req.value, "0");
        assert!(req.description.is_none());
    }
}
