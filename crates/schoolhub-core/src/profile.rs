//! The school profile: one row of institution metadata, created on first read.

use chrono::{DateTime, FixedOffset};
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set, TransactionTrait};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::outcome::Outcome;
use schoolhub_db::entities::school_profile::{self, SINGLETON_ID};

/// Profile materialized when none has been saved yet.
pub fn default_profile(now: DateTime<FixedOffset>) -> school_profile::Model {
    school_profile::Model {
        id: SINGLETON_ID,
        logo: None,
        name: "School Name".to_string(),
        address: Some("School Address".to_string()),
        phone: Some(String::new()),
        email: Some(String::new()),
        vision: Some("School Vision".to_string()),
        mission: Some("School Mission".to_string()),
        core_values: Some(String::new()),
        google_maps_url: Some(String::new()),
        youtube_url: Some(String::new()),
        instagram_url: Some(String::new()),
        telegram_url: Some(String::new()),
        snapchat_url: Some(String::new()),
        whatsapp_url: Some(String::new()),
        academic_year: Some("2024-2025".to_string()),
        academic_semester: Some("First Semester".to_string()),
        created_at: now,
        updated_at: now,
    }
}

/// Administrative form contents. Every field is replaced; `logo: None` keeps
/// the current logo path, since a logo only changes on a new upload.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProfileUpdate {
    pub logo: Option<String>,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub vision: String,
    #[serde(default)]
    pub mission: String,
    #[serde(default)]
    pub core_values: String,
    #[serde(default)]
    pub google_maps_url: String,
    #[serde(default)]
    pub youtube_url: String,
    #[serde(default)]
    pub instagram_url: String,
    #[serde(default)]
    pub telegram_url: String,
    #[serde(default)]
    pub snapchat_url: String,
    #[serde(default)]
    pub whatsapp_url: String,
    #[serde(default)]
    pub academic_year: String,
    #[serde(default)]
    pub academic_semester: String,
}

/// Fields safe to hand to unauthenticated clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicProfile {
    pub school_name: String,
    pub school_address: Option<String>,
    pub school_phone: Option<String>,
    pub school_email: Option<String>,
    pub academic_year: Option<String>,
    pub academic_semester: Option<String>,
}

impl From<&school_profile::Model> for PublicProfile {
    fn from(p: &school_profile::Model) -> Self {
        Self {
            school_name: p.name.clone(),
            school_address: p.address.clone(),
            school_phone: p.phone.clone(),
            school_email: p.email.clone(),
            academic_year: p.academic_year.clone(),
            academic_semester: p.academic_semester.clone(),
        }
    }
}

#[derive(Clone)]
pub struct SchoolProfiles {
    db: DatabaseConnection,
}

impl SchoolProfiles {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The profile row, created with defaults if missing.
    ///
    /// When the store is unreachable this returns an unsaved default marked as
    /// degraded; nothing was persisted in that case.
    pub async fn get_profile(&self) -> Outcome<school_profile::Model> {
        match self.load_or_create().await {
            Ok(profile) => Outcome::fresh(profile),
            Err(e) => {
                tracing::warn!("school profile unavailable, serving defaults: {e}");
                Outcome::degraded(
                    default_profile(chrono::Utc::now().fixed_offset()),
                    "school profile could not be loaded; showing defaults",
                )
            }
        }
    }

    async fn load_or_create(&self) -> Result<school_profile::Model, DbErr> {
        if let Some(profile) = school_profile::Entity::find_by_id(SINGLETON_ID)
            .one(&self.db)
            .await?
        {
            return Ok(profile);
        }

        let defaults = default_profile(chrono::Utc::now().fixed_offset());
        match insertable(&defaults).insert(&self.db).await {
            Ok(created) => {
                tracing::info!("created default school profile");
                Ok(created)
            }
            Err(insert_err) => {
                // A concurrent first read may have inserted the row already.
                school_profile::Entity::find_by_id(SINGLETON_ID)
                    .one(&self.db)
                    .await?
                    .ok_or(insert_err)
            }
        }
    }

    /// The saved profile, if any. Never creates the row.
    pub async fn current(&self) -> Result<Option<school_profile::Model>, CoreError> {
        Ok(school_profile::Entity::find_by_id(SINGLETON_ID)
            .one(&self.db)
            .await?)
    }

    /// Replace the profile with the form contents, creating the row if needed.
    pub async fn update_profile(
        &self,
        update: ProfileUpdate,
    ) -> Result<school_profile::Model, CoreError> {
        let now = chrono::Utc::now().fixed_offset();
        let txn = self.db.begin().await?;

        let existing = school_profile::Entity::find_by_id(SINGLETON_ID)
            .one(&txn)
            .await?;

        let saved = match existing {
            Some(current) => {
                let logo = update.logo.clone().or_else(|| current.logo.clone());
                let mut am: school_profile::ActiveModel = current.into();
                apply(&mut am, update, logo);
                am.updated_at = Set(now);
                am.update(&txn).await?
            }
            None => {
                let mut am = insertable(&default_profile(now));
                let logo = update.logo.clone();
                apply(&mut am, update, logo);
                am.insert(&txn).await?
            }
        };

        txn.commit().await?;
        tracing::info!(name = %saved.name, "school profile updated");
        Ok(saved)
    }
}

fn apply(am: &mut school_profile::ActiveModel, update: ProfileUpdate, logo: Option<String>) {
    am.logo = Set(logo);
    am.name = Set(update.name);
    am.address = Set(Some(update.address));
    am.phone = Set(Some(update.phone));
    am.email = Set(Some(update.email));
    am.vision = Set(Some(update.vision));
    am.mission = Set(Some(update.mission));
    am.core_values = Set(Some(update.core_values));
    am.google_maps_url = Set(Some(update.google_maps_url));
    am.youtube_url = Set(Some(update.youtube_url));
    am.instagram_url = Set(Some(update.instagram_url));
    am.telegram_url = Set(Some(update.telegram_url));
    am.snapchat_url = Set(Some(update.snapchat_url));
    am.whatsapp_url = Set(Some(update.whatsapp_url));
    am.academic_year = Set(Some(update.academic_year));
    am.academic_semester = Set(Some(update.academic_semester));
}

fn insertable(p: &school_profile::Model) -> school_profile::ActiveModel {
    school_profile::ActiveModel {
        id: Set(p.id),
        logo: Set(p.logo.clone()),
        name: Set(p.name.clone()),
        address: Set(p.address.clone()),
        phone: Set(p.phone.clone()),
        email: Set(p.email.clone()),
        vision: Set(p.vision.clone()),
        mission: Set(p.mission.clone()),
        core_values: Set(p.core_values.clone()),
        google_maps_url: Set(p.google_maps_url.clone()),
        youtube_url: Set(p.youtube_url.clone()),
        instagram_url: Set(p.instagram_url.clone()),
        telegram_url: Set(p.telegram_url.clone()),
        snapchat_url: Set(p.snapchat_url.clone()),
        whatsapp_url: Set(p.whatsapp_url.clone()),
        academic_year: Set(p.academic_year.clone()),
        academic_semester: Set(p.academic_semester.clone()),
        created_at: Set(p.created_at),
        updated_at: Set(p.updated_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_uses_singleton_id() {
        let p = default_profile(chrono::Utc::now().fixed_offset());
        assert_eq!(p.id, SINGLETON_ID);
        assert_eq!(p.name, "School Name");
        assert_eq!(p.academic_year.as_deref(), Some("2024-2025"));
        assert!(p.logo.is_none());
    }

    #[test]
    fn public_profile_exposes_contact_fields_only() {
        let p = default_profile(chrono::Utc::now().fixed_offset());
        let public = PublicProfile::from(&p);
        let json = serde_json::to_value(&public).unwrap();
        assert_eq!(json["school_name"], "School Name");
        assert_eq!(json["academic_semester"], "First Semester");
        assert!(json.get("vision").is_none());
        assert!(json.get("whatsapp_url").is_none());
    }

    #[test]
    fn profile_update_fills_missing_fields_with_empty_strings() {
        let update: ProfileUpdate = serde_json::from_str(r#"{"name": "Al Noor"}"#).unwrap();
        assert_eq!(update.name, "Al Noor");
        assert!(update.logo.is_none());
        assert_eq!(update.academic_year, "");
    }
}
