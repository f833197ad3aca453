use axum::{extract::State, Json};
use std::sync::Arc;

use schoolhub_core::{Outcome, PublicProfile, SchoolProfiles};
use schoolhub_db::AppState;

/// GET /api/school/profile: public school contact details (no auth)
pub async fn public_profile(State(state): State<Arc<AppState>>) -> Json<Outcome<PublicProfile>> {
    let outcome = SchoolProfiles::new(state.db.clone()).get_profile().await;
    Json(outcome.map(|p| PublicProfile::from(&p)))
}
