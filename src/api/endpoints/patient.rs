//! Patient endpoints.
//!
//! - `POST /api/patient/recovery-logs`: record an entry
//! - `GET /api/patient/recovery-logs`: own entries, most recent first
//! - `GET /api/patient/notes`: notes doctors left for the caller
//! - `GET /api/patient/metrics`: own aggregated recovery metrics

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::db;
use crate::metrics::{aggregate_patient_metrics, compose_patient_view};
use crate::models::{DoctorNote, NewRecoveryLog, RecoveryLogEntry, Role};

/// Largest `limit` a history request may ask for.
const MAX_HISTORY_LIMIT: u32 = 500;

/// `POST /api/patient/recovery-logs`
pub async fn record(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Json(input): Json<NewRecoveryLog>,
) -> Result<(StatusCode, Json<RecoveryLogEntry>), ApiError> {
    auth.require_role(Role::Patient)?;

    input.validate().map_err(ApiError::BadRequest)?;

    let conn = ctx.open_db()?;
    let entry = db::record_recovery_log(&conn, &auth.user_id, &input)?;
    tracing::info!(entry_id = %entry.id, patient_id = %auth.user_id, "Recovery log recorded");

    Ok((StatusCode::CREATED, Json(entry)))
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

/// `GET /api/patient/recovery-logs`
pub async fn history(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<RecoveryLogEntry>>, ApiError> {
    auth.require_role(Role::Patient)?;

    if query.limit == Some(0) || query.limit.is_some_and(|l| l > MAX_HISTORY_LIMIT) {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {MAX_HISTORY_LIMIT}"
        )));
    }

    let conn = ctx.open_db()?;
    let entries = db::list_recovery_logs(&conn, &auth.user_id, query.limit)?;
    Ok(Json(entries))
}

/// `GET /api/patient/notes`
pub async fn notes(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<DoctorNote>>, ApiError> {
    auth.require_role(Role::Patient)?;
    let conn = ctx.open_db()?;
    Ok(Json(db::list_doctor_notes(&conn, &auth.user_id, None)?))
}

/// `GET /api/patient/metrics`: the same merged view a doctor sees.
pub async fn metrics(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Value>, ApiError> {
    auth.require_role(Role::Patient)?;

    let conn = ctx.open_db()?;
    let profile = db::get_patient_profile(&conn, &auth.user_id)?;
    let entries = db::list_recovery_logs(&conn, &auth.user_id, None)?;
    let view = aggregate_patient_metrics(&profile, &entries, Utc::now());

    Ok(Json(compose_patient_view(&profile, &view)?))
}
