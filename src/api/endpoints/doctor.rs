//! Doctor endpoints. Every per-patient route requires an assignment.
//!
//! - `GET /api/doctor/patients`: dashboard rows for assigned patients
//! - `GET /api/doctor/patients/:patient_id/recovery-logs`
//! - `GET|POST /api/doctor/patients/:patient_id/notes`

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::parse_id;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::db;
use crate::metrics::compose_patient_views;
use crate::models::{DoctorNote, RecoveryLogEntry, Role};

/// Dashboard rows for a doctor's patients: profile merged with metrics.
///
/// Shared by the doctor dashboard and the admin per-doctor view. Entries
/// for all patients come from one query.
pub(crate) fn patient_views_for_doctor(
    conn: &Connection,
    doctor_id: &Uuid,
) -> Result<Vec<Value>, ApiError> {
    let patients = db::patients_for_doctor(conn, doctor_id)?;
    let ids: Vec<Uuid> = patients.iter().map(|p| p.id).collect();
    let entries = db::list_recovery_logs_for_patients(conn, &ids)?;
    Ok(compose_patient_views(&patients, entries, Utc::now())?)
}

fn ensure_assigned(conn: &Connection, doctor_id: &Uuid, patient_id: &Uuid) -> Result<(), ApiError> {
    if db::is_assigned(conn, doctor_id, patient_id)? {
        Ok(())
    } else {
        tracing::warn!(%doctor_id, %patient_id, "Doctor accessed unassigned patient");
        Err(ApiError::Forbidden)
    }
}

/// `GET /api/doctor/patients`
pub async fn patients(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<Value>>, ApiError> {
    auth.require_role(Role::Doctor)?;
    let conn = ctx.open_db()?;
    Ok(Json(patient_views_for_doctor(&conn, &auth.user_id)?))
}

/// `GET /api/doctor/patients/:patient_id/recovery-logs`
pub async fn patient_logs(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(patient_id): Path<String>,
) -> Result<Json<Vec<RecoveryLogEntry>>, ApiError> {
    auth.require_role(Role::Doctor)?;
    let patient_id = parse_id(&patient_id)?;

    let conn = ctx.open_db()?;
    ensure_assigned(&conn, &auth.user_id, &patient_id)?;
    Ok(Json(db::list_recovery_logs(&conn, &patient_id, None)?))
}

/// `GET /api/doctor/patients/:patient_id/notes`: the caller's own notes.
pub async fn list_notes(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(patient_id): Path<String>,
) -> Result<Json<Vec<DoctorNote>>, ApiError> {
    auth.require_role(Role::Doctor)?;
    let patient_id = parse_id(&patient_id)?;

    let conn = ctx.open_db()?;
    ensure_assigned(&conn, &auth.user_id, &patient_id)?;
    Ok(Json(db::list_doctor_notes(&conn, &patient_id, Some(&auth.user_id))?))
}

#[derive(Deserialize)]
pub struct NoteRequest {
    pub content: String,
}

/// `POST /api/doctor/patients/:patient_id/notes`
pub async fn add_note(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(patient_id): Path<String>,
    Json(request): Json<NoteRequest>,
) -> Result<(StatusCode, Json<DoctorNote>), ApiError> {
    auth.require_role(Role::Doctor)?;
    let patient_id = parse_id(&patient_id)?;
    if request.content.trim().is_empty() {
        return Err(ApiError::BadRequest("Note content is required".into()));
    }

    let conn = ctx.open_db()?;
    ensure_assigned(&conn, &auth.user_id, &patient_id)?;
    let note = db::insert_doctor_note(&conn, &auth.user_id, &patient_id, &request.content)?;
    tracing::info!(note_id = %note.id, %patient_id, "Doctor note added");

    Ok((StatusCode::CREATED, Json(note)))
}
