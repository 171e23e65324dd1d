//! Admin endpoints: accounts, assignments, per-doctor dashboards and
//! bulk import of legacy recovery logs.

use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::doctor::patient_views_for_doctor;
use super::parse_id;
use crate::accounts;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::db;
use crate::models::{
    Assignment, DoctorNote, NewAssignment, NewUser, RecoveryLogEntry, Role, User,
};

#[derive(Deserialize)]
pub struct UserListQuery {
    pub role: Option<String>,
}

/// `GET /api/admin/users`
pub async fn list_users(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    auth.require_role(Role::Admin)?;
    let role = query
        .role
        .as_deref()
        .map(Role::from_str)
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let conn = ctx.open_db()?;
    Ok(Json(db::list_users(&conn, role)?))
}

/// `POST /api/admin/users`: create a patient or doctor account.
pub async fn create_user(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Json(input): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    auth.require_role(Role::Admin)?;

    let core = ctx.core.clone();
    let user = tokio::task::spawn_blocking(move || -> Result<User, ApiError> {
        let conn = core.open_db()?;
        Ok(accounts::create_account(
            &conn,
            &input,
            core.config.password_iterations,
        )?)
    })
    .await??;

    Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /api/admin/users/:user_id`
pub async fn get_user(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<String>,
) -> Result<Json<User>, ApiError> {
    auth.require_role(Role::Admin)?;
    let user_id = parse_id(&user_id)?;

    let conn = ctx.open_db()?;
    let user = db::get_user(&conn, &user_id)?
        .ok_or_else(|| ApiError::NotFound(format!("user {user_id} not found")))?;
    Ok(Json(user))
}

/// `DELETE /api/admin/users/:user_id`: removes the account with its logs,
/// notes and assignments, and ends its sessions.
pub async fn delete_user(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    auth.require_role(Role::Admin)?;
    let user_id = parse_id(&user_id)?;

    let conn = ctx.open_db()?;
    let user = db::get_user(&conn, &user_id)?
        .ok_or_else(|| ApiError::NotFound(format!("user {user_id} not found")))?;
    if user.role == Role::Admin {
        return Err(ApiError::BadRequest("The admin account cannot be deleted".into()));
    }
    db::delete_user(&conn, &user_id)?;

    let revoked = ctx.lock_sessions()?.revoke_user(&user_id);
    tracing::info!(%user_id, role = %user.role, revoked, "Account deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentQuery {
    pub doctor_id: Option<String>,
}

/// `GET /api/admin/assignments`
pub async fn list_assignments(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<AssignmentQuery>,
) -> Result<Json<Vec<Assignment>>, ApiError> {
    auth.require_role(Role::Admin)?;
    let doctor_id = query.doctor_id.as_deref().map(parse_id).transpose()?;

    let conn = ctx.open_db()?;
    Ok(Json(db::list_assignments(&conn, doctor_id.as_ref())?))
}

/// `POST /api/admin/assignments`
pub async fn create_assignment(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Json(input): Json<NewAssignment>,
) -> Result<(StatusCode, Json<Assignment>), ApiError> {
    auth.require_role(Role::Admin)?;

    let conn = ctx.open_db()?;
    let assignment = db::insert_assignment(&conn, &input.doctor_id, &input.patient_id)?;
    tracing::info!(
        assignment_id = %assignment.id,
        doctor_id = %assignment.doctor_id,
        patient_id = %assignment.patient_id,
        "Assignment created"
    );

    Ok((StatusCode::CREATED, Json(assignment)))
}

/// `DELETE /api/admin/assignments/:assignment_id`
pub async fn delete_assignment(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(assignment_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    auth.require_role(Role::Admin)?;
    let assignment_id = parse_id(&assignment_id)?;

    let conn = ctx.open_db()?;
    let removed = db::delete_assignment(&conn, &assignment_id)?;
    tracing::info!(
        %assignment_id,
        doctor_id = %removed.doctor_id,
        patient_id = %removed.patient_id,
        "Assignment removed"
    );
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/admin/doctors/:doctor_id/patients`: any doctor's dashboard.
pub async fn doctor_patients(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Vec<Value>>, ApiError> {
    auth.require_role(Role::Admin)?;
    let doctor_id = parse_id(&doctor_id)?;

    let conn = ctx.open_db()?;
    db::get_user_with_role(&conn, &doctor_id, Role::Doctor)?;
    Ok(Json(patient_views_for_doctor(&conn, &doctor_id)?))
}

/// `GET /api/admin/patients/:patient_id/notes`: every doctor's notes.
pub async fn patient_notes(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(patient_id): Path<String>,
) -> Result<Json<Vec<DoctorNote>>, ApiError> {
    auth.require_role(Role::Admin)?;
    let patient_id = parse_id(&patient_id)?;

    let conn = ctx.open_db()?;
    db::get_patient_profile(&conn, &patient_id)?;
    Ok(Json(db::list_doctor_notes(&conn, &patient_id, None)?))
}

#[derive(Serialize)]
pub struct ImportResponse {
    pub imported: usize,
}

/// `POST /api/admin/recovery-logs/import`: all-or-nothing batch insert.
pub async fn import_logs(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Json(entries): Json<Vec<RecoveryLogEntry>>,
) -> Result<Json<ImportResponse>, ApiError> {
    auth.require_role(Role::Admin)?;
    if entries.is_empty() {
        return Err(ApiError::BadRequest("Nothing to import".into()));
    }

    let mut conn = ctx.open_db()?;
    let imported = db::import_recovery_logs(&mut conn, &entries)?;
    tracing::info!(imported, "Recovery logs imported");

    Ok(Json(ImportResponse { imported }))
}
