//! Sign-in endpoints.
//!
//! `POST /api/auth/login`: Unprotected: username/password for a bearer token
//! `POST /api/auth/logout`: Protected: ends the calling session
//! `GET /api/auth/me`: Protected: the calling account

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::accounts;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::db;
use crate::models::User;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: u64,
    pub user: User,
}

/// `POST /api/auth/login`: verify credentials and open a session.
///
/// Password verification runs PBKDF2, so it happens on the blocking pool.
pub async fn login(
    State(ctx): State<ApiContext>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if request.username.trim().is_empty() || request.password.is_empty() {
        return Err(ApiError::BadRequest("Username and password are required".into()));
    }

    let core = ctx.core.clone();
    let username = request.username.clone();
    let user = tokio::task::spawn_blocking(move || -> Result<Option<User>, ApiError> {
        let conn = core.open_db()?;
        Ok(accounts::authenticate(&conn, &username, &request.password)?)
    })
    .await??;

    let Some(user) = user else {
        tracing::warn!(username = %request.username.trim(), "Login failed");
        return Err(ApiError::Unauthorized);
    };

    let token = ctx.lock_sessions()?.issue(&user);
    tracing::info!(user_id = %user.id, role = %user.role, "Login succeeded");

    Ok(Json(LoginResponse {
        token,
        expires_in: ctx.core.config.session_ttl_secs,
        user,
    }))
}

/// `POST /api/auth/logout`: revoke the token used for this request.
pub async fn logout(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> Result<StatusCode, ApiError> {
    ctx.lock_sessions()?.revoke(&auth.token_hash);
    tracing::info!(user_id = %auth.user_id, "Logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/auth/me`
pub async fn me(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<User>, ApiError> {
    let conn = ctx.open_db()?;
    // The account may have been deleted while the session was live.
    let user = db::get_user(&conn, &auth.user_id)?.ok_or(ApiError::Unauthorized)?;
    Ok(Json(user))
}
