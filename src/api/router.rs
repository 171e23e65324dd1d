//! API router.
//!
//! Returns a composable `Router` with every endpoint under `/api/`, plus an
//! optional static SPA mount when a build directory is configured.
//!
//! Middleware stack for protected routes (outermost → innermost):
//! Extension → Auth validator → Audit logger → Handler

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the full application router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

/// Build router from a pre-constructed `ApiContext`, so tests can reach
/// the session store directly.
pub(crate) fn build_router(ctx: ApiContext) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route("/auth/logout", post(endpoints::auth::logout))
        .route("/auth/me", get(endpoints::auth::me))
        .route(
            "/patient/recovery-logs",
            post(endpoints::patient::record).get(endpoints::patient::history),
        )
        .route("/patient/notes", get(endpoints::patient::notes))
        .route("/patient/metrics", get(endpoints::patient::metrics))
        .route("/doctor/patients", get(endpoints::doctor::patients))
        .route(
            "/doctor/patients/:patient_id/recovery-logs",
            get(endpoints::doctor::patient_logs),
        )
        .route(
            "/doctor/patients/:patient_id/notes",
            get(endpoints::doctor::list_notes).post(endpoints::doctor::add_note),
        )
        .route(
            "/admin/users",
            get(endpoints::admin::list_users).post(endpoints::admin::create_user),
        )
        .route(
            "/admin/users/:user_id",
            get(endpoints::admin::get_user).delete(endpoints::admin::delete_user),
        )
        .route(
            "/admin/assignments",
            get(endpoints::admin::list_assignments).post(endpoints::admin::create_assignment),
        )
        .route(
            "/admin/assignments/:assignment_id",
            delete(endpoints::admin::delete_assignment),
        )
        .route(
            "/admin/doctors/:doctor_id/patients",
            get(endpoints::admin::doctor_patients),
        )
        .route(
            "/admin/patients/:patient_id/notes",
            get(endpoints::admin::patient_notes),
        )
        .route(
            "/admin/recovery-logs/import",
            post(endpoints::admin::import_logs),
        )
        .with_state(ctx.clone())
        // Middleware stack (innermost first, outermost last):
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx.clone()));

    let unprotected = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/auth/login", post(endpoints::auth::login))
        .with_state(ctx.clone())
        .layer(axum::Extension(ctx.clone()));

    let mut app = Router::new()
        .nest("/api", protected)
        .nest("/api", unprotected);

    if let Some(dir) = ctx.core.config.static_dir.clone() {
        tracing::info!(dir = %dir.display(), "Serving SPA build");
        let index = ServeFile::new(dir.join("index.html"));
        app = app.fallback_service(ServeDir::new(dir).fallback(index));
    }

    app.layer(SetResponseHeaderLayer::if_not_present(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    ))
    .layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
    )
}
