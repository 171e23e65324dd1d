//! HTTP API consumed by the single-page app.
//!
//! Routes are nested under `/api/`. Protected routes run behind
//! Auth → Audit middleware; login and health are open.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_server, ApiServer, ServerError};
pub use types::ApiContext;
