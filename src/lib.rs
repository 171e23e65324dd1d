pub mod accounts;
pub mod api; // REST API for the SPA
pub mod config;
pub mod core_state;
pub mod crypto;
pub mod db;
pub mod metrics; // Recovery metrics aggregation
pub mod models;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Core(#[from] core_state::CoreError),
    #[error(transparent)]
    Server(#[from] api::ServerError),
    #[error("Failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

pub fn run() -> Result<(), StartupError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("Recovery tracker starting v{}", config::APP_VERSION);

    let config = config::AppConfig::from_env()?;
    tracing::info!(
        bind = %config.bind_addr,
        data_dir = %config.data_dir.display(),
        spa = config.static_dir.is_some(),
        "Configuration loaded"
    );

    let core = Arc::new(core_state::CoreState::new(config));
    core.initialize()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(api::server::serve_until_ctrl_c(core))?;

    tracing::info!("Recovery tracker stopped");
    Ok(())
}
