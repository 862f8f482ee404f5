pub mod analysis; // Oracle text → parsed tree
pub mod api; // HTTP router, sessions, endpoints
pub mod assistant; // Health chat + disease prediction
pub mod auth; // Patient accounts
pub mod config;
pub mod core_state; // Shared service state
pub mod db;
pub mod models;
pub mod oracle; // Gemini request builder + client
pub mod prescriptions; // Analyze / fetch / render / list / remove
pub mod prompts;
pub mod report; // PDF report renderer

use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::core_state::{CoreError, CoreState};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Failed to initialise core state: {0}")]
    Core(#[from] CoreError),
    #[error("Failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("Failed to start API server: {0}")]
    Server(String),
}

/// Start the service and block until Ctrl-C.
pub fn run() -> Result<(), StartupError> {
    let dotenv = config::load_dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(config::log_filter())
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    if let Some(path) = dotenv {
        tracing::info!(path = %path.display(), "Loaded .env file");
    }

    let config = AppConfig::from_env();

    // The blocking oracle client must be built and dropped outside the
    // async runtime.
    let core = Arc::new(CoreState::connect(config.clone())?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(core.clone(), config.bind_addr))?;
    drop(runtime);

    match Arc::try_unwrap(core) {
        Ok(core) => core.close()?,
        Err(_) => tracing::warn!("Core state still shared at shutdown; skipping close"),
    }
    tracing::info!("{} stopped", config::APP_NAME);
    Ok(())
}

async fn serve(core: Arc<CoreState>, bind: std::net::SocketAddr) -> Result<(), StartupError> {
    let mut server = api::start_api_server(core, bind)
        .await
        .map_err(StartupError::Server)?;

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {e}");
    }
    server.shutdown();
    server.wait().await;
    Ok(())
}
