use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dockhand_server::api;
use dockhand_server::collaborator::check_tool_available;
use dockhand_server::config::Config;
use dockhand_server::process::{CommandRunner, TokioCommandRunner};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dockhand_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Dockhand...");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        "Loaded configuration: repositories_root={}, image_prefix={}, runtime={}, rollback_on_failure={}",
        config.repositories_root.display(),
        config.image_prefix,
        config.container_program,
        config.rollback_on_failure
    );

    let runner: Arc<dyn CommandRunner> = Arc::new(TokioCommandRunner::new());

    // Missing tools are reported, not fatal: the failing stage says so too
    for program in [&config.git_program, &config.container_program] {
        if check_tool_available(runner.as_ref(), program).await.is_err() {
            warn!("{} is not available, deployments will fail", program);
        }
    }

    if !config.static_dir.is_dir() {
        warn!(
            "Static directory {} does not exist, the web front end will not be served",
            config.static_dir.display()
        );
    }

    let state = dockhand_server::build_state(&config, runner)?;
    let app = api::create_router(state, &config.static_dir);

    info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Dockhand stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
