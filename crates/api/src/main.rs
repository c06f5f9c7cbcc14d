use anyhow::Context;

use innkeep_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    innkeep_observability::init();

    let config = ApiConfig::from_env().context("invalid configuration")?;
    tracing::info!(
        environment = ?config.environment,
        token_ttl_secs = config.token_ttl.num_seconds(),
        rules = config.access_rules.len(),
        "configuration loaded"
    );

    let app = innkeep_api::app::build_app(&config)?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
