use std::net::SocketAddr;
use tokio::signal;
use tracing_subscriber::{EnvFilter, fmt};

use gql_gateway::shell::bootstrap;
use gql_gateway::shell::config::{AppConfig, ConfigSnapshot};
use gql_gateway::shell::http::router;
use gql_gateway::shell::workers::spawn_rate_limit_sweeper;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env first so RUST_LOG from it reaches the filter
    let snapshot = ConfigSnapshot::from_env();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = AppConfig::from_snapshot(&snapshot)?;
    let connection = bootstrap::connect(&config.mongodb_uri).await?;
    let state = bootstrap::server_state(&config, &connection);
    let sweeper = spawn_rate_limit_sweeper(state.limiter.clone());

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!("GraphQL endpoint: http://{}/graphql", listener.local_addr()?);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweeper.abort();
    connection.close().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(%error, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown requested");
}
