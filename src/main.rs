use tasklist::application::task_service::TaskServiceImpl;
use tasklist::config::Config;
use tasklist::domain::repository::TaskRepository;
use tasklist::http::routing::{self, tasks};
use tasklist::infrastructure::sqlite_repo::{prepare_sqlite_file, SqliteTaskRepository};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    prepare_sqlite_file(&config.database_url)?;
    let repo = SqliteTaskRepository::connect(&config.database_url).await?;
    repo.init().await?;
    let service = TaskServiceImpl::new(repo);
    let router = routing::app(tasks::router(tasks::AppState { service }));

    let addr = config.bind_addr;
    tracing::info!(%addr, database_url = %config.database_url, "listening");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Resolves on Ctrl-C so in-flight requests can finish before exit.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("ctrl-c received, draining connections"),
        Err(e) => {
            // no signal handler means no way to stop gracefully; keep serving
            tracing::error!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    }
}
