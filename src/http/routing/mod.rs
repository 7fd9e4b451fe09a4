pub mod tasks;

use axum::{routing::get, Router};

/// Liveness check; answers as long as the process serves requests.
async fn health() -> &'static str {
    "ok"
}

/// Full HTTP surface: `/health` next to the task routes.
pub fn app(tasks: Router) -> Router {
    Router::new().route("/health", get(health)).merge(tasks)
}
