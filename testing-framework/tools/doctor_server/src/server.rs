use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use doctor_core::{TestOrchestrator, TestReport};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Shared orchestrator. Runs are serialized so buffered events and seeded
/// fixtures of concurrent requests never interleave.
pub type SharedOrchestrator = Arc<Mutex<TestOrchestrator>>;

pub fn doctor_app(orchestrator: TestOrchestrator) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/test", post(run_test))
        .with_state(Arc::new(Mutex::new(orchestrator)))
}

async fn health() -> &'static str {
    "ok"
}

async fn run_test(State(orchestrator): State<SharedOrchestrator>) -> impl IntoResponse {
    info!("test run requested");
    let run = tokio::spawn(async move {
        let mut orchestrator = orchestrator.lock().await;
        orchestrator.test().await
    });

    match run.await {
        Ok(Ok(results)) => {
            let report = TestReport::from_results(results);
            info!(passed = report.passed(), "test run finished");
            (StatusCode::OK, Json(report)).into_response()
        }
        Ok(Err(err)) => {
            warn!(error = %err, "test run aborted during setup");
            (StatusCode::OK, Json(TestReport::setup_failed(err.to_string()))).into_response()
        }
        Err(err) => {
            error!(error = %err, "test run crashed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    }
}
