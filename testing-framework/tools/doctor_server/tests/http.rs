use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use doctor_core::{
    DataSource, DynError, ExternalProcessTrigger, FixtureId, FixtureRecord, HopperClient,
    RetryOptions, TestOrchestrator, TestResult, ValidationCommand,
};
use doctor_server::doctor_app;
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::net::TcpListener;

#[derive(Clone, Copy)]
enum Setup {
    Healthy,
    MissingRows,
    Panics,
}

struct FakeStore(Setup);

#[async_trait]
impl DataSource for FakeStore {
    async fn load_fixtures(&self) -> Result<Vec<FixtureId>, DynError> {
        match self.0 {
            Setup::Healthy => Ok(vec!["a".to_owned(), "b".to_owned()]),
            Setup::MissingRows => Err(doctor_core::FixtureLoadError::CountMismatch {
                expected: 10,
                actual: 7,
            }
            .into()),
            Setup::Panics => panic!("store exploded"),
        }
    }

    async fn find_matching(
        &self,
        _ids: Option<&[FixtureId]>,
    ) -> Result<Vec<FixtureRecord>, DynError> {
        Ok(Vec::new())
    }
}

struct NoopTrigger;

#[async_trait]
impl ExternalProcessTrigger for NoopTrigger {
    async fn run(&self) -> Result<(), DynError> {
        Ok(())
    }
}

/// Resolves to a fixed verdict on its first check.
struct Verdict {
    name: &'static str,
    passing: bool,
}

#[async_trait]
impl ValidationCommand for Verdict {
    type State = bool;

    fn name(&self) -> &str {
        self.name
    }

    async fn check_result(&self) -> Result<bool, DynError> {
        Ok(self.passing)
    }

    fn is_passing_result(&self, state: &bool) -> bool {
        *state
    }

    fn process_passing_result(&self, _state: &bool) -> TestResult {
        TestResult::passed(self.name)
    }

    fn process_failing_result(&self, _state: Option<&bool>) -> TestResult {
        TestResult::failed(self.name).with_msg("verdict was negative")
    }

    fn reset(&mut self) {}
}

fn orchestrator(setup: Setup, verdicts: &[(&'static str, bool)]) -> TestOrchestrator {
    verdicts.iter().fold(
        TestOrchestrator::new(
            Arc::new(FakeStore(setup)),
            Arc::new(NoopTrigger),
            RetryOptions::new(1, Duration::from_millis(5)),
        ),
        |orchestrator, &(name, passing)| orchestrator.with_command(Verdict { name, passing }),
    )
}

async fn serve(orchestrator: TestOrchestrator) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, doctor_app(orchestrator)).await.unwrap();
    });
    format!("http://{addr}")
}

async fn post_test(base: &str) -> (StatusCode, Value) {
    let response = reqwest::Client::new()
        .post(format!("{base}/test"))
        .send()
        .await
        .unwrap();
    let status = response.status();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn health_answers_ok() {
    let base = serve(orchestrator(Setup::Healthy, &[])).await;

    let body = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert_eq!(body, "ok");
}

#[tokio::test]
async fn passing_run_reports_passed() {
    let base = serve(orchestrator(Setup::Healthy, &[("first", true), ("second", true)])).await;

    let (status, body) = post_test(&base).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "testStatus": "passed",
            "results": [
                { "test": "first", "success": true },
                { "test": "second", "success": true },
            ],
        })
    );
}

#[tokio::test]
async fn one_failing_command_fails_the_run() {
    let base = serve(orchestrator(Setup::Healthy, &[("first", true), ("second", false)])).await;

    let (status, body) = post_test(&base).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["testStatus"], "failed");
    assert_eq!(body["results"][1]["success"], false);
    assert_eq!(body["results"][1]["msg"], "verdict was negative");
}

#[tokio::test]
async fn fixture_failure_is_reported_as_setup_failed() {
    let base = serve(orchestrator(Setup::MissingRows, &[("first", true)])).await;

    let (status, body) = post_test(&base).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["testStatus"], "setup_failed");
    assert_eq!(body["results"], json!([]));
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("expected 10 tickers to be inserted but 7 were actually inserted")
    );
}

#[tokio::test]
async fn crashed_run_answers_500_and_server_keeps_serving() {
    let base = serve(orchestrator(Setup::Panics, &[("first", true)])).await;

    let (status, body) = post_test(&base).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());

    let (status, _) = post_test(&base).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let health = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);
}

/// Accepts connections and never answers.
async fn silent_hopper() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn silent_hopper_yields_setup_failed_and_frees_the_server() {
    let hopper = HopperClient::with_timeout(&silent_hopper().await, Duration::from_millis(200))
        .unwrap();
    let orchestrator = TestOrchestrator::new(
        Arc::new(FakeStore(Setup::Healthy)),
        Arc::new(hopper),
        RetryOptions::new(1, Duration::from_millis(5)),
    )
    .with_command(Verdict {
        name: "first",
        passing: true,
    });
    let base = serve(orchestrator).await;

    for _ in 0..2 {
        let (status, body) = tokio::time::timeout(Duration::from_secs(5), post_test(&base))
            .await
            .expect("test run should finish once the hopper request times out");

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["testStatus"], "setup_failed");
        assert!(body["error"].as_str().unwrap().contains("external processing trigger failed"));
    }
}
