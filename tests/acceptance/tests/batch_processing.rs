//! End-to-end check against a deployed doctor server.
//!
//! Needs the doctor server, its database, the event bus and the hopper
//! service all running. Point `DOCTOR_URL` at the server and run with
//! `--ignored`.

use std::time::Duration;

use anyhow::Context as _;
use doctor_core::{TestReport, TestStatus};

const DEFAULT_DOCTOR_URL: &str = "http://localhost:8080";

#[tokio::test]
#[ignore = "requires a deployed doctor server and pipeline"]
async fn batch_processing_decorates_every_seeded_ticker() -> anyhow::Result<()> {
    let base = doctor_env::doctor_url().unwrap_or_else(|| DEFAULT_DOCTOR_URL.to_owned());
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(120))
        .build()?;

    let health = client
        .get(format!("{base}/health"))
        .send()
        .await
        .with_context(|| format!("doctor server at {base} is not reachable"))?;
    anyhow::ensure!(health.status().is_success(), "doctor health check failed");

    let report: TestReport = client
        .post(format!("{base}/test"))
        .send()
        .await
        .context("test run request failed")?
        .error_for_status()
        .context("doctor answered with an error status")?
        .json()
        .await
        .context("test report could not be decoded")?;

    for result in &report.results {
        println!(
            "{}: {}",
            result.test,
            if result.success { "passed" } else { "failed" }
        );
    }

    assert_eq!(report.error, None);
    assert_eq!(report.test_status, TestStatus::Passed, "{report:#?}");
    assert_eq!(report.results.len(), 3);
    Ok(())
}
