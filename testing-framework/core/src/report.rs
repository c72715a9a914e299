use serde::{Deserialize, Serialize};

use crate::validation::TestResult;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Passed,
    Failed,
    /// Fixture loading or the external trigger failed; nothing was validated.
    SetupFailed,
}

/// Body returned to monitoring after a test run.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestReport {
    pub test_status: TestStatus,
    pub results: Vec<TestResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestReport {
    /// A run fails as soon as one result reports `success == false`.
    #[must_use]
    pub fn from_results(results: Vec<TestResult>) -> Self {
        let test_status = if results.iter().any(|result| !result.success) {
            TestStatus::Failed
        } else {
            TestStatus::Passed
        };

        Self {
            test_status,
            results,
            error: None,
        }
    }

    #[must_use]
    pub fn setup_failed(error: impl Into<String>) -> Self {
        Self {
            test_status: TestStatus::SetupFailed,
            results: Vec::new(),
            error: Some(error.into()),
        }
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.test_status == TestStatus::Passed
    }
}
