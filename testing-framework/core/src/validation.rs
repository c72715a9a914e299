use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::collaborators::FixtureId;

pub type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Outcome of a single validation command, one entry of the final report.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub test: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl TestResult {
    #[must_use]
    pub fn passed(test: impl Into<String>) -> Self {
        Self {
            test: test.into(),
            success: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failed(test: impl Into<String>) -> Self {
        Self {
            test: test.into(),
            success: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = Some(msg.into());
        self
    }

    #[must_use]
    pub fn with_counts(mut self, expected: u64, received: u64) -> Self {
        self.expected = Some(expected);
        self.received = Some(received);
        self
    }
}

/// Values produced by the one-time setup that commands may need before their
/// first check.
#[derive(Clone, Debug, Default)]
pub struct SetupContext {
    fixture_ids: Vec<FixtureId>,
}

impl SetupContext {
    #[must_use]
    pub const fn new(fixture_ids: Vec<FixtureId>) -> Self {
        Self { fixture_ids }
    }

    #[must_use]
    pub fn fixture_ids(&self) -> &[FixtureId] {
        &self.fixture_ids
    }

    #[must_use]
    pub fn fixture_count(&self) -> usize {
        self.fixture_ids.len()
    }
}

#[async_trait]
/// A pollable check: fetch state, judge it, format a result.
///
/// Implementations pull fresh state on every `check_result` call. `reset` is
/// invoked once after the terminal attempt so an instance can be reused by the
/// next run.
pub trait ValidationCommand: Send + Sync {
    type State: Send + Sync;

    fn name(&self) -> &str;

    fn prepare(&mut self, _setup: &SetupContext) {}

    async fn check_result(&self) -> Result<Self::State, DynError>;

    fn is_passing_result(&self, state: &Self::State) -> bool;

    fn process_passing_result(&self, state: &Self::State) -> TestResult;

    /// `state` is `None` when no check ever succeeded.
    fn process_failing_result(&self, state: Option<&Self::State>) -> TestResult;

    fn reset(&mut self);
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn result_omits_absent_fields() {
        let result = TestResult::passed("Ticker Decoration").with_msg("all good");

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({ "test": "Ticker Decoration", "success": true, "msg": "all good" })
        );
    }

    #[test]
    fn result_carries_counts() {
        let result = TestResult::failed("Tickers Decorated Events").with_counts(10, 3);

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "test": "Tickers Decorated Events",
                "success": false,
                "expected": 10,
                "received": 3,
            })
        );
    }
}
