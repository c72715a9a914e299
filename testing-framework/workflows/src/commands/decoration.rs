use std::sync::Arc;

use async_trait::async_trait;
use doctor_core::{
    DataSource, DynError, FixtureId, FixtureRecord, SetupContext, TestResult, ValidationCommand,
};
use tracing::{debug, warn};

use super::DEFAULT_EXPECTED_TICKERS;

const TEST_NAME: &str = "Ticker Decoration";
const PASSED_MSG: &str = "Test Passed, all tickers have a chromosome";
const FAILED_MSG: &str = "Test Failed, tickers in database did not all have chromosomes";

/// Checks that every seeded ticker is back in the store carrying a
/// chromosome.
pub struct TickerDecorationCheck {
    data_source: Arc<dyn DataSource>,
    fixture_ids: Option<Vec<FixtureId>>,
}

impl TickerDecorationCheck {
    #[must_use]
    pub fn new(data_source: Arc<dyn DataSource>) -> Self {
        Self {
            data_source,
            fixture_ids: None,
        }
    }

    fn expected_count(&self) -> usize {
        self.fixture_ids
            .as_ref()
            .map_or(DEFAULT_EXPECTED_TICKERS, Vec::len)
    }
}

#[async_trait]
impl ValidationCommand for TickerDecorationCheck {
    type State = Vec<FixtureRecord>;

    fn name(&self) -> &str {
        TEST_NAME
    }

    fn prepare(&mut self, setup: &SetupContext) {
        self.fixture_ids = Some(setup.fixture_ids().to_vec());
    }

    async fn check_result(&self) -> Result<Vec<FixtureRecord>, DynError> {
        self.data_source
            .find_matching(self.fixture_ids.as_deref())
            .await
    }

    fn is_passing_result(&self, tickers: &Vec<FixtureRecord>) -> bool {
        let expected = self.expected_count();
        if tickers.len() != expected {
            debug!(expected, found = tickers.len(), "ticker count mismatch");
            return false;
        }

        let mut all_decorated = true;
        for ticker in tickers.iter().filter(|ticker| !ticker.has_marker()) {
            warn!(
                id = %ticker.id,
                symbol = %ticker.symbol,
                "ticker did not have an expected chromosome"
            );
            all_decorated = false;
        }
        all_decorated
    }

    fn process_passing_result(&self, _tickers: &Vec<FixtureRecord>) -> TestResult {
        TestResult::passed(TEST_NAME).with_msg(PASSED_MSG)
    }

    fn process_failing_result(&self, _tickers: Option<&Vec<FixtureRecord>>) -> TestResult {
        TestResult::failed(TEST_NAME).with_msg(FAILED_MSG)
    }

    fn reset(&mut self) {
        self.fixture_ids = None;
    }
}
