use std::sync::Arc;

use async_trait::async_trait;
use doctor_core::{
    BufferedEvent, DynError, EventBuffer, SetupContext, TestResult, ValidationCommand,
    events::{BATCH_PROCESSING_STARTED, TICKER_DECORATED},
};

use super::DEFAULT_EXPECTED_TICKERS;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExpectedCount {
    Exactly(usize),
    /// One event per fixture seeded in the current run.
    FixtureCount,
}

/// Passes once the buffer holds exactly the expected number of events with a
/// given name.
pub struct EventCountCheck {
    test: String,
    event_name: String,
    buffer: Arc<EventBuffer>,
    expected: ExpectedCount,
    fixture_count: Option<usize>,
}

impl EventCountCheck {
    #[must_use]
    pub fn new(
        test: impl Into<String>,
        event_name: impl Into<String>,
        buffer: Arc<EventBuffer>,
        expected: ExpectedCount,
    ) -> Self {
        Self {
            test: test.into(),
            event_name: event_name.into(),
            buffer,
            expected,
            fixture_count: None,
        }
    }

    /// Exactly one batch-processing-started signal.
    #[must_use]
    pub fn batch_processing_started(buffer: Arc<EventBuffer>) -> Self {
        Self::new(
            "Batch Processing Started Event",
            BATCH_PROCESSING_STARTED,
            buffer,
            ExpectedCount::Exactly(1),
        )
    }

    /// One ticker-decorated signal per seeded fixture.
    #[must_use]
    pub fn tickers_decorated(buffer: Arc<EventBuffer>) -> Self {
        Self::new(
            "Tickers Decorated Events",
            TICKER_DECORATED,
            buffer,
            ExpectedCount::FixtureCount,
        )
    }

    #[must_use]
    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    fn expected_count(&self) -> usize {
        match self.expected {
            ExpectedCount::Exactly(count) => count,
            ExpectedCount::FixtureCount => self.fixture_count.unwrap_or(DEFAULT_EXPECTED_TICKERS),
        }
    }

    fn result(&self, success: bool, received: usize) -> TestResult {
        let result = if success {
            TestResult::passed(self.test.as_str())
        } else {
            TestResult::failed(self.test.as_str())
        };
        result.with_counts(self.expected_count() as u64, received as u64)
    }
}

#[async_trait]
impl ValidationCommand for EventCountCheck {
    type State = Vec<BufferedEvent>;

    fn name(&self) -> &str {
        &self.test
    }

    fn prepare(&mut self, setup: &SetupContext) {
        self.fixture_count = Some(setup.fixture_count());
    }

    async fn check_result(&self) -> Result<Vec<BufferedEvent>, DynError> {
        Ok(self.buffer.events_by_name(&self.event_name))
    }

    fn is_passing_result(&self, events: &Vec<BufferedEvent>) -> bool {
        events.len() == self.expected_count()
    }

    fn process_passing_result(&self, events: &Vec<BufferedEvent>) -> TestResult {
        self.result(true, events.len())
    }

    fn process_failing_result(&self, events: Option<&Vec<BufferedEvent>>) -> TestResult {
        self.result(false, events.map_or(0, Vec::len))
    }

    fn reset(&mut self) {
        self.buffer.clear_events_by_name(&self.event_name);
        self.fixture_count = None;
    }
}
