use std::sync::Arc;

use doctor_core::{
    DataSource, EventBuffer, ExternalProcessTrigger, RetryOptions, TestOrchestrator,
};

use crate::commands::{EventCountCheck, TickerDecorationCheck};

/// Extension methods for registering the built-in validation commands.
pub trait OrchestratorBuilderExt: Sized {
    #[must_use]
    /// Expect every seeded ticker to come back with a chromosome.
    fn expect_ticker_decoration(self, data_source: Arc<dyn DataSource>) -> Self;

    #[must_use]
    /// Expect exactly one batch-processing-started event.
    fn expect_batch_processing_started(self, buffer: Arc<EventBuffer>) -> Self;

    #[must_use]
    /// Expect one ticker-decorated event per seeded ticker.
    fn expect_tickers_decorated(self, buffer: Arc<EventBuffer>) -> Self;
}

impl OrchestratorBuilderExt for TestOrchestrator {
    fn expect_ticker_decoration(self, data_source: Arc<dyn DataSource>) -> Self {
        self.with_command(TickerDecorationCheck::new(data_source))
    }

    fn expect_batch_processing_started(self, buffer: Arc<EventBuffer>) -> Self {
        self.with_command(EventCountCheck::batch_processing_started(buffer))
    }

    fn expect_tickers_decorated(self, buffer: Arc<EventBuffer>) -> Self {
        self.with_command(EventCountCheck::tickers_decorated(buffer))
    }
}

/// Assembles the standard doctor command set. Every check is on unless
/// switched off.
pub struct DoctorSuiteBuilder {
    data_source: Arc<dyn DataSource>,
    trigger: Arc<dyn ExternalProcessTrigger>,
    buffer: Arc<EventBuffer>,
    retry_options: RetryOptions,
    ticker_decoration: bool,
    batch_processing_started: bool,
    tickers_decorated: bool,
}

impl DoctorSuiteBuilder {
    #[must_use]
    pub fn new(
        data_source: Arc<dyn DataSource>,
        trigger: Arc<dyn ExternalProcessTrigger>,
        buffer: Arc<EventBuffer>,
    ) -> Self {
        Self {
            data_source,
            trigger,
            buffer,
            retry_options: RetryOptions::default(),
            ticker_decoration: true,
            batch_processing_started: true,
            tickers_decorated: true,
        }
    }

    #[must_use]
    pub fn retry_options(mut self, retry_options: RetryOptions) -> Self {
        self.retry_options = retry_options;
        self
    }

    #[must_use]
    pub fn ticker_decoration(mut self, enabled: bool) -> Self {
        self.ticker_decoration = enabled;
        self
    }

    #[must_use]
    pub fn batch_processing_started(mut self, enabled: bool) -> Self {
        self.batch_processing_started = enabled;
        self
    }

    #[must_use]
    pub fn tickers_decorated(mut self, enabled: bool) -> Self {
        self.tickers_decorated = enabled;
        self
    }

    /// Report order is decoration, started, decorated.
    #[must_use]
    pub fn build(self) -> TestOrchestrator {
        let mut orchestrator = TestOrchestrator::new(
            Arc::clone(&self.data_source),
            self.trigger,
            self.retry_options,
        );
        if self.ticker_decoration {
            orchestrator = orchestrator.expect_ticker_decoration(self.data_source);
        }
        if self.batch_processing_started {
            orchestrator = orchestrator.expect_batch_processing_started(Arc::clone(&self.buffer));
        }
        if self.tickers_decorated {
            orchestrator = orchestrator.expect_tickers_decorated(self.buffer);
        }
        orchestrator
    }
}

/// The full doctor check: decoration in the store plus the started and
/// decorated event counts.
#[must_use]
pub fn standard_suite(
    data_source: Arc<dyn DataSource>,
    trigger: Arc<dyn ExternalProcessTrigger>,
    buffer: Arc<EventBuffer>,
    retry_options: RetryOptions,
) -> TestOrchestrator {
    DoctorSuiteBuilder::new(data_source, trigger, buffer)
        .retry_options(retry_options)
        .build()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use doctor_core::{DynError, FixtureId, FixtureRecord};

    use super::*;

    struct Nothing;

    #[async_trait]
    impl DataSource for Nothing {
        async fn load_fixtures(&self) -> Result<Vec<FixtureId>, DynError> {
            Ok(Vec::new())
        }

        async fn find_matching(
            &self,
            _ids: Option<&[FixtureId]>,
        ) -> Result<Vec<FixtureRecord>, DynError> {
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl ExternalProcessTrigger for Nothing {
        async fn run(&self) -> Result<(), DynError> {
            Ok(())
        }
    }

    fn builder() -> DoctorSuiteBuilder {
        DoctorSuiteBuilder::new(
            Arc::new(Nothing),
            Arc::new(Nothing),
            Arc::new(EventBuffer::default()),
        )
    }

    #[test]
    fn registers_all_checks_in_report_order() {
        let orchestrator = builder().build();

        assert_eq!(
            orchestrator.command_names(),
            vec![
                "Ticker Decoration",
                "Batch Processing Started Event",
                "Tickers Decorated Events",
            ]
        );
        assert_eq!(*orchestrator.retry_options(), RetryOptions::default());
    }

    #[test]
    fn disabled_checks_are_left_out() {
        let options = RetryOptions::default().with_attempts(3);
        let orchestrator = builder()
            .ticker_decoration(false)
            .batch_processing_started(false)
            .retry_options(options)
            .build();

        assert_eq!(orchestrator.command_names(), vec!["Tickers Decorated Events"]);
        assert_eq!(orchestrator.retry_options().attempts, 3);
    }
}
