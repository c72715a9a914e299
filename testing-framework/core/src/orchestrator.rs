use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use async_trait::async_trait;
use futures::{FutureExt as _, future::join_all};
use thiserror::Error;
use tracing::{error, info};

use crate::{
    collaborators::{DataSource, ExternalProcessTrigger},
    retry::{RetryOptions, RetryScheduler},
    validation::{DynError, SetupContext, TestResult, ValidationCommand},
};

/// Setup failures. Validation failures never surface here; they are failing
/// entries in the returned results.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("fixture loading failed: {0}")]
    FixtureLoad(#[source] DynError),
    #[error("external processing trigger failed: {0}")]
    Trigger(#[source] DynError),
}

#[async_trait]
/// Object-safe view of a [`ValidationCommand`] driven by the
/// [`RetryScheduler`]. Every command gets it through the blanket impl.
pub trait RetryableValidation: Send + Sync {
    fn label(&self) -> &str;

    fn prepare_run(&mut self, setup: &SetupContext);

    async fn run_to_completion(&mut self, options: &RetryOptions) -> TestResult;

    fn finalize(&mut self);
}

#[async_trait]
impl<C> RetryableValidation for C
where
    C: ValidationCommand,
{
    fn label(&self) -> &str {
        self.name()
    }

    fn prepare_run(&mut self, setup: &SetupContext) {
        self.prepare(setup);
    }

    async fn run_to_completion(&mut self, options: &RetryOptions) -> TestResult {
        RetryScheduler::run(self, options).await
    }

    fn finalize(&mut self) {
        self.reset();
    }
}

/// Seeds fixtures, triggers the batch job and then polls every registered
/// command concurrently.
pub struct TestOrchestrator {
    data_source: Arc<dyn DataSource>,
    trigger: Arc<dyn ExternalProcessTrigger>,
    retry_options: RetryOptions,
    commands: Vec<Box<dyn RetryableValidation>>,
}

impl TestOrchestrator {
    #[must_use]
    pub fn new(
        data_source: Arc<dyn DataSource>,
        trigger: Arc<dyn ExternalProcessTrigger>,
        retry_options: RetryOptions,
    ) -> Self {
        Self {
            data_source,
            trigger,
            retry_options,
            commands: Vec::new(),
        }
    }

    #[must_use]
    /// Registers a command; results come back in registration order.
    pub fn with_command<C>(mut self, command: C) -> Self
    where
        C: ValidationCommand + 'static,
    {
        self.commands.push(Box::new(command));
        self
    }

    #[must_use]
    pub const fn retry_options(&self) -> &RetryOptions {
        &self.retry_options
    }

    #[must_use]
    pub fn command_names(&self) -> Vec<&str> {
        self.commands.iter().map(|command| command.label()).collect()
    }

    /// Runs one full test: fixtures, trigger, then every command's retry loop.
    ///
    /// Setup steps are not retried and a failure in either of them aborts the
    /// run before any command is checked.
    pub async fn test(&mut self) -> Result<Vec<TestResult>, OrchestratorError> {
        let fixture_ids = self
            .data_source
            .load_fixtures()
            .await
            .map_err(OrchestratorError::FixtureLoad)?;
        info!(fixtures = fixture_ids.len(), "fixtures loaded");

        self.trigger.run().await.map_err(OrchestratorError::Trigger)?;
        info!("external processing triggered");

        let setup = SetupContext::new(fixture_ids);
        for command in &mut self.commands {
            command.prepare_run(&setup);
        }

        let options = self.retry_options;
        info!(
            commands = self.commands.len(),
            attempts = options.attempts,
            wait_ms = options.wait.as_millis(),
            "running validations"
        );

        let runs = self
            .commands
            .iter_mut()
            .map(|command| run_isolated(command.as_mut(), &options));
        let results = join_all(runs).await;

        let failed = results.iter().filter(|result| !result.success).count();
        info!(total = results.len(), failed, "validations finished");
        Ok(results)
    }
}

/// Keeps a panicking command from taking its siblings down with it.
async fn run_isolated(command: &mut dyn RetryableValidation, options: &RetryOptions) -> TestResult {
    let name = command.label().to_owned();
    let outcome = AssertUnwindSafe(command.run_to_completion(options))
        .catch_unwind()
        .await;

    match outcome {
        Ok(result) => result,
        Err(panic) => {
            let message = panic_message(panic);
            error!(command = %name, %message, "validation panicked");
            command.finalize();
            TestResult::failed(name).with_msg(format!("validation panicked: {message}"))
        }
    }
}

/// Attempts to turn a panic payload into a readable string for diagnostics.
fn panic_message(panic: Box<dyn Any + Send>) -> String {
    panic.downcast::<String>().map_or_else(
        |panic| {
            panic.downcast::<&'static str>().map_or_else(
                |_| "unknown panic".to_owned(),
                |message| (*message).to_owned(),
            )
        },
        |message| *message,
    )
}
