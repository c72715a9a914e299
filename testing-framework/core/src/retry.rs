use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::validation::{TestResult, ValidationCommand};

const DEFAULT_ATTEMPTS: u32 = 10;
const DEFAULT_WAIT: Duration = Duration::from_millis(1000);

/// Polling budget shared by every command of one orchestrator run.
///
/// `attempts` counts checks actually performed, so `attempts = 0` gives up
/// without checking at all.
#[serde_as]
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RetryOptions {
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "wait_ms", default = "default_wait")]
    pub wait: Duration,
}

const fn default_attempts() -> u32 {
    DEFAULT_ATTEMPTS
}

const fn default_wait() -> Duration {
    DEFAULT_WAIT
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            wait: DEFAULT_WAIT,
        }
    }
}

impl RetryOptions {
    #[must_use]
    pub const fn new(attempts: u32, wait: Duration) -> Self {
        Self { attempts, wait }
    }

    #[must_use]
    pub const fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// Upper bound on how long a command that never passes keeps polling,
    /// excluding the latency of the checks themselves.
    #[must_use]
    pub fn ceiling(&self) -> Duration {
        self.wait.saturating_mul(self.attempts)
    }

    /// Whether `checks_done` failing checks use up the budget.
    #[must_use]
    pub const fn is_spent(&self, checks_done: u32) -> bool {
        checks_done >= self.attempts
    }
}

enum Attempt<S> {
    /// Holds the number of checks already performed.
    Pending(u32),
    Passed(S),
    Exhausted,
}

/// Drives one command through a bounded, fixed-delay polling loop.
pub struct RetryScheduler;

impl RetryScheduler {
    /// Polls `command` until it passes or the attempt budget runs out, then
    /// resets it and returns the terminal result.
    ///
    /// The wait happens before every check, including the first one. A check
    /// that returns an error counts as a failing attempt; the last state that
    /// was observed successfully is what `process_failing_result` receives.
    pub async fn run<C>(command: &mut C, options: &RetryOptions) -> TestResult
    where
        C: ValidationCommand,
    {
        let mut last_observed: Option<C::State> = None;
        let mut attempt = Attempt::Pending(0);

        let result = loop {
            attempt = match attempt {
                Attempt::Pending(done) if options.is_spent(done) => Attempt::Exhausted,
                Attempt::Pending(done) => {
                    sleep(options.wait).await;
                    Self::check(&*command, done.saturating_add(1), &mut last_observed).await
                }
                Attempt::Passed(state) => {
                    info!(command = command.name(), "validation passed");
                    break command.process_passing_result(&state);
                }
                Attempt::Exhausted => {
                    warn!(
                        command = command.name(),
                        attempts = options.attempts,
                        wait_ms = options.wait.as_millis(),
                        observed = last_observed.is_some(),
                        "validation attempts exhausted"
                    );
                    break command.process_failing_result(last_observed.as_ref());
                }
            };
        };

        command.reset();
        result
    }

    async fn check<C>(
        command: &C,
        number: u32,
        last_observed: &mut Option<C::State>,
    ) -> Attempt<C::State>
    where
        C: ValidationCommand,
    {
        match command.check_result().await {
            Ok(state) if command.is_passing_result(&state) => Attempt::Passed(state),
            Ok(state) => {
                debug!(command = command.name(), attempt = number, "check not passing yet");
                *last_observed = Some(state);
                Attempt::Pending(number)
            }
            Err(error) => {
                warn!(
                    command = command.name(),
                    attempt = number,
                    %error,
                    "check failed, counting as a failing attempt"
                );
                Attempt::Pending(number)
            }
        }
    }
}
