pub mod collaborators;
pub mod events;
pub mod fixtures;
pub mod hopper;
pub mod orchestrator;
pub mod report;
pub mod retry;
pub mod validation;

pub use collaborators::{
    DataSource, ExternalProcessTrigger, FixtureId, FixtureLoadError, FixtureRecord,
};
pub use events::{BufferedEvent, ChannelMessage, EventBuffer};
pub use hopper::{HopperClient, HopperError};
pub use orchestrator::{OrchestratorError, RetryableValidation, TestOrchestrator};
pub use report::{TestReport, TestStatus};
pub use retry::{RetryOptions, RetryScheduler};
pub use validation::{DynError, SetupContext, TestResult, ValidationCommand};
