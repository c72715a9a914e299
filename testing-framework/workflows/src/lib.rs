pub mod builder;
pub mod commands;

pub use builder::{DoctorSuiteBuilder, OrchestratorBuilderExt, standard_suite};
pub use commands::{EventCountCheck, ExpectedCount, TickerDecorationCheck};
