pub mod config;
pub mod feed;
pub mod server;
pub mod store;

pub use config::{ConfigError, DoctorConfig};
pub use server::doctor_app;
pub use store::PostgresTickerSource;
