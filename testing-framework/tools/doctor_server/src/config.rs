use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use doctor_core::{
    RetryOptions,
    events::{BATCH_PROCESSING_CHANNEL, DEFAULT_BUCKET_CAPACITY},
    hopper::{DEFAULT_HOPPER_TIMEOUT, DEFAULT_HOPPER_URL},
};
use serde::Deserialize;
use serde_with::{DurationMilliSeconds, serde_as};
use thiserror::Error;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_DB_NAME: &str = "systemintegration";
const DEFAULT_DB_USER: &str = "postgres";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_EVENTS_URL: &str = "nats://localhost:4222";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Everything the doctor server needs to wire up its collaborators.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct DoctorConfig {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub hopper: HopperSettings,
    pub events: EventSettings,
    pub retry: RetryOptions,
    pub fixtures: FixtureSettings,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_DB_HOST.to_owned(),
            port: DEFAULT_DB_PORT,
            name: DEFAULT_DB_NAME.to_owned(),
            user: DEFAULT_DB_USER.to_owned(),
            password: None,
            max_connections: DEFAULT_DB_MAX_CONNECTIONS,
        }
    }
}

impl DatabaseSettings {
    #[must_use]
    pub fn connection_url(&self) -> String {
        let credentials = match &self.password {
            Some(password) => format!("{}:{password}", self.user),
            None => self.user.clone(),
        };
        format!(
            "postgres://{credentials}@{}:{}/{}",
            self.host, self.port, self.name
        )
    }

    /// Connection target without credentials, safe to log.
    #[must_use]
    pub fn display_target(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.name)
    }
}

#[serde_as]
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct HopperSettings {
    pub url: String,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "timeout_ms")]
    pub timeout: Duration,
}

impl Default for HopperSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_HOPPER_URL.to_owned(),
            timeout: DEFAULT_HOPPER_TIMEOUT,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct EventSettings {
    pub url: String,
    pub channel: String,
    pub bucket_capacity: usize,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_EVENTS_URL.to_owned(),
            channel: BATCH_PROCESSING_CHANNEL.to_owned(),
            bucket_capacity: DEFAULT_BUCKET_CAPACITY,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct FixtureSettings {
    pub path: Option<PathBuf>,
}

impl DoctorConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }

    /// Environment variables win over file values.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(port) = doctor_env::server_port() {
            self.server.port = port;
        }
        if let Some(host) = doctor_env::doctor_db_host() {
            self.database.host = host;
        }
        if let Some(port) = doctor_env::doctor_db_port() {
            self.database.port = port;
        }
        if let Some(name) = doctor_env::doctor_db_name() {
            self.database.name = name;
        }
        if let Some(user) = doctor_env::doctor_db_user() {
            self.database.user = user;
        }
        if let Some(password) = doctor_env::doctor_db_password() {
            self.database.password = Some(password);
        }
        if let Some(url) = doctor_env::hopper_url() {
            self.hopper.url = url;
        }
        if let Some(timeout_ms) = doctor_env::doctor_hopper_timeout_ms() {
            self.hopper.timeout = Duration::from_millis(timeout_ms);
        }
        if let Some(url) = doctor_env::doctor_events_url() {
            self.events.url = url;
        }
        if let Some(attempts) = doctor_env::doctor_retry_attempts() {
            self.retry.attempts = attempts;
        }
        if let Some(wait_ms) = doctor_env::doctor_retry_wait_ms() {
            self.retry.wait = Duration::from_millis(wait_ms);
        }
        if let Some(path) = doctor_env::doctor_fixtures_path() {
            self.fixtures.path = Some(path);
        }
        self
    }
}
