use std::{env, path::PathBuf};

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

#[must_use]
pub fn server_port() -> Option<u16> {
    parsed("PORT")
}

#[must_use]
pub fn doctor_db_host() -> Option<String> {
    env::var("DOCTOR_DB_HOST").ok()
}

#[must_use]
pub fn doctor_db_port() -> Option<u16> {
    parsed("DOCTOR_DB_PORT")
}

#[must_use]
pub fn doctor_db_name() -> Option<String> {
    env::var("DOCTOR_DB_NAME").ok()
}

#[must_use]
pub fn doctor_db_user() -> Option<String> {
    env::var("DOCTOR_DB_USER").ok()
}

#[must_use]
pub fn doctor_db_password() -> Option<String> {
    env::var("DOCTOR_DB_PASSWORD").ok()
}

#[must_use]
pub fn hopper_url() -> Option<String> {
    env::var("HOPPER_URL").ok().filter(|v| !v.is_empty())
}

/// Per-request hopper timeout in milliseconds.
#[must_use]
pub fn doctor_hopper_timeout_ms() -> Option<u64> {
    parsed("DOCTOR_HOPPER_TIMEOUT_MS")
}

#[must_use]
pub fn doctor_events_url() -> Option<String> {
    env::var("DOCTOR_EVENTS_URL").ok().filter(|v| !v.is_empty())
}

#[must_use]
pub fn doctor_retry_attempts() -> Option<u32> {
    parsed("DOCTOR_RETRY_ATTEMPTS")
}

#[must_use]
pub fn doctor_retry_wait_ms() -> Option<u64> {
    parsed("DOCTOR_RETRY_WAIT_MS")
}

#[must_use]
pub fn doctor_fixtures_path() -> Option<PathBuf> {
    env::var("DOCTOR_FIXTURES_PATH").ok().map(PathBuf::from)
}

/// Base URL of a running doctor server, used by the acceptance test.
#[must_use]
pub fn doctor_url() -> Option<String> {
    env::var("DOCTOR_URL").ok().filter(|v| !v.is_empty())
}

#[must_use]
pub fn rust_log() -> Option<String> {
    env::var("RUST_LOG").ok()
}
