use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ticker set seeded when no fixture file is configured.
pub const DEFAULT_TICKERS: &str = include_str!("../fixtures/tickers.json");

/// A ticker to insert before the batch job runs.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TickerSeed {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Error)]
pub enum FixtureFileError {
    #[error("failed to read fixture file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse fixtures: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("fixture set is empty")]
    Empty,
}

/// Parses a JSON array of tickers.
pub fn parse_fixtures(raw: &str) -> Result<Vec<TickerSeed>, FixtureFileError> {
    let seeds: Vec<TickerSeed> = serde_json::from_str(raw)?;
    if seeds.is_empty() {
        return Err(FixtureFileError::Empty);
    }
    Ok(seeds)
}

pub fn load_fixture_file(path: &Path) -> Result<Vec<TickerSeed>, FixtureFileError> {
    let raw = fs::read_to_string(path).map_err(|source| FixtureFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_fixtures(&raw)
}

/// Loads `path` when given, otherwise the built-in ticker set.
pub fn load_fixtures_or_default(path: Option<&Path>) -> Result<Vec<TickerSeed>, FixtureFileError> {
    match path {
        Some(path) => load_fixture_file(path),
        None => parse_fixtures(DEFAULT_TICKERS),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    #[test]
    fn default_set_has_ten_tickers() {
        let seeds = load_fixtures_or_default(None).unwrap();

        assert_eq!(seeds.len(), 10);
        assert!(seeds.iter().all(|seed| !seed.symbol.is_empty()));
    }

    #[test]
    fn reads_fixture_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{ "symbol": "ACME" }}, {{ "symbol": "INIT", "name": "Initech" }}]"#)
            .unwrap();

        let seeds = load_fixture_file(file.path()).unwrap();

        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].name, "");
        assert_eq!(seeds[1].name, "Initech");
    }

    #[test]
    fn rejects_empty_and_missing_files() {
        assert!(matches!(parse_fixtures("[]"), Err(FixtureFileError::Empty)));
        assert!(matches!(
            load_fixture_file(Path::new("/definitely/not/here.json")),
            Err(FixtureFileError::Read { .. })
        ));
    }
}
