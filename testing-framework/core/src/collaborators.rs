use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validation::DynError;

/// Identifier assigned to a seeded fixture record by the data store.
pub type FixtureId = String;

/// A seeded ticker as read back from the data store.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct FixtureRecord {
    pub id: FixtureId,
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub chromosome: Option<String>,
}

impl FixtureRecord {
    /// Whether the external processor left its (non-empty) marker on this
    /// record.
    #[must_use]
    pub fn has_marker(&self) -> bool {
        self.chromosome
            .as_deref()
            .is_some_and(|chromosome| !chromosome.is_empty())
    }
}

#[derive(Debug, Error)]
pub enum FixtureLoadError {
    #[error(
        "failed to load test data: expected {expected} tickers to be inserted but {actual} were actually inserted"
    )]
    CountMismatch { expected: usize, actual: usize },
}

#[async_trait]
/// Store that owns the fixture records the external processor decorates.
pub trait DataSource: Send + Sync {
    /// Replaces any existing fixtures with a fresh set and returns their ids.
    async fn load_fixtures(&self) -> Result<Vec<FixtureId>, DynError>;

    /// Returns the records matching `ids` (all records when `None`). The
    /// result may hold fewer records than ids asked for.
    async fn find_matching(&self, ids: Option<&[FixtureId]>)
    -> Result<Vec<FixtureRecord>, DynError>;
}

#[async_trait]
/// Kicks off the batch job under test.
pub trait ExternalProcessTrigger: Send + Sync {
    async fn run(&self) -> Result<(), DynError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(chromosome: Option<&str>) -> FixtureRecord {
        FixtureRecord {
            id: "1".to_owned(),
            symbol: "ACME".to_owned(),
            name: "Acme Corp".to_owned(),
            chromosome: chromosome.map(str::to_owned),
        }
    }

    #[test]
    fn marker_must_be_present_and_non_empty() {
        assert!(record(Some("12345")).has_marker());
        assert!(!record(Some("")).has_marker());
        assert!(!record(None).has_marker());
    }

    #[test]
    fn count_mismatch_names_both_counts() {
        let err = FixtureLoadError::CountMismatch {
            expected: 10,
            actual: 9,
        };

        assert_eq!(
            err.to_string(),
            "failed to load test data: expected 10 tickers to be inserted but 9 were actually inserted"
        );
    }
}
