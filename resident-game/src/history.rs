//! Persisted run history: a capped, newest-first list stored as one JSON blob.
use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{HISTORY_CAP, SEED_HISTORY_KEY};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub seed: i64,
    pub seed_name: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_count: Option<u32>,
}

impl RunRecord {
    #[must_use]
    pub fn started(seed: i64, seed_name: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            seed,
            seed_name: seed_name.into(),
            timestamp,
            completed: false,
            score: None,
            day_count: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct RunHistory(Vec<RunRecord>);

impl RunHistory {
    #[must_use]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Add `record` as the newest entry, dropping the oldest past the cap.
    pub fn record(&mut self, record: RunRecord) {
        self.0.insert(0, record);
        self.0.truncate(HISTORY_CAP);
    }

    /// Mark the run with `seed` that started at `started_at` completed.
    /// Returns `false` if no run matches.
    pub fn mark_completed(
        &mut self,
        seed: i64,
        started_at: DateTime<Utc>,
        score: Option<i64>,
        day_count: Option<u32>,
    ) -> bool {
        let Some(entry) = self
            .0
            .iter_mut()
            .find(|r| r.seed == seed && r.timestamp == started_at)
        else {
            return false;
        };
        entry.completed = true;
        entry.score = score;
        entry.day_count = day_count;
        true
    }

    #[must_use]
    pub fn latest(&self) -> Option<&RunRecord> {
        self.0.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RunRecord> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// # Errors
    ///
    /// Returns an error if the JSON is not a list of run records.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut history: Self = serde_json::from_str(json)?;
        history.0.truncate(HISTORY_CAP);
        Ok(history)
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Platform blob storage (browser local storage, a file, memory).
pub trait RunStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn load_blob(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn save_blob(&self, key: &str, value: &str) -> Result<(), Self::Error>;
}

/// In-memory storage; clones share the same backing map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    blobs: Rc<RefCell<HashMap<String, String>>>,
}

impl RunStorage for MemoryStorage {
    type Error = Infallible;

    fn load_blob(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.blobs.borrow().get(key).cloned())
    }

    fn save_blob(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.blobs
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum HistoryError<E>
where
    E: std::error::Error + 'static,
{
    #[error("storage error: {0}")]
    Storage(#[source] E),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Read the history blob. A missing blob is an empty history; a corrupt one
/// is discarded with a warning.
///
/// # Errors
///
/// Returns an error only when the storage itself fails.
pub fn load_history<S: RunStorage>(storage: &S) -> Result<RunHistory, HistoryError<S::Error>> {
    let Some(blob) = storage
        .load_blob(SEED_HISTORY_KEY)
        .map_err(HistoryError::Storage)?
    else {
        return Ok(RunHistory::empty());
    };
    match RunHistory::from_json(&blob) {
        Ok(history) => Ok(history),
        Err(err) => {
            log::warn!("discarding unreadable run history: {err}");
            Ok(RunHistory::empty())
        }
    }
}

/// # Errors
///
/// Returns an error if serialization or the storage write fails.
pub fn save_history<S: RunStorage>(
    storage: &S,
    history: &RunHistory,
) -> Result<(), HistoryError<S::Error>> {
    let blob = history.to_json()?;
    storage
        .save_blob(SEED_HISTORY_KEY, &blob)
        .map_err(HistoryError::Storage)
}
