//! Persisted snapshot layout.
//!
//! Each part of the progress state lives under its own key as JSON text, so a
//! single corrupt entry only loses that part. Viewed texts survive a lost
//! `viewedByArea` entry: the tracker files them again once a bank is loaded.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

use quiz_core::Question;
use quiz_core::progress::ProgressSnapshot;

use crate::repository::{KeyValueStore, StorageError};

pub const AVERAGE_SCORES_KEY: &str = "averageScores";
pub const VIEWED_BY_AREA_KEY: &str = "viewedByArea";
pub const INCORRECT_QUESTIONS_KEY: &str = "incorrectQuestions";
pub const INCORRECT_TEXTS_KEY: &str = "incorrectQuestionsTextSet";
pub const VIEWED_TEXTS_KEY: &str = "viewedQuestionTextSet";
pub const QUESTIONS_KEY: &str = "questions";

/// Errors raised while reading or writing snapshot keys.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SnapshotError {
    #[error("failed to read `{key}`: {source}")]
    Read {
        key: &'static str,
        source: StorageError,
    },

    #[error("failed to write `{key}`: {source}")]
    Write {
        key: &'static str,
        source: StorageError,
    },

    #[error("`{key}` holds unreadable data: {message}")]
    Corrupt { key: &'static str, message: String },
}

/// Reads and writes progress snapshots and the cached bank.
#[derive(Clone)]
pub struct SnapshotStore {
    store: Arc<dyn KeyValueStore>,
}

impl SnapshotStore {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Write every progress key.
    ///
    /// # Errors
    ///
    /// Returns the first `SnapshotError::Write` encountered. Keys written before
    /// the failure keep their new values.
    pub fn save_progress(&self, snapshot: &ProgressSnapshot) -> Result<(), SnapshotError> {
        self.write(AVERAGE_SCORES_KEY, &snapshot.average_scores)?;
        self.write(VIEWED_BY_AREA_KEY, &snapshot.viewed_by_area)?;
        self.write(INCORRECT_QUESTIONS_KEY, &snapshot.incorrect_questions)?;
        self.write(INCORRECT_TEXTS_KEY, &snapshot.incorrect_texts)?;
        self.write(VIEWED_TEXTS_KEY, &snapshot.viewed_texts)?;
        Ok(())
    }

    /// Read the progress keys.
    ///
    /// Missing keys yield empty parts. Keys that cannot be read or parsed are
    /// logged and also yield empty parts, so startup never fails here.
    #[must_use]
    pub fn load_progress(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            average_scores: self.read_or_default::<BTreeMap<String, f64>>(AVERAGE_SCORES_KEY),
            viewed_by_area: self.read_or_default(VIEWED_BY_AREA_KEY),
            incorrect_questions: self.read_or_default(INCORRECT_QUESTIONS_KEY),
            incorrect_texts: self.read_or_default(INCORRECT_TEXTS_KEY),
            viewed_texts: self.read_or_default(VIEWED_TEXTS_KEY),
        }
    }

    /// Cache the loaded bank.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::Write` if the store rejects the value.
    pub fn save_questions(&self, questions: &[Question]) -> Result<(), SnapshotError> {
        self.write(QUESTIONS_KEY, &questions)
    }

    /// Read the cached bank, if any.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::Read` or `SnapshotError::Corrupt` if the cache
    /// exists but cannot be used.
    pub fn load_questions(&self) -> Result<Option<Vec<Question>>, SnapshotError> {
        self.read(QUESTIONS_KEY)
    }

    /// Drop the cached bank, leaving progress untouched.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::Write` if the key cannot be removed.
    pub fn clear_questions(&self) -> Result<(), SnapshotError> {
        self.store
            .remove(QUESTIONS_KEY)
            .map_err(|source| SnapshotError::Write {
                key: QUESTIONS_KEY,
                source,
            })
    }

    fn write<T: Serialize + ?Sized>(&self, key: &'static str, value: &T) -> Result<(), SnapshotError> {
        let raw = serde_json::to_string(value).map_err(|err| SnapshotError::Write {
            key,
            source: StorageError::Serialization(err.to_string()),
        })?;
        self.store
            .set(key, &raw)
            .map_err(|source| SnapshotError::Write { key, source })
    }

    fn read<T: DeserializeOwned>(&self, key: &'static str) -> Result<Option<T>, SnapshotError> {
        let Some(raw) = self
            .store
            .get(key)
            .map_err(|source| SnapshotError::Read { key, source })?
        else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| SnapshotError::Corrupt {
                key,
                message: err.to_string(),
            })
    }

    fn read_or_default<T: DeserializeOwned + Default>(&self, key: &'static str) -> T {
        match self.read(key) {
            Ok(value) => value.unwrap_or_default(),
            Err(err) => {
                warn!(error = %err, "ignoring persisted progress entry");
                T::default()
            }
        }
    }
}
