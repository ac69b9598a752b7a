//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::{BankError, SelectionError};
use storage::{SnapshotError, StorageError};

/// Errors emitted by `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error("failed to load questions: {0}")]
    Source(#[from] StorageError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}
