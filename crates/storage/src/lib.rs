#![forbid(unsafe_code)]

pub mod repository;
pub mod snapshot;
pub mod source;
pub mod sqlite;

pub use repository::{InMemoryStore, KeyValueStore, StorageError};
pub use snapshot::{SnapshotError, SnapshotStore};
pub use source::{JsonFileSource, QuestionSource, StaticSource};
