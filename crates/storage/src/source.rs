use std::fs;
use std::path::{Path, PathBuf};

use quiz_core::Question;

use crate::repository::StorageError;

/// Origin of the raw question bank.
pub trait QuestionSource {
    /// Fetch the full bank.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the bank cannot be read or parsed.
    fn fetch(&self) -> Result<Vec<Question>, StorageError>;
}

/// Parse a bank from JSON: an array of `{ "area", "text", "true" }` records.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if `raw` is not a valid bank.
pub fn parse_bank(raw: &str) -> Result<Vec<Question>, StorageError> {
    serde_json::from_str(raw).map_err(|err| StorageError::Serialization(err.to_string()))
}

/// Bank stored as a JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl QuestionSource for JsonFileSource {
    fn fetch(&self) -> Result<Vec<Question>, StorageError> {
        let raw = fs::read_to_string(&self.path)
            .map_err(|err| StorageError::Io(format!("{}: {err}", self.path.display())))?;
        parse_bank(&raw)
    }
}

/// Bank already held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    questions: Vec<Question>,
}

impl StaticSource {
    #[must_use]
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }
}

impl QuestionSource for StaticSource {
    fn fetch(&self) -> Result<Vec<Question>, StorageError> {
        Ok(self.questions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn json_file_source_reads_bank() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("questions.json");
        fs::write(
            &path,
            r#"[{"area":"Net","text":"TCP is connectionless","true":false},
                {"area":"Net","text":"UDP has no handshake","true":true}]"#,
        )
        .unwrap();

        let questions = JsonFileSource::new(&path).fetch().unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0], Question::new("Net", "TCP is connectionless", false));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = JsonFileSource::new(dir.path().join("nope.json"))
            .fetch()
            .unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
    }

    #[test]
    fn malformed_bank_is_serialization_error() {
        let err = parse_bank(r#"[{"area":"Net"}]"#).unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
