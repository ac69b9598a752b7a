use serde::{Deserialize, Serialize};

/// A single true/false statement belonging to an area.
///
/// The statement `text` is the identity of a question: two questions with the
/// same text are treated as the same question by progress tracking, even if
/// they were filed under different areas.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Question {
    area: String,
    text: String,
    #[serde(rename = "true")]
    is_true: bool,
}

impl Question {
    #[must_use]
    pub fn new(area: impl Into<String>, text: impl Into<String>, is_true: bool) -> Self {
        Self {
            area: area.into(),
            text: text.into(),
            is_true,
        }
    }

    #[must_use]
    pub fn area(&self) -> &str {
        &self.area
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Ground truth for the statement.
    #[must_use]
    pub fn is_true(&self) -> bool {
        self.is_true
    }

    /// Returns true when `answer` matches the ground truth.
    #[must_use]
    pub fn is_correct(&self, answer: bool) -> bool {
        self.is_true == answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_bank_record_shape() {
        let raw = r#"{"area":"Rust","text":"Vec is growable","true":true}"#;
        let question: Question = serde_json::from_str(raw).unwrap();

        assert_eq!(question.area(), "Rust");
        assert_eq!(question.text(), "Vec is growable");
        assert!(question.is_true());
    }

    #[test]
    fn serializes_truth_under_true_key() {
        let question = Question::new("Rust", "Strings are Copy", false);
        let value = serde_json::to_value(&question).unwrap();

        assert_eq!(value["true"], serde_json::Value::Bool(false));
        assert!(value.get("is_true").is_none());
    }

    #[test]
    fn answer_correctness_follows_ground_truth() {
        let question = Question::new("Rust", "Strings are Copy", false);
        assert!(question.is_correct(false));
        assert!(!question.is_correct(true));
    }
}
