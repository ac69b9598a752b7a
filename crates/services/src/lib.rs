#![forbid(unsafe_code)]

pub mod error;
pub mod quiz_service;
pub mod summary;

pub use error::QuizServiceError;
pub use quiz_service::{AnswerOutcome, QuizService};
pub use summary::{AreaSummary, ProgressSummary};
