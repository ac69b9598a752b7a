#![forbid(unsafe_code)]

pub mod model;
pub mod progress;
pub mod random;
pub mod selection;
pub mod settings;

pub use model::{AreaIndex, BankError, Question, QuestionBank};
pub use progress::{AnswerRecord, ProgressSnapshot, ProgressTracker};
pub use selection::{Selection, SelectionEngine, SelectionError, SelectionPool};
pub use settings::{QuizSettings, QuizSettingsDraft, SettingsError};
