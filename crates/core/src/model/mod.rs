mod bank;
mod question;

pub use bank::{AreaIndex, BankError, QuestionBank};
pub use question::Question;
