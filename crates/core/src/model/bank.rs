use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::model::Question;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BankError {
    #[error("question bank is empty")]
    Empty,

    #[error("question position {position} is out of range (bank has {len} questions)")]
    IndexOutOfRange { position: usize, len: usize },
}

//
// ─── AREA INDEX ────────────────────────────────────────────────────────────────
//

/// Bank positions grouped by area.
///
/// Areas keep the order in which they first appear in the bank. Every position
/// of the bank appears under exactly one area.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AreaIndex {
    areas: Vec<String>,
    positions: Vec<Vec<usize>>,
    lookup: HashMap<String, usize>,
}

impl AreaIndex {
    /// Build the index with a single scan over `questions`.
    #[must_use]
    pub fn build(questions: &[Question]) -> Self {
        let mut index = Self::default();
        for (position, question) in questions.iter().enumerate() {
            index.insert(question.area(), position);
        }
        index
    }

    fn insert(&mut self, area: &str, position: usize) {
        let slot = match self.lookup.get(area) {
            Some(slot) => *slot,
            None => {
                let slot = self.areas.len();
                self.areas.push(area.to_owned());
                self.positions.push(Vec::new());
                self.lookup.insert(area.to_owned(), slot);
                slot
            }
        };
        self.positions[slot].push(position);
    }

    /// Distinct areas in first-occurrence order.
    #[must_use]
    pub fn areas(&self) -> &[String] {
        &self.areas
    }

    /// Positions for one area; empty for areas the index does not know.
    #[must_use]
    pub fn positions(&self, area: &str) -> &[usize] {
        self.lookup
            .get(area)
            .map_or(&[], |slot| self.positions[*slot].as_slice())
    }

    #[must_use]
    pub fn contains(&self, area: &str) -> bool {
        self.lookup.contains_key(area)
    }
}

//
// ─── QUESTION BANK ─────────────────────────────────────────────────────────────
//

/// Immutable question bank plus its area index.
///
/// The bank is loaded once per session. The only mutation is [`QuestionBank::extend`],
/// which appends extra questions and keeps the index in sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<Question>,
    index: AreaIndex,
}

impl QuestionBank {
    /// Store `questions` verbatim and index them by area.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Empty` if `questions` is empty.
    pub fn load(questions: Vec<Question>) -> Result<Self, BankError> {
        if questions.is_empty() {
            return Err(BankError::Empty);
        }
        let index = AreaIndex::build(&questions);
        Ok(Self { questions, index })
    }

    /// Load `questions` into an empty bank, or rebuild the index of a bank that
    /// already has content.
    ///
    /// A non-empty bank keeps its questions; `questions` is ignored in that case.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Empty` if the bank is empty and `questions` is empty too.
    pub fn reload(&mut self, questions: Vec<Question>) -> Result<(), BankError> {
        if self.questions.is_empty() {
            *self = Self::load(questions)?;
        } else {
            self.index = AreaIndex::build(&self.questions);
        }
        Ok(())
    }

    /// Append extra questions, skipping texts for which `is_viewed` returns true
    /// and texts the bank already contains.
    ///
    /// Returns the number of questions appended.
    pub fn extend<F>(&mut self, questions: impl IntoIterator<Item = Question>, is_viewed: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let mut known: HashSet<String> = self.questions.iter().map(|q| q.text().to_owned()).collect();
        let mut added = 0;
        for question in questions {
            if is_viewed(question.text()) || known.contains(question.text()) {
                continue;
            }
            known.insert(question.text().to_owned());
            self.index.insert(question.area(), self.questions.len());
            self.questions.push(question);
            added += 1;
        }
        added
    }

    #[must_use]
    pub fn index(&self) -> &AreaIndex {
        &self.index
    }

    /// Distinct areas in first-occurrence order.
    #[must_use]
    pub fn areas(&self) -> &[String] {
        self.index.areas()
    }

    /// Concatenate the positions of each requested area.
    ///
    /// Unknown areas contribute nothing, and an area listed twice is only
    /// counted once.
    #[must_use]
    pub fn positions_for_areas<S: AsRef<str>>(&self, areas: &[S]) -> Vec<usize> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for area in areas {
            let area = area.as_ref();
            if seen.insert(area) {
                out.extend_from_slice(self.index.positions(area));
            }
        }
        out
    }

    /// Question stored at `position`.
    ///
    /// # Errors
    ///
    /// Returns `BankError::IndexOutOfRange` if `position` is past the end of the bank.
    pub fn question_at(&self, position: usize) -> Result<&Question, BankError> {
        self.questions
            .get(position)
            .ok_or(BankError::IndexOutOfRange {
                position,
                len: self.questions.len(),
            })
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn count_for_area(&self, area: &str) -> usize {
        self.index.positions(area).len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
