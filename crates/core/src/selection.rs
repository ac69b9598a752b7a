use std::collections::BTreeSet;

use rand::Rng;
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{BankError, Question, QuestionBank};
use crate::progress::ProgressTracker;
use crate::settings::QuizSettings;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SelectionError {
    #[error("no questions loaded")]
    EmptyBank,

    #[error("no questions available for the selected areas")]
    NoQuestionsAvailable,

    #[error(transparent)]
    Bank(#[from] BankError),
}

//
// ─── SELECTION ─────────────────────────────────────────────────────────────────
//

/// Pool a question was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPool {
    /// Questions in the allowed areas that were never answered.
    Unviewed,
    /// Every question in the allowed areas.
    All,
    /// Flagged questions in the allowed areas.
    Review,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub question: Question,
    pub pool: SelectionPool,
    /// Boost factor after normalization.
    pub boost: f64,
}

//
// ─── CACHE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone)]
struct AreaCache {
    areas: Vec<String>,
    bank_len: usize,
    positions: Vec<usize>,
    unviewed: Vec<usize>,
    unviewed_generation: Option<u64>,
}

impl AreaCache {
    fn build(bank: &QuestionBank, areas: Vec<String>) -> Self {
        let positions = bank.positions_for_areas(&areas);
        debug!(areas = ?areas, positions = positions.len(), "rebuilt area position cache");
        Self {
            areas,
            bank_len: bank.len(),
            positions,
            unviewed: Vec::new(),
            unviewed_generation: None,
        }
    }

    fn matches(&self, areas: &[String], bank_len: usize) -> bool {
        self.bank_len == bank_len && self.areas == areas
    }

    fn unviewed(&mut self, bank: &QuestionBank, progress: &ProgressTracker) -> &[usize] {
        let generation = progress.generation();
        if self.unviewed_generation != Some(generation) {
            self.unviewed = self
                .positions
                .iter()
                .copied()
                .filter(|position| {
                    bank.questions()
                        .get(*position)
                        .is_some_and(|q| !progress.is_viewed(q.text()))
                })
                .collect();
            self.unviewed_generation = Some(generation);
        }
        &self.unviewed
    }
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Picks the next question to present.
///
/// Two levels of blending decide where a question comes from:
///
/// 1. With probability `1 - 1/boost` a flagged question from the allowed
///    areas is chosen (when one exists). Otherwise the general pool is used.
/// 2. The general pool prefers unviewed questions with probability
///    `unviewed_preference`, and falls back to every question in the allowed
///    areas when that roll fails or nothing is left unviewed.
///
/// The engine caches the positions of the last requested area set. The
/// unviewed subset is recomputed when the tracker generation changes.
#[derive(Debug, Clone)]
pub struct SelectionEngine {
    settings: QuizSettings,
    cache: Option<AreaCache>,
}

impl SelectionEngine {
    #[must_use]
    pub fn new(settings: QuizSettings) -> Self {
        Self {
            settings,
            cache: None,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    /// Drop cached positions, e.g. after the bank or tracker was replaced.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// Apply defaults and the lower bound to a caller-supplied boost factor.
    #[must_use]
    pub fn normalize_boost(&self, boost: Option<f64>) -> f64 {
        let default = self.settings.default_boost();
        let min = self.settings.min_boost();
        match boost {
            None => default,
            Some(value) if !value.is_finite() => {
                warn!(boost = value, default, "boost factor is not finite; using default");
                default
            }
            Some(value) if value < min => {
                warn!(boost = value, min, "boost factor below minimum; clamping");
                min
            }
            Some(value) => value,
        }
    }

    /// Choose the next question from `allowed_areas`.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::EmptyBank` if no questions are loaded.
    /// Returns `SelectionError::NoQuestionsAvailable` if the allowed areas have no
    /// questions in the bank. Both are checked before any random draw.
    pub fn next_question<S, R>(
        &mut self,
        bank: &QuestionBank,
        progress: &ProgressTracker,
        allowed_areas: &[S],
        boost: Option<f64>,
        rng: &mut R,
    ) -> Result<Selection, SelectionError>
    where
        S: AsRef<str>,
        R: Rng + ?Sized,
    {
        if bank.is_empty() {
            return Err(SelectionError::EmptyBank);
        }

        let boost = self.normalize_boost(boost);
        let use_all_threshold = 1.0 / boost;

        let allowed: BTreeSet<&str> = allowed_areas.iter().map(AsRef::as_ref).collect();
        let areas: Vec<String> = allowed.iter().map(|area| (*area).to_owned()).collect();
        let review: Vec<&Question> = progress
            .incorrect_in(|area| allowed.contains(area))
            .collect();

        let stale = self
            .cache
            .as_ref()
            .is_none_or(|cache| !cache.matches(&areas, bank.len()));
        if stale {
            self.cache = None;
        }
        let cache = self
            .cache
            .get_or_insert_with(|| AreaCache::build(bank, areas));

        if cache.positions.is_empty() {
            return Err(SelectionError::NoQuestionsAvailable);
        }

        let roll: f64 = rng.random();
        let (question, pool) = if roll < use_all_threshold || review.is_empty() {
            let prefer_unviewed = rng.random::<f64>() < self.settings.unviewed_preference();
            let unviewed: &[usize] = if prefer_unviewed {
                cache.unviewed(bank, progress)
            } else {
                &[]
            };
            if unviewed.is_empty() {
                let position = cache.positions[rng.random_range(0..cache.positions.len())];
                (bank.question_at(position)?.clone(), SelectionPool::All)
            } else {
                let position = unviewed[rng.random_range(0..unviewed.len())];
                (bank.question_at(position)?.clone(), SelectionPool::Unviewed)
            }
        } else {
            let question = review[rng.random_range(0..review.len())];
            (question.clone(), SelectionPool::Review)
        };

        debug!(pool = ?pool, area = question.area(), boost, "selected question");
        Ok(Selection {
            question,
            pool,
            boost,
        })
    }
}

impl Default for SelectionEngine {
    fn default() -> Self {
        Self::new(QuizSettings::default())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
