use std::sync::Arc;

use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use quiz_core::random::{entropy_rng, seeded_rng};
use quiz_core::{
    AnswerRecord, ProgressTracker, Question, QuestionBank, QuizSettings, Selection, SelectionEngine,
};
use storage::{KeyValueStore, QuestionSource, SnapshotStore};

use crate::error::QuizServiceError;
use crate::summary::ProgressSummary;

//
// ─── ANSWER OUTCOME ────────────────────────────────────────────────────────────
//

/// Result of recording an answer through the service.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
    pub record: AnswerRecord,
    /// False when the snapshot write failed; the in-memory update still applies.
    pub persisted: bool,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Quiz session facade: owns the bank, the learner progress, the selection
/// engine, the random source and the snapshot store.
///
/// Every mutation of progress is followed by a snapshot write. Write failures
/// are logged and reported through the return value, never as errors.
pub struct QuizService {
    bank: QuestionBank,
    progress: ProgressTracker,
    engine: SelectionEngine,
    snapshots: SnapshotStore,
    rng: StdRng,
}

impl QuizService {
    /// Create a service with an empty bank and progress restored from `store`.
    #[must_use]
    pub fn new(settings: QuizSettings, store: Arc<dyn KeyValueStore>) -> Self {
        let snapshots = SnapshotStore::new(store);
        let progress = ProgressTracker::from_snapshot(settings, snapshots.load_progress());
        debug!(
            viewed = progress.viewed_count(),
            incorrect = progress.incorrect_count(),
            "restored progress"
        );
        Self {
            bank: QuestionBank::default(),
            progress,
            engine: SelectionEngine::new(settings),
            snapshots,
            rng: entropy_rng(),
        }
    }

    /// Restore progress and load the bank (cached copy first, then `source`).
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError` if no bank can be loaded.
    pub fn bootstrap(
        settings: QuizSettings,
        store: Arc<dyn KeyValueStore>,
        source: &dyn QuestionSource,
    ) -> Result<Self, QuizServiceError> {
        let mut service = Self::new(settings, store);
        service.load_questions(source)?;
        Ok(service)
    }

    /// Replace the random source (usually for deterministic testing).
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(seeded_rng(seed))
    }

    /// Load the bank.
    ///
    /// - A non-empty bank keeps its content; only the area index is rebuilt.
    /// - Otherwise the cached `questions` entry is used when present and non-empty.
    /// - Otherwise `source` is fetched and the result is cached.
    ///
    /// Returns the number of questions in the bank.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Source` if the source cannot be fetched and
    /// `QuizServiceError::Bank` if it yields no questions.
    pub fn load_questions(&mut self, source: &dyn QuestionSource) -> Result<usize, QuizServiceError> {
        if !self.bank.is_empty() {
            self.bank.reload(Vec::new())?;
            self.bank_loaded();
            return Ok(self.bank.len());
        }

        match self.snapshots.load_questions() {
            Ok(Some(cached)) if !cached.is_empty() => {
                self.bank.reload(cached)?;
                self.bank_loaded();
                info!(questions = self.bank.len(), "loaded questions from cache");
                return Ok(self.bank.len());
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "ignoring cached questions"),
        }

        let questions = source.fetch()?;
        self.bank.reload(questions)?;
        self.bank_loaded();
        if let Err(err) = self.snapshots.save_questions(self.bank.questions()) {
            warn!(error = %err, "failed to cache questions");
        }
        info!(
            questions = self.bank.len(),
            areas = self.bank.areas().len(),
            "loaded questions from source"
        );
        Ok(self.bank.len())
    }

    fn bank_loaded(&mut self) {
        self.engine.invalidate();
        let placed = self.progress.place_restored(&self.bank);
        if placed > 0 {
            debug!(placed, "filed restored viewed texts under their areas");
            self.persist();
        }
    }

    /// Append questions whose text is neither viewed nor already in the bank.
    ///
    /// Returns the number of questions appended.
    pub fn add_extra_questions(&mut self, questions: Vec<Question>) -> usize {
        let progress = &self.progress;
        let added = self
            .bank
            .extend(questions, |text| progress.is_viewed(text));
        debug!(added, total = self.bank.len(), "added extra questions");
        added
    }

    /// Remove the cached bank so the next start reloads it from the source.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Snapshot` if the cache entry cannot be removed.
    pub fn clear_cached_questions(&self) -> Result<(), QuizServiceError> {
        self.snapshots.clear_questions()?;
        Ok(())
    }

    /// Pick the next question from `areas`.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Selection` if no bank is loaded or the areas
    /// have no questions.
    pub fn next_question<S: AsRef<str>>(
        &mut self,
        areas: &[S],
        boost: Option<f64>,
    ) -> Result<Selection, QuizServiceError> {
        let selection =
            self.engine
                .next_question(&self.bank, &self.progress, areas, boost, &mut self.rng)?;
        Ok(selection)
    }

    /// Record whether `question` was answered correctly and persist progress.
    pub fn record_answer(&mut self, question: &Question, correct: bool) -> AnswerOutcome {
        let record = self.progress.record_answer(question, correct, &mut self.rng);
        let persisted = self.persist();
        AnswerOutcome { record, persisted }
    }

    /// Grade the learner's true/false `answer` and record it.
    pub fn answer(&mut self, question: &Question, answer: bool) -> AnswerOutcome {
        self.record_answer(question, question.is_correct(answer))
    }

    /// Clear all progress and persist the empty state.
    ///
    /// Returns whether the empty state was persisted.
    pub fn reset(&mut self) -> bool {
        self.progress.reset();
        info!("progress reset");
        self.persist()
    }

    fn persist(&self) -> bool {
        match self.snapshots.save_progress(&self.progress.snapshot()) {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "failed to persist progress");
                false
            }
        }
    }

    #[must_use]
    pub fn summary(&self) -> ProgressSummary {
        ProgressSummary::from_state(&self.bank, &self.progress)
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    #[must_use]
    pub fn areas(&self) -> &[String] {
        self.bank.areas()
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.bank.len()
    }

    #[must_use]
    pub fn viewed_ratio(&self) -> f64 {
        self.progress.viewed_ratio(self.bank.len())
    }

    #[must_use]
    pub fn incorrect_ratio(&self) -> f64 {
        self.progress.incorrect_ratio(self.bank.len())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
