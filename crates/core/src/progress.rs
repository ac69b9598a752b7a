use std::collections::{BTreeMap, BTreeSet, HashMap};

use rand::Rng;
use tracing::warn;

use crate::model::{Question, QuestionBank};
use crate::settings::QuizSettings;

//
// ─── SNAPSHOT ──────────────────────────────────────────────────────────────────
//

/// Plain copy of the tracker state, shaped like the persisted keys.
///
/// Snapshots taken from a tracker always satisfy the tracker invariants.
/// Snapshots read back from storage may not; [`ProgressTracker::from_snapshot`]
/// repairs them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressSnapshot {
    pub average_scores: BTreeMap<String, f64>,
    pub viewed_by_area: BTreeMap<String, Vec<String>>,
    pub incorrect_questions: Vec<Question>,
    pub incorrect_texts: Vec<String>,
    pub viewed_texts: Vec<String>,
}

//
// ─── ANSWER RECORD ─────────────────────────────────────────────────────────────
//

/// What a single recorded answer changed.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerRecord {
    pub correct: bool,
    /// Area average after the update.
    pub average: f64,
    /// The question had not been answered before.
    pub newly_viewed: bool,
    /// The question was added to the review pool by this answer.
    pub flagged: bool,
    /// The question left the review pool by this answer.
    pub graduated: bool,
}

//
// ─── TRACKER ───────────────────────────────────────────────────────────────────
//

/// Learner progress: viewed questions, flagged questions and per-area averages.
///
/// Invariants kept by every method:
/// - `incorrect_texts` holds exactly the texts of `incorrect_questions`.
/// - `viewed_by_area` partitions `viewed_texts`; a text is filed under the
///   area it was first answered in.
/// - `generation` changes whenever the viewed set changes.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    settings: QuizSettings,
    viewed_texts: BTreeSet<String>,
    viewed_by_area: BTreeMap<String, BTreeSet<String>>,
    incorrect_texts: BTreeSet<String>,
    incorrect_questions: Vec<Question>,
    averages: BTreeMap<String, f64>,
    /// Restored viewed texts whose area is unknown until a bank is seen.
    unplaced: BTreeSet<String>,
    generation: u64,
}

impl ProgressTracker {
    #[must_use]
    pub fn new(settings: QuizSettings) -> Self {
        Self {
            settings,
            viewed_texts: BTreeSet::new(),
            viewed_by_area: BTreeMap::new(),
            incorrect_texts: BTreeSet::new(),
            incorrect_questions: Vec::new(),
            averages: BTreeMap::new(),
            unplaced: BTreeSet::new(),
            generation: 0,
        }
    }

    /// Rebuild a tracker from a persisted snapshot, repairing broken invariants.
    ///
    /// - averages that are not finite or fall outside `[0, 1]` are dropped
    /// - flagged texts are re-derived from the flagged questions
    /// - a text filed under several areas keeps the first one
    /// - texts filed under an area are marked viewed
    /// - viewed texts with no area are held back until
    ///   [`ProgressTracker::place_restored`] files them using a bank
    #[must_use]
    pub fn from_snapshot(settings: QuizSettings, snapshot: ProgressSnapshot) -> Self {
        let mut tracker = Self::new(settings);

        for (area, average) in snapshot.average_scores {
            if average.is_finite() && (0.0..=1.0).contains(&average) {
                tracker.averages.insert(area, average);
            } else {
                warn!(%area, average, "dropping out-of-range persisted average");
            }
        }

        for question in snapshot.incorrect_questions {
            if tracker.incorrect_texts.insert(question.text().to_owned()) {
                tracker.incorrect_questions.push(question);
            }
        }
        let persisted_texts: BTreeSet<String> = snapshot.incorrect_texts.into_iter().collect();
        if persisted_texts != tracker.incorrect_texts {
            warn!(
                persisted = persisted_texts.len(),
                derived = tracker.incorrect_texts.len(),
                "persisted incorrect text set disagrees with incorrect questions; rebuilt"
            );
        }

        let mut area_of: HashMap<String, String> = HashMap::new();
        for (area, texts) in snapshot.viewed_by_area {
            for text in texts {
                if let Some(existing) = area_of.get(&text) {
                    if existing != &area {
                        warn!(%text, kept = %existing, skipped = %area, "viewed text filed under two areas");
                    }
                    continue;
                }
                area_of.insert(text.clone(), area.clone());
                tracker
                    .viewed_by_area
                    .entry(area.clone())
                    .or_default()
                    .insert(text);
            }
        }

        let persisted_viewed: BTreeSet<String> = snapshot.viewed_texts.into_iter().collect();
        tracker.unplaced = persisted_viewed
            .iter()
            .filter(|text| !area_of.contains_key(*text))
            .cloned()
            .collect();
        if !tracker.unplaced.is_empty() {
            warn!(
                unplaced = tracker.unplaced.len(),
                "viewed texts have no area; filing them once the bank is loaded"
            );
        }
        let missing = area_of
            .keys()
            .filter(|text| !persisted_viewed.contains(*text))
            .count();
        if missing > 0 {
            warn!(missing, "marking per-area viewed texts as viewed");
        }
        tracker.viewed_texts = area_of.into_keys().collect();

        tracker
    }

    /// File restored viewed texts that had no area under their area in `bank`.
    ///
    /// Texts `bank` does not contain are dropped. Returns the number filed.
    pub fn place_restored(&mut self, bank: &QuestionBank) -> usize {
        if self.unplaced.is_empty() {
            return 0;
        }
        let mut placed = 0;
        for question in bank.questions() {
            if self.unplaced.remove(question.text()) && self.mark_viewed(question) {
                placed += 1;
            }
        }
        if !self.unplaced.is_empty() {
            warn!(
                dropped = self.unplaced.len(),
                "dropping viewed texts missing from the bank"
            );
            self.unplaced.clear();
        }
        placed
    }

    /// Copy the current state into a snapshot.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            average_scores: self.averages.clone(),
            viewed_by_area: self
                .viewed_by_area
                .iter()
                .map(|(area, texts)| (area.clone(), texts.iter().cloned().collect()))
                .collect(),
            incorrect_questions: self.incorrect_questions.clone(),
            incorrect_texts: self.incorrect_texts.iter().cloned().collect(),
            viewed_texts: self.viewed_texts.iter().cloned().collect(),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    /// Counter bumped whenever the viewed set changes or the tracker is reset.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Apply one answer to the tracker.
    ///
    /// - Updates the area average with exponential smoothing. The first answer
    ///   in an area sets the average to 1.0 or 0.0.
    /// - Marks the question viewed.
    /// - An incorrect answer flags the question for review.
    /// - A correct answer to a flagged question clears the flag with the
    ///   configured graduation probability. `rng` is only drawn from in that case.
    pub fn record_answer<R>(&mut self, question: &Question, correct: bool, rng: &mut R) -> AnswerRecord
    where
        R: Rng + ?Sized,
    {
        let score = if correct { 1.0 } else { 0.0 };
        let alpha = self.settings.smoothing();
        let average = match self.averages.get(question.area()) {
            Some(previous) => alpha * score + (1.0 - alpha) * previous,
            None => score,
        };
        self.averages.insert(question.area().to_owned(), average);

        let newly_viewed = self.mark_viewed(question);

        let mut flagged = false;
        let mut graduated = false;
        if correct {
            if self.incorrect_texts.contains(question.text())
                && rng.random::<f64>() < self.settings.graduation_probability()
            {
                self.unflag(question.text());
                graduated = true;
            }
        } else if self.incorrect_texts.insert(question.text().to_owned()) {
            self.incorrect_questions.push(question.clone());
            flagged = true;
        }

        AnswerRecord {
            correct,
            average,
            newly_viewed,
            flagged,
            graduated,
        }
    }

    fn mark_viewed(&mut self, question: &Question) -> bool {
        if !self.viewed_texts.insert(question.text().to_owned()) {
            return false;
        }
        self.viewed_by_area
            .entry(question.area().to_owned())
            .or_default()
            .insert(question.text().to_owned());
        self.generation = self.generation.wrapping_add(1);
        true
    }

    fn unflag(&mut self, text: &str) {
        self.incorrect_texts.remove(text);
        self.incorrect_questions.retain(|q| q.text() != text);
    }

    /// Clear all progress.
    pub fn reset(&mut self) {
        *self = Self {
            generation: self.generation.wrapping_add(1),
            ..Self::new(self.settings)
        };
    }

    #[must_use]
    pub fn average_for(&self, area: &str) -> Option<f64> {
        self.averages.get(area).copied()
    }

    #[must_use]
    pub fn averages(&self) -> &BTreeMap<String, f64> {
        &self.averages
    }

    #[must_use]
    pub fn viewed_by_area(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.viewed_by_area
    }

    #[must_use]
    pub fn viewed_count_for(&self, area: &str) -> usize {
        self.viewed_by_area.get(area).map_or(0, BTreeSet::len)
    }

    #[must_use]
    pub fn viewed_count(&self) -> usize {
        self.viewed_texts.len()
    }

    #[must_use]
    pub fn is_viewed(&self, text: &str) -> bool {
        self.viewed_texts.contains(text)
    }

    /// Share of the bank answered at least once; 0.0 for an empty bank.
    #[must_use]
    pub fn viewed_ratio(&self, bank_size: usize) -> f64 {
        ratio(self.viewed_count(), bank_size)
    }

    #[must_use]
    pub fn incorrect_count(&self) -> usize {
        self.incorrect_questions.len()
    }

    /// Share of the bank currently flagged; 0.0 for an empty bank.
    #[must_use]
    pub fn incorrect_ratio(&self, bank_size: usize) -> f64 {
        ratio(self.incorrect_count(), bank_size)
    }

    #[must_use]
    pub fn is_flagged(&self, text: &str) -> bool {
        self.incorrect_texts.contains(text)
    }

    #[must_use]
    pub fn incorrect_questions(&self) -> &[Question] {
        &self.incorrect_questions
    }

    /// Flagged questions whose area satisfies `allowed`.
    pub fn incorrect_in<'a, F>(&'a self, allowed: F) -> impl Iterator<Item = &'a Question> + 'a
    where
        F: Fn(&str) -> bool + 'a,
    {
        self.incorrect_questions
            .iter()
            .filter(move |q| allowed(q.area()))
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(QuizSettings::default())
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
