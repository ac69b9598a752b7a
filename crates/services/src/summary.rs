use quiz_core::{ProgressTracker, QuestionBank};

/// Per-area line of the progress summary.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaSummary {
    pub area: String,
    /// Smoothed accuracy; `None` until the area has an answer.
    pub average: Option<f64>,
    pub viewed: usize,
    /// Questions of this area in the loaded bank.
    pub total: usize,
}

/// Presentation-agnostic overview of learner progress.
///
/// Holds raw numbers only; formatting is left to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSummary {
    pub question_count: usize,
    pub viewed_count: usize,
    pub viewed_ratio: f64,
    pub incorrect_count: usize,
    pub incorrect_ratio: f64,
    pub areas: Vec<AreaSummary>,
}

impl ProgressSummary {
    /// Summarize `tracker` against `bank`.
    ///
    /// Areas come in bank order. Areas that only exist in the recorded progress
    /// (e.g. dropped from a newer bank) follow, sorted by name.
    #[must_use]
    pub fn from_state(bank: &QuestionBank, tracker: &ProgressTracker) -> Self {
        let mut areas: Vec<AreaSummary> = bank
            .areas()
            .iter()
            .map(|area| AreaSummary {
                area: area.clone(),
                average: tracker.average_for(area),
                viewed: tracker.viewed_count_for(area),
                total: bank.count_for_area(area),
            })
            .collect();

        let mut stale: Vec<&String> = tracker
            .averages()
            .keys()
            .chain(tracker.viewed_by_area().keys())
            .filter(|area| !bank.index().contains(area))
            .collect();
        stale.sort();
        stale.dedup();
        areas.extend(stale.into_iter().map(|area| AreaSummary {
            area: area.clone(),
            average: tracker.average_for(area),
            viewed: tracker.viewed_count_for(area),
            total: 0,
        }));

        Self {
            question_count: bank.len(),
            viewed_count: tracker.viewed_count(),
            viewed_ratio: tracker.viewed_ratio(bank.len()),
            incorrect_count: tracker.incorrect_count(),
            incorrect_ratio: tracker.incorrect_ratio(bank.len()),
            areas,
        }
    }

    #[must_use]
    pub fn area(&self, name: &str) -> Option<&AreaSummary> {
        self.areas.iter().find(|a| a.area == name)
    }
}
