use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default EMA smoothing constant (half-life of roughly 14 answers).
pub const DEFAULT_SMOOTHING: f64 = 0.05;
/// Chance that a correct answer clears a flagged question.
pub const DEFAULT_GRADUATION_PROBABILITY: f64 = 0.10;
/// Chance that the general pool prefers unviewed questions.
pub const DEFAULT_UNVIEWED_PREFERENCE: f64 = 0.9;
/// Boost factor used when the caller does not provide one.
pub const DEFAULT_BOOST: f64 = 1.5;
/// Smallest boost factor accepted; lower values are clamped up to it.
pub const MIN_BOOST: f64 = 1.1;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("smoothing must be in (0, 1], got {0}")]
    InvalidSmoothing(f64),

    #[error("graduation probability must be in [0, 1], got {0}")]
    InvalidGraduationProbability(f64),

    #[error("unviewed preference must be in [0, 1], got {0}")]
    InvalidUnviewedPreference(f64),

    #[error("minimum boost must be finite and >= 1, got {0}")]
    InvalidMinBoost(f64),

    #[error("default boost ({default}) must be finite and >= minimum boost ({min})")]
    InvalidDefaultBoost { default: f64, min: f64 },
}

/// Validated tuning for scoring and selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuizSettings {
    smoothing: f64,
    graduation_probability: f64,
    unviewed_preference: f64,
    default_boost: f64,
    min_boost: f64,
}

/// Unvalidated settings, as read from a config file.
///
/// Missing fields fall back to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuizSettingsDraft {
    pub smoothing: Option<f64>,
    pub graduation_probability: Option<f64>,
    pub unviewed_preference: Option<f64>,
    pub default_boost: Option<f64>,
    pub min_boost: Option<f64>,
}

impl QuizSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the draft, filling gaps with defaults.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if a value is outside its accepted range.
    pub fn validate(self) -> Result<QuizSettings, SettingsError> {
        let smoothing = self.smoothing.unwrap_or(DEFAULT_SMOOTHING);
        let graduation_probability = self
            .graduation_probability
            .unwrap_or(DEFAULT_GRADUATION_PROBABILITY);
        let unviewed_preference = self
            .unviewed_preference
            .unwrap_or(DEFAULT_UNVIEWED_PREFERENCE);
        let min_boost = self.min_boost.unwrap_or(MIN_BOOST);
        let default_boost = self.default_boost.unwrap_or(DEFAULT_BOOST.max(min_boost));

        if !smoothing.is_finite() || smoothing <= 0.0 || smoothing > 1.0 {
            return Err(SettingsError::InvalidSmoothing(smoothing));
        }
        if !is_probability(graduation_probability) {
            return Err(SettingsError::InvalidGraduationProbability(
                graduation_probability,
            ));
        }
        if !is_probability(unviewed_preference) {
            return Err(SettingsError::InvalidUnviewedPreference(unviewed_preference));
        }
        if !min_boost.is_finite() || min_boost < 1.0 {
            return Err(SettingsError::InvalidMinBoost(min_boost));
        }
        if !default_boost.is_finite() || default_boost < min_boost {
            return Err(SettingsError::InvalidDefaultBoost {
                default: default_boost,
                min: min_boost,
            });
        }

        Ok(QuizSettings {
            smoothing,
            graduation_probability,
            unviewed_preference,
            default_boost,
            min_boost,
        })
    }
}

impl QuizSettings {
    #[must_use]
    pub fn smoothing(&self) -> f64 {
        self.smoothing
    }

    #[must_use]
    pub fn graduation_probability(&self) -> f64 {
        self.graduation_probability
    }

    #[must_use]
    pub fn unviewed_preference(&self) -> f64 {
        self.unviewed_preference
    }

    #[must_use]
    pub fn default_boost(&self) -> f64 {
        self.default_boost
    }

    #[must_use]
    pub fn min_boost(&self) -> f64 {
        self.min_boost
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            smoothing: DEFAULT_SMOOTHING,
            graduation_probability: DEFAULT_GRADUATION_PROBABILITY,
            unviewed_preference: DEFAULT_UNVIEWED_PREFERENCE,
            default_boost: DEFAULT_BOOST,
            min_boost: MIN_BOOST,
        }
    }
}

fn is_probability(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_draft_validates_to_defaults() {
        let settings = QuizSettingsDraft::new().validate().unwrap();
        assert_eq!(settings, QuizSettings::default());
    }

    #[test]
    fn draft_from_json_fills_missing_fields() {
        let draft: QuizSettingsDraft = serde_json::from_str(r#"{"smoothing":0.2}"#).unwrap();
        let settings = draft.validate().unwrap();

        assert_eq!(settings.smoothing(), 0.2);
        assert_eq!(settings.default_boost(), DEFAULT_BOOST);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let parsed = serde_json::from_str::<QuizSettingsDraft>(r#"{"alpha":0.2}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let err = QuizSettingsDraft {
            smoothing: Some(0.0),
            ..QuizSettingsDraft::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, SettingsError::InvalidSmoothing(_)));

        let err = QuizSettingsDraft {
            graduation_probability: Some(1.5),
            ..QuizSettingsDraft::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, SettingsError::InvalidGraduationProbability(_)));

        let err = QuizSettingsDraft {
            unviewed_preference: Some(f64::NAN),
            ..QuizSettingsDraft::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, SettingsError::InvalidUnviewedPreference(_)));

        let err = QuizSettingsDraft {
            min_boost: Some(0.5),
            ..QuizSettingsDraft::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, SettingsError::InvalidMinBoost(_)));
    }

    #[test]
    fn default_boost_must_not_be_below_minimum() {
        let err = QuizSettingsDraft {
            default_boost: Some(1.2),
            min_boost: Some(2.0),
            ..QuizSettingsDraft::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, SettingsError::InvalidDefaultBoost { .. }));
    }

    #[test]
    fn raising_min_boost_lifts_missing_default() {
        let settings = QuizSettingsDraft {
            min_boost: Some(3.0),
            ..QuizSettingsDraft::default()
        }
        .validate()
        .unwrap();
        assert_eq!(settings.default_boost(), 3.0);
    }
}
