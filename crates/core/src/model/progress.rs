use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{LearnerId, ModuleId};

/// Highest score a quiz can award.
pub const MAX_SCORE: u8 = 100;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("score {0} is above {MAX_SCORE}")]
    ScoreOutOfRange(u8),
}

//
// ─── SCORE ─────────────────────────────────────────────────────────────────────
//

/// Quiz percentage in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Score(u8);

impl Score {
    /// # Errors
    ///
    /// Returns `ProgressError::ScoreOutOfRange` if `value` exceeds 100.
    pub fn new(value: u8) -> Result<Self, ProgressError> {
        if value > MAX_SCORE {
            return Err(ProgressError::ScoreOutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Clamp `value` into range.
    #[must_use]
    pub fn saturating(value: u8) -> Self {
        Self(value.min(MAX_SCORE))
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

//
// ─── PATCH ─────────────────────────────────────────────────────────────────────
//

/// Partial update of a progress record.
///
/// `None` means "leave unchanged". For `score`, `Some(None)` clears the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressPatch {
    pub video_watched: Option<bool>,
    pub score: Option<Option<Score>>,
    pub passed: Option<bool>,
    pub attempts: Option<u32>,
}

impl ProgressPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_video_watched(mut self, watched: bool) -> Self {
        self.video_watched = Some(watched);
        self
    }

    #[must_use]
    pub fn with_score(mut self, score: Option<Score>) -> Self {
        self.score = Some(score);
        self
    }

    #[must_use]
    pub fn with_passed(mut self, passed: bool) -> Self {
        self.passed = Some(passed);
        self
    }

    #[must_use]
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.video_watched.is_none()
            && self.score.is_none()
            && self.passed.is_none()
            && self.attempts.is_none()
    }
}

//
// ─── RECORD ────────────────────────────────────────────────────────────────────
//

/// A learner's state for one module.
///
/// Created lazily with [`ProgressRecord::new`] on first interaction; every later
/// change goes through a [`ProgressPatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    learner_id: LearnerId,
    module_id: ModuleId,
    video_watched: bool,
    score: Option<Score>,
    passed: bool,
    attempts: u32,
    updated_at: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    /// Default record for a (learner, module) pair with no interaction yet.
    #[must_use]
    pub fn new(learner_id: LearnerId, module_id: ModuleId) -> Self {
        Self {
            learner_id,
            module_id,
            video_watched: false,
            score: None,
            passed: false,
            attempts: 0,
            updated_at: None,
        }
    }

    /// Rehydrate a record from storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::ScoreOutOfRange` if the stored score exceeds 100.
    pub fn from_persisted(
        learner_id: LearnerId,
        module_id: ModuleId,
        video_watched: bool,
        score: Option<u8>,
        passed: bool,
        attempts: u32,
        updated_at: Option<DateTime<Utc>>,
    ) -> Result<Self, ProgressError> {
        let score = score.map(Score::new).transpose()?;
        Ok(Self {
            learner_id,
            module_id,
            video_watched,
            score,
            passed,
            attempts,
            updated_at,
        })
    }

    /// Merge `patch` over this record. Fields the patch leaves unset keep
    /// their current value.
    #[must_use]
    pub fn apply(&self, patch: &ProgressPatch) -> Self {
        Self {
            learner_id: self.learner_id.clone(),
            module_id: self.module_id,
            video_watched: patch.video_watched.unwrap_or(self.video_watched),
            score: patch.score.unwrap_or(self.score),
            passed: patch.passed.unwrap_or(self.passed),
            attempts: patch.attempts.unwrap_or(self.attempts),
            updated_at: self.updated_at,
        }
    }

    /// Stamp the time the record was last durably written.
    #[must_use]
    pub fn touched(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    #[must_use]
    pub fn learner_id(&self) -> &LearnerId {
        &self.learner_id
    }

    #[must_use]
    pub fn module_id(&self) -> ModuleId {
        self.module_id
    }

    #[must_use]
    pub fn video_watched(&self) -> bool {
        self.video_watched
    }

    #[must_use]
    pub fn score(&self) -> Option<Score> {
        self.score
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.passed
    }

    /// Consecutive failed attempts since the last re-watch.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn record() -> ProgressRecord {
        ProgressRecord::new(LearnerId::new("a@b.org").unwrap(), ModuleId::new(7))
    }

    #[test]
    fn new_record_has_defaults() {
        let r = record();
        assert!(!r.video_watched());
        assert_eq!(r.score(), None);
        assert!(!r.passed());
        assert_eq!(r.attempts(), 0);
        assert_eq!(r.updated_at(), None);
    }

    #[test]
    fn apply_merges_only_specified_fields() {
        let r = record().apply(&ProgressPatch::new().with_video_watched(true).with_attempts(2));
        let forty = Score::new(40).unwrap();
        let r = r.apply(&ProgressPatch::new().with_score(Some(forty)));
        assert!(r.video_watched());
        assert_eq!(r.attempts(), 2);
        assert_eq!(r.score(), Some(forty));

        let cleared = r.apply(&ProgressPatch::new().with_score(None));
        assert_eq!(cleared.score(), None);
        assert_eq!(cleared.attempts(), 2);
        assert!(cleared.video_watched());
    }

    #[test]
    fn empty_patch_is_identity() {
        let r = record().touched(fixed_now());
        assert!(ProgressPatch::new().is_empty());
        assert_eq!(r.apply(&ProgressPatch::new()), r);
    }

    #[test]
    fn rejects_score_above_max() {
        assert_eq!(Score::new(101).unwrap_err(), ProgressError::ScoreOutOfRange(101));
        assert_eq!(Score::new(100).unwrap().to_string(), "100%");

        let err = ProgressRecord::from_persisted(
            LearnerId::new("a@b.org").unwrap(),
            ModuleId::new(1),
            true,
            Some(150),
            false,
            0,
            None,
        )
        .unwrap_err();
        assert_eq!(err, ProgressError::ScoreOutOfRange(150));
    }
}
