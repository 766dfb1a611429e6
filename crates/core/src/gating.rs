//! Rules deciding what a learner may do next within a role's curriculum.
//!
//! Every function here is pure: it reads progress state and returns either a
//! decision or the [`ProgressPatch`] describing a transition. Callers apply the
//! patch locally and hand the same patch to the progress gateway.

use std::collections::HashMap;

use crate::model::{ModuleId, ProgressPatch, ProgressRecord, TrainingModule};

/// Minimum rounded score that passes a quiz.
pub const PASS_MARK: u8 = 60;

/// Consecutive failed attempts after which the video must be watched again.
pub const STRIKE_LIMIT: u32 = 3;

//
// ─── MODULE STATUS ─────────────────────────────────────────────────────────────
//

/// What the learner sees for one module in their curriculum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleStatus {
    /// The previous module has not been passed yet.
    Locked,
    /// Reachable, but the video has not been watched.
    VideoPending,
    /// Video watched and the quiz may be taken.
    QuizReady,
    /// Three strikes: the video must be re-watched before another attempt.
    StruckOut,
    Passed,
}

impl ModuleStatus {
    /// Progress bar fill: 0 before the video, 50 after it, 100 once passed.
    #[must_use]
    pub fn completion_percent(self) -> u8 {
        match self {
            ModuleStatus::Passed => 100,
            ModuleStatus::QuizReady | ModuleStatus::StruckOut => 50,
            ModuleStatus::Locked | ModuleStatus::VideoPending => 0,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ModuleStatus::Locked => "locked",
            ModuleStatus::VideoPending => "watch video",
            ModuleStatus::QuizReady => "quiz ready",
            ModuleStatus::StruckOut => "re-watch required",
            ModuleStatus::Passed => "passed",
        }
    }
}

//
// ─── GATES ─────────────────────────────────────────────────────────────────────
//

/// Whether `modules[index]` is locked.
///
/// `modules` must already be the role-filtered, ordinal-sorted curriculum.
/// Index 0 is never locked. Any later module is locked unless the module right
/// before it has a progress record with `passed == true`. An index past the end
/// of the curriculum names no reachable module and reports locked.
#[must_use]
pub fn is_module_locked(
    modules: &[TrainingModule],
    progress: &HashMap<ModuleId, ProgressRecord>,
    index: usize,
) -> bool {
    if index == 0 {
        return false;
    }
    if index >= modules.len() {
        return true;
    }
    let previous = &modules[index - 1];
    !progress.get(&previous.id()).is_some_and(ProgressRecord::passed)
}

#[must_use]
pub fn is_video_required(progress: &ProgressRecord) -> bool {
    !progress.video_watched()
}

/// Failed `STRIKE_LIMIT` times in a row without passing.
#[must_use]
pub fn is_strike_out(progress: &ProgressRecord) -> bool {
    !progress.passed() && progress.attempts() >= STRIKE_LIMIT
}

#[must_use]
pub fn is_quiz_accessible(progress: &ProgressRecord) -> bool {
    progress.video_watched() && !is_strike_out(progress)
}

/// Status of `modules[index]` for the learner owning `progress`.
///
/// A module with no record yet is treated as fresh (video pending).
#[must_use]
pub fn module_status(
    modules: &[TrainingModule],
    progress: &HashMap<ModuleId, ProgressRecord>,
    index: usize,
) -> ModuleStatus {
    if is_module_locked(modules, progress, index) {
        return ModuleStatus::Locked;
    }
    let Some(record) = modules.get(index).and_then(|m| progress.get(&m.id())) else {
        return ModuleStatus::VideoPending;
    };
    if record.passed() {
        ModuleStatus::Passed
    } else if is_strike_out(record) {
        ModuleStatus::StruckOut
    } else if is_video_required(record) {
        ModuleStatus::VideoPending
    } else {
        ModuleStatus::QuizReady
    }
}

//
// ─── TRANSITIONS ───────────────────────────────────────────────────────────────
//

/// Patch recorded when the learner finishes the video.
#[must_use]
pub fn video_watched_patch() -> ProgressPatch {
    ProgressPatch::new().with_video_watched(true)
}

/// Set `video_watched`; idempotent.
#[must_use]
pub fn mark_video_watched(progress: &ProgressRecord) -> ProgressRecord {
    progress.apply(&video_watched_patch())
}

/// Full reset written when the learner chooses to re-watch.
///
/// This is the only transition that clears `attempts`, and it drops any
/// earlier quiz credit along with it.
#[must_use]
pub fn rewatch_patch() -> ProgressPatch {
    ProgressPatch::new()
        .with_video_watched(false)
        .with_score(None)
        .with_passed(false)
        .with_attempts(0)
}

#[must_use]
pub fn apply_rewatch(progress: &ProgressRecord) -> ProgressRecord {
    progress.apply(&rewatch_patch())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LearnerId, ModuleCategory, Question, Score, StaffRole};

    fn learner() -> LearnerId {
        LearnerId::new("staff@darshan.org").unwrap()
    }

    fn module(id: u64, ordinal: u32) -> TrainingModule {
        TrainingModule::from_persisted(
            ModuleId::new(id),
            format!("Module {id}"),
            String::new(),
            StaffRole::Teacher,
            ModuleCategory::New,
            None,
            "https://youtu.be/x",
            String::new(),
            vec![Question::new("Q", vec!["A".into(), "B".into()], 0).unwrap()],
            ordinal,
        )
        .unwrap()
    }

    fn record(module_id: u64, patch: ProgressPatch) -> ProgressRecord {
        ProgressRecord::new(learner(), ModuleId::new(module_id)).apply(&patch)
    }

    fn with_attempts(attempts: u32, passed: bool) -> ProgressRecord {
        record(
            1,
            ProgressPatch::new()
                .with_video_watched(true)
                .with_attempts(attempts)
                .with_passed(passed),
        )
    }

    #[test]
    fn first_module_is_never_locked() {
        let empty = HashMap::new();
        assert!(!is_module_locked(&[], &empty, 0));
        assert!(!is_module_locked(&[module(1, 0), module(2, 1)], &empty, 0));
    }

    #[test]
    fn later_module_locked_until_previous_passed() {
        let modules = vec![module(1, 0), module(2, 1), module(3, 2)];
        let mut progress = HashMap::new();
        assert!(is_module_locked(&modules, &progress, 1));

        progress.insert(
            ModuleId::new(1),
            record(1, ProgressPatch::new().with_video_watched(true)),
        );
        assert!(is_module_locked(&modules, &progress, 1));

        progress.insert(ModuleId::new(1), record(1, ProgressPatch::new().with_passed(true)));
        assert!(!is_module_locked(&modules, &progress, 1));
        // only the immediately preceding module counts
        assert!(is_module_locked(&modules, &progress, 2));
    }

    #[test]
    fn index_past_end_is_locked() {
        let modules = vec![module(1, 0)];
        assert!(is_module_locked(&modules, &HashMap::new(), 5));
    }

    #[test]
    fn strike_out_requires_three_failures_without_pass() {
        assert!(!is_strike_out(&with_attempts(2, false)));
        assert!(is_strike_out(&with_attempts(3, false)));
        assert!(is_strike_out(&with_attempts(4, false)));
        assert!(!is_strike_out(&with_attempts(3, true)));
    }

    #[test]
    fn quiz_needs_video_and_no_strike_out() {
        let fresh = ProgressRecord::new(learner(), ModuleId::new(1));
        assert!(is_video_required(&fresh));
        assert!(!is_quiz_accessible(&fresh));

        let watched = mark_video_watched(&fresh);
        assert!(!is_video_required(&watched));
        assert!(is_quiz_accessible(&watched));

        assert!(!is_quiz_accessible(&with_attempts(3, false)));
    }

    #[test]
    fn rewatch_is_full_reset() {
        let struck = with_attempts(3, false)
            .apply(&ProgressPatch::new().with_score(Some(Score::new(50).unwrap())));
        let reset = apply_rewatch(&struck);
        assert!(!reset.video_watched());
        assert_eq!(reset.score(), None);
        assert!(!reset.passed());
        assert_eq!(reset.attempts(), 0);
        assert!(!is_strike_out(&reset));

        let passed = with_attempts(1, true);
        assert_eq!(apply_rewatch(&passed), apply_rewatch(&struck));
    }

    #[test]
    fn mark_video_watched_is_idempotent() {
        let fresh = ProgressRecord::new(learner(), ModuleId::new(1));
        let once = mark_video_watched(&fresh);
        assert_eq!(mark_video_watched(&once), once);
    }

    #[test]
    fn status_tracks_each_stage() {
        let modules = vec![module(1, 0), module(2, 1)];
        let mut progress = HashMap::new();
        assert_eq!(module_status(&modules, &progress, 0), ModuleStatus::VideoPending);
        assert_eq!(module_status(&modules, &progress, 1), ModuleStatus::Locked);

        progress.insert(ModuleId::new(1), with_attempts(0, false));
        assert_eq!(module_status(&modules, &progress, 0), ModuleStatus::QuizReady);

        progress.insert(ModuleId::new(1), with_attempts(3, false));
        assert_eq!(module_status(&modules, &progress, 0), ModuleStatus::StruckOut);
        assert_eq!(ModuleStatus::StruckOut.completion_percent(), 50);

        progress.insert(ModuleId::new(1), with_attempts(1, true));
        assert_eq!(module_status(&modules, &progress, 0), ModuleStatus::Passed);
        assert_eq!(module_status(&modules, &progress, 1), ModuleStatus::VideoPending);
        assert_eq!(ModuleStatus::Passed.completion_percent(), 100);
    }
}
