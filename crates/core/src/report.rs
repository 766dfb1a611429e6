use std::collections::HashMap;

use crate::model::{ModuleId, ProgressRecord, TrainingModule};

/// How much of a role's curriculum a learner has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionStats {
    pub passed: usize,
    pub total: usize,
}

impl CompletionStats {
    /// `round(100 * passed / total)`, or 0 when the role has no modules.
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let passed = self.passed.min(self.total) as u64;
        let total = self.total as u64;
        u8::try_from((200 * passed + total) / (2 * total)).unwrap_or(100)
    }

    #[must_use]
    pub fn has_modules(&self) -> bool {
        self.total > 0
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.has_modules() && self.passed >= self.total
    }

    #[must_use]
    pub fn label(&self) -> String {
        if self.has_modules() {
            format!("{}/{} Completed", self.passed, self.total)
        } else {
            "No Modules".to_string()
        }
    }
}

/// Count the modules in `curriculum` that `progress` marks as passed.
#[must_use]
pub fn completion_stats(
    curriculum: &[TrainingModule],
    progress: &HashMap<ModuleId, ProgressRecord>,
) -> CompletionStats {
    let passed = curriculum
        .iter()
        .filter(|m| progress.get(&m.id()).is_some_and(ProgressRecord::passed))
        .count();
    CompletionStats {
        passed,
        total: curriculum.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LearnerId, ModuleCategory, ProgressPatch, Question, StaffRole};

    fn module(id: u64) -> TrainingModule {
        TrainingModule::from_persisted(
            ModuleId::new(id),
            format!("M{id}"),
            String::new(),
            StaffRole::Accountant,
            ModuleCategory::Refresher,
            Some("Finance".into()),
            "https://drive.google.com/file/d/1",
            String::new(),
            vec![Question::new("Q", vec!["A".into(), "B".into()], 1).unwrap()],
            u32::try_from(id).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn counts_only_passed_modules() {
        let curriculum = vec![module(1), module(2), module(3)];
        let learner = LearnerId::new("acc@school.org").unwrap();
        let mut progress = HashMap::new();
        progress.insert(
            ModuleId::new(1),
            ProgressRecord::new(learner.clone(), ModuleId::new(1))
                .apply(&ProgressPatch::new().with_passed(true)),
        );
        progress.insert(
            ModuleId::new(2),
            ProgressRecord::new(learner, ModuleId::new(2))
                .apply(&ProgressPatch::new().with_video_watched(true)),
        );

        let stats = completion_stats(&curriculum, &progress);
        assert_eq!(stats.passed, 1);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.percent(), 33);
        assert_eq!(stats.label(), "1/3 Completed");
        assert!(!stats.is_complete());
    }

    #[test]
    fn empty_curriculum_reports_no_modules() {
        let stats = completion_stats(&[], &HashMap::new());
        assert_eq!(stats.percent(), 0);
        assert_eq!(stats.label(), "No Modules");
        assert!(!stats.is_complete());
    }
}
