use std::collections::HashMap;
use std::sync::Arc;

use onboard_core::model::{
    AdminScope, LearnerId, ModuleId, ProgressRecord, StaffMember, curriculum_for_role,
};
use onboard_core::report::{CompletionStats, completion_stats};
use storage::repository::{ModuleRepository, ProgressRepository};

use crate::error::ReportError;

/// One staff member's completion within their role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub member: StaffMember,
    pub stats: CompletionStats,
}

/// Progress analytics for administrators.
#[derive(Clone)]
pub struct ReportService {
    modules: Arc<dyn ModuleRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl ReportService {
    #[must_use]
    pub fn new(
        modules: Arc<dyn ModuleRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self { modules, progress }
    }

    /// Completion rows for every non-admin member of `staff` that `scope`
    /// covers and `search` matches, in roster order.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Storage` if modules or progress cannot be read.
    pub async fn progress_report(
        &self,
        scope: AdminScope,
        staff: &[StaffMember],
        search: &str,
    ) -> Result<Vec<ReportRow>, ReportError> {
        let modules = self.modules.list_all_modules().await?;
        let mut by_learner: HashMap<LearnerId, HashMap<ModuleId, ProgressRecord>> =
            HashMap::new();
        for record in self.progress.list_all_progress().await? {
            by_learner
                .entry(record.learner_id().clone())
                .or_default()
                .insert(record.module_id(), record);
        }

        let empty = HashMap::new();
        let rows: Vec<ReportRow> = staff
            .iter()
            .filter(|m| !m.is_admin() && scope.covers(m.role) && m.matches_search(search))
            .map(|member| {
                let curriculum = curriculum_for_role(&modules, member.role);
                let progress = by_learner.get(&member.learner_id).unwrap_or(&empty);
                ReportRow {
                    member: member.clone(),
                    stats: completion_stats(&curriculum, progress),
                }
            })
            .collect();
        tracing::debug!(%scope, search, rows = rows.len(), "built progress report");
        Ok(rows)
    }

    /// Remove every progress record of a deleted account.
    ///
    /// Returns the number of records removed.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Forbidden` unless `scope` may manage accounts,
    /// and `ReportError::Storage` if the delete fails.
    pub async fn delete_learner(
        &self,
        scope: AdminScope,
        learner: &LearnerId,
    ) -> Result<u64, ReportError> {
        if !scope.can_manage_accounts() {
            return Err(ReportError::Forbidden);
        }
        let removed = self.progress.delete_learner_progress(learner).await?;
        tracing::info!(learner = %learner, removed, "learner progress deleted");
        Ok(removed)
    }
}
