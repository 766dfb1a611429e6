//! Gated learner transitions wired to the progress gateway.
//!
//! `LearnerService` keeps an optimistic copy of the learner's progress. Each
//! transition applies its patch to that copy first and then writes the same
//! patch through the gateway. A failed write leaves the optimistic copy in
//! place and surfaces `LearnerError::GatewayWrite`; [`LearnerService::refresh`]
//! replaces the copy with durable state.

use std::collections::HashMap;
use std::sync::Arc;

use onboard_core::gating::{
    ModuleStatus, is_module_locked, is_strike_out, is_video_required, module_status,
    rewatch_patch, video_watched_patch,
};
use onboard_core::model::{
    ModuleId, ProgressPatch, ProgressRecord, StaffMember, TrainingModule,
};
use onboard_core::quiz::{QuizSession, QuizStep};
use onboard_core::report::{CompletionStats, completion_stats};
use storage::repository::{ModuleRepository, ProgressRepository};

use crate::Clock;
use crate::error::LearnerError;

/// One row of the learner's curriculum view.
#[derive(Debug, Clone, Copy)]
pub struct CurriculumEntry<'a> {
    pub index: usize,
    pub module: &'a TrainingModule,
    pub status: ModuleStatus,
    pub progress: Option<&'a ProgressRecord>,
}

/// Learner-facing service bound to one signed-in staff member.
pub struct LearnerService {
    clock: Clock,
    learner: StaffMember,
    catalog: Arc<dyn ModuleRepository>,
    gateway: Arc<dyn ProgressRepository>,
    curriculum: Vec<TrainingModule>,
    progress: HashMap<ModuleId, ProgressRecord>,
}

impl LearnerService {
    /// Load the learner's curriculum and progress.
    ///
    /// # Errors
    ///
    /// Returns `LearnerError::Catalog` or `LearnerError::GatewayRead` if the
    /// initial load fails.
    pub async fn open(
        clock: Clock,
        learner: StaffMember,
        catalog: Arc<dyn ModuleRepository>,
        gateway: Arc<dyn ProgressRepository>,
    ) -> Result<Self, LearnerError> {
        let mut service = Self {
            clock,
            learner,
            catalog,
            gateway,
            curriculum: Vec::new(),
            progress: HashMap::new(),
        };
        service.refresh().await?;
        Ok(service)
    }

    /// Replace cached curriculum and progress with durable state.
    ///
    /// On error the cache is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `LearnerError::Catalog` or `LearnerError::GatewayRead`.
    pub async fn refresh(&mut self) -> Result<(), LearnerError> {
        let curriculum = self
            .catalog
            .list_modules(self.learner.role)
            .await
            .map_err(LearnerError::Catalog)?;
        let records = self
            .gateway
            .list_progress(&self.learner.learner_id)
            .await
            .map_err(LearnerError::GatewayRead)?;

        self.curriculum = curriculum;
        self.progress = records
            .into_iter()
            .map(|record| (record.module_id(), record))
            .collect();
        tracing::debug!(
            learner = %self.learner.learner_id,
            modules = self.curriculum.len(),
            records = self.progress.len(),
            "refreshed learner state"
        );
        Ok(())
    }

    #[must_use]
    pub fn learner(&self) -> &StaffMember {
        &self.learner
    }

    #[must_use]
    pub fn modules(&self) -> &[TrainingModule] {
        &self.curriculum
    }

    /// Curriculum in order, with the status of each module.
    #[must_use]
    pub fn curriculum(&self) -> Vec<CurriculumEntry<'_>> {
        self.curriculum
            .iter()
            .enumerate()
            .map(|(index, module)| CurriculumEntry {
                index,
                module,
                status: module_status(&self.curriculum, &self.progress, index),
                progress: self.progress.get(&module.id()),
            })
            .collect()
    }

    /// Cached progress for `module_id`, if any interaction happened.
    #[must_use]
    pub fn progress(&self, module_id: ModuleId) -> Option<&ProgressRecord> {
        self.progress.get(&module_id)
    }

    #[must_use]
    pub fn completion(&self) -> CompletionStats {
        completion_stats(&self.curriculum, &self.progress)
    }

    /// Record that the module's video was watched to the end.
    ///
    /// # Errors
    ///
    /// Returns `LearnerError::UnknownModule` or `LearnerError::Locked` if the
    /// module is not reachable, and `LearnerError::GatewayWrite` if the write
    /// fails.
    pub async fn mark_video_watched(
        &mut self,
        module_id: ModuleId,
    ) -> Result<&ProgressRecord, LearnerError> {
        self.reachable(module_id)?;
        self.commit(module_id, video_watched_patch()).await
    }

    /// Reset the module so its video must be watched again.
    ///
    /// # Errors
    ///
    /// Same as [`LearnerService::mark_video_watched`].
    pub async fn rewatch(&mut self, module_id: ModuleId) -> Result<&ProgressRecord, LearnerError> {
        self.reachable(module_id)?;
        self.commit(module_id, rewatch_patch()).await
    }

    /// Begin a fresh quiz attempt, clearing the stored score.
    ///
    /// Any earlier abandoned session is irrelevant: the returned session
    /// always starts at the first question. A passed module stays passed
    /// until the learner re-watches it.
    ///
    /// # Errors
    ///
    /// Returns `LearnerError::Locked`, `LearnerError::Configuration` for a
    /// module without questions, `LearnerError::AlreadyPassed`,
    /// `LearnerError::VideoRequired`, `LearnerError::StruckOut`, or
    /// `LearnerError::GatewayWrite`.
    pub async fn start_quiz(&mut self, module_id: ModuleId) -> Result<QuizSession, LearnerError> {
        let index = self.reachable(module_id)?;
        let module = &self.curriculum[index];
        if !module.is_completable() {
            return Err(LearnerError::Configuration(module_id));
        }

        let record = self.record_or_default(module_id);
        if record.passed() {
            return Err(LearnerError::AlreadyPassed(module_id));
        }
        if is_video_required(&record) {
            return Err(LearnerError::VideoRequired(module_id));
        }
        if is_strike_out(&record) {
            return Err(LearnerError::StruckOut {
                module: module_id,
                attempts: record.attempts(),
            });
        }

        let mut session = QuizSession::new(module)?;
        let patch = session.start(&record)?;
        self.commit(module_id, patch).await?;
        tracing::debug!(
            learner = %self.learner.learner_id,
            module_id = %module_id,
            questions = session.total_questions(),
            "quiz started"
        );
        Ok(session)
    }

    /// Submit an answer for the session's current question.
    ///
    /// When the last question is answered the outcome patch is written
    /// through the gateway. If that write fails the session stays finished,
    /// the optimistic state holds the outcome, and `GatewayWrite` is returned.
    ///
    /// # Errors
    ///
    /// Returns `LearnerError::Quiz` for an invalid option or a session that
    /// is not in progress, and `LearnerError::GatewayWrite` on write failure.
    pub async fn submit_answer(
        &mut self,
        session: &mut QuizSession,
        selected: usize,
    ) -> Result<QuizStep, LearnerError> {
        let step = session.submit_answer(selected)?;
        if let QuizStep::Finished { outcome, patch } = step {
            tracing::info!(
                learner = %self.learner.learner_id,
                module_id = %session.module_id(),
                score = outcome.score.value(),
                passed = outcome.passed,
                correct = outcome.correct,
                total = outcome.total,
                "quiz finished"
            );
            self.commit(session.module_id(), patch).await?;
        }
        Ok(step)
    }

    fn position(&self, module_id: ModuleId) -> Result<usize, LearnerError> {
        self.curriculum
            .iter()
            .position(|m| m.id() == module_id)
            .ok_or(LearnerError::UnknownModule(module_id))
    }

    fn reachable(&self, module_id: ModuleId) -> Result<usize, LearnerError> {
        let index = self.position(module_id)?;
        if is_module_locked(&self.curriculum, &self.progress, index) {
            return Err(LearnerError::Locked(module_id));
        }
        Ok(index)
    }

    fn record_or_default(&self, module_id: ModuleId) -> ProgressRecord {
        self.progress.get(&module_id).cloned().unwrap_or_else(|| {
            ProgressRecord::new(self.learner.learner_id.clone(), module_id)
        })
    }

    async fn commit(
        &mut self,
        module_id: ModuleId,
        patch: ProgressPatch,
    ) -> Result<&ProgressRecord, LearnerError> {
        let optimistic = self.record_or_default(module_id).apply(&patch);
        self.progress.insert(module_id, optimistic);

        let written = self
            .gateway
            .write_progress(&self.learner.learner_id, module_id, &patch, self.clock.now())
            .await;
        match written {
            Ok(durable) => {
                tracing::debug!(
                    learner = %self.learner.learner_id,
                    module_id = %module_id,
                    ?patch,
                    "progress written"
                );
                self.progress.insert(module_id, durable);
            }
            Err(source) => {
                tracing::warn!(
                    learner = %self.learner.learner_id,
                    module_id = %module_id,
                    error = %source,
                    "progress write failed, keeping optimistic state"
                );
                return Err(LearnerError::GatewayWrite {
                    module: module_id,
                    source,
                });
            }
        }

        self.progress
            .get(&module_id)
            .ok_or(LearnerError::UnknownModule(module_id))
    }
}
