use async_trait::async_trait;
use chrono::{DateTime, Utc};
use onboard_core::model::{
    LearnerId, ModuleId, ProgressPatch, ProgressRecord, StaffRole, TrainingModule,
    ValidatedModule,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Catalog of training modules.
#[async_trait]
pub trait ModuleRepository: Send + Sync {
    /// Persist a new module, assigning its id and the next ordinal for its role.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the module cannot be stored.
    async fn insert_new_module(&self, module: ValidatedModule)
    -> Result<TrainingModule, StorageError>;

    /// Fetch a module by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for storage failures; a missing module is `Ok(None)`.
    async fn get_module(&self, id: ModuleId) -> Result<Option<TrainingModule>, StorageError>;

    /// Modules for `role`, ordered by `(ordinal, id)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for storage failures.
    async fn list_modules(&self, role: StaffRole) -> Result<Vec<TrainingModule>, StorageError>;

    /// Every module, ordered by `(role, ordinal, id)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for storage failures.
    async fn list_all_modules(&self) -> Result<Vec<TrainingModule>, StorageError>;

    /// Delete a module together with all progress recorded against it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the module does not exist.
    async fn delete_module(&self, id: ModuleId) -> Result<(), StorageError>;
}

/// Durable store for per-learner module progress.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Read the record for one (learner, module) pair.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the read fails. Absence is `Ok(None)`, never an error.
    async fn read_progress(
        &self,
        learner: &LearnerId,
        module_id: ModuleId,
    ) -> Result<Option<ProgressRecord>, StorageError>;

    /// All records belonging to `learner`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the read fails.
    async fn list_progress(&self, learner: &LearnerId)
    -> Result<Vec<ProgressRecord>, StorageError>;

    /// Every record, for reporting.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the read fails.
    async fn list_all_progress(&self) -> Result<Vec<ProgressRecord>, StorageError>;

    /// Merge `patch` over the stored record, or over a default record if none
    /// exists yet, and return the merged result.
    ///
    /// Fields the patch leaves unset are never overwritten.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the module does not exist, or other
    /// storage errors if the write fails.
    async fn write_progress(
        &self,
        learner: &LearnerId,
        module_id: ModuleId,
        patch: &ProgressPatch,
        at: DateTime<Utc>,
    ) -> Result<ProgressRecord, StorageError>;

    /// Remove all progress for a deleted account. Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the delete fails.
    async fn delete_learner_progress(&self, learner: &LearnerId) -> Result<u64, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    modules: Arc<Mutex<HashMap<ModuleId, TrainingModule>>>,
    progress: Arc<Mutex<HashMap<(LearnerId, ModuleId), ProgressRecord>>>,
    next_module_id: Arc<Mutex<u64>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn sorted(mut modules: Vec<TrainingModule>) -> Vec<TrainingModule> {
    modules.sort_by_key(|m| (m.role(), m.ordinal(), m.id()));
    modules
}

#[async_trait]
impl ModuleRepository for InMemoryRepository {
    async fn insert_new_module(
        &self,
        module: ValidatedModule,
    ) -> Result<TrainingModule, StorageError> {
        let mut guard = self.modules.lock().map_err(poisoned)?;
        let mut next_id = self.next_module_id.lock().map_err(poisoned)?;
        *next_id += 1;
        let id = ModuleId::new(*next_id);
        let ordinal = guard
            .values()
            .filter(|m| m.role() == module.role)
            .map(|m| m.ordinal() + 1)
            .max()
            .unwrap_or(0);
        let module = module.assign(id, ordinal);
        guard.insert(id, module.clone());
        Ok(module)
    }

    async fn get_module(&self, id: ModuleId) -> Result<Option<TrainingModule>, StorageError> {
        let guard = self.modules.lock().map_err(poisoned)?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_modules(&self, role: StaffRole) -> Result<Vec<TrainingModule>, StorageError> {
        let guard = self.modules.lock().map_err(poisoned)?;
        Ok(sorted(
            guard.values().filter(|m| m.role() == role).cloned().collect(),
        ))
    }

    async fn list_all_modules(&self) -> Result<Vec<TrainingModule>, StorageError> {
        let guard = self.modules.lock().map_err(poisoned)?;
        Ok(sorted(guard.values().cloned().collect()))
    }

    async fn delete_module(&self, id: ModuleId) -> Result<(), StorageError> {
        let mut guard = self.modules.lock().map_err(poisoned)?;
        guard.remove(&id).ok_or(StorageError::NotFound)?;
        let mut progress = self.progress.lock().map_err(poisoned)?;
        progress.retain(|(_, module_id), _| *module_id != id);
        Ok(())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn read_progress(
        &self,
        learner: &LearnerId,
        module_id: ModuleId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let guard = self.progress.lock().map_err(poisoned)?;
        Ok(guard.get(&(learner.clone(), module_id)).cloned())
    }

    async fn list_progress(
        &self,
        learner: &LearnerId,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        let guard = self.progress.lock().map_err(poisoned)?;
        let mut records: Vec<_> = guard
            .values()
            .filter(|r| r.learner_id() == learner)
            .cloned()
            .collect();
        records.sort_by_key(ProgressRecord::module_id);
        Ok(records)
    }

    async fn list_all_progress(&self) -> Result<Vec<ProgressRecord>, StorageError> {
        let guard = self.progress.lock().map_err(poisoned)?;
        let mut records: Vec<_> = guard.values().cloned().collect();
        records.sort_by(|a, b| {
            (a.learner_id(), a.module_id()).cmp(&(b.learner_id(), b.module_id()))
        });
        Ok(records)
    }

    async fn write_progress(
        &self,
        learner: &LearnerId,
        module_id: ModuleId,
        patch: &ProgressPatch,
        at: DateTime<Utc>,
    ) -> Result<ProgressRecord, StorageError> {
        if !self.modules.lock().map_err(poisoned)?.contains_key(&module_id) {
            return Err(StorageError::NotFound);
        }
        let mut guard = self.progress.lock().map_err(poisoned)?;
        let key = (learner.clone(), module_id);
        let merged = guard
            .get(&key)
            .cloned()
            .unwrap_or_else(|| ProgressRecord::new(learner.clone(), module_id))
            .apply(patch)
            .touched(at);
        guard.insert(key, merged.clone());
        Ok(merged)
    }

    async fn delete_learner_progress(&self, learner: &LearnerId) -> Result<u64, StorageError> {
        let mut guard = self.progress.lock().map_err(poisoned)?;
        let before = guard.len();
        guard.retain(|(owner, _), _| owner != learner);
        Ok((before - guard.len()) as u64)
    }
}

/// Aggregates the catalog and the progress gateway behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub modules: Arc<dyn ModuleRepository>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let modules: Arc<dyn ModuleRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo);
        Self { modules, progress }
    }
}
