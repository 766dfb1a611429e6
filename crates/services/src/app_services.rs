use std::sync::Arc;

use onboard_core::model::StaffMember;
use storage::repository::Storage;

use crate::Clock;
use crate::catalog_service::CatalogService;
use crate::error::{AppServicesError, LearnerError};
use crate::learner_service::LearnerService;
use crate::quiz_provider::{QuizContentProvider, SampleQuizProvider};
use crate::report_service::ReportService;

/// Assembles the portal's services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    storage: Storage,
    catalog: Arc<CatalogService>,
    reports: Arc<ReportService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the sample quiz provider.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(storage, clock, Arc::new(SampleQuizProvider)))
    }

    #[must_use]
    pub fn from_storage(
        storage: Storage,
        clock: Clock,
        quiz_provider: Arc<dyn QuizContentProvider>,
    ) -> Self {
        let catalog = Arc::new(CatalogService::new(
            Arc::clone(&storage.modules),
            quiz_provider,
        ));
        let reports = Arc::new(ReportService::new(
            Arc::clone(&storage.modules),
            Arc::clone(&storage.progress),
        ));
        Self {
            clock,
            storage,
            catalog,
            reports,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn reports(&self) -> Arc<ReportService> {
        Arc::clone(&self.reports)
    }

    /// Open a learner session for `member`.
    ///
    /// # Errors
    ///
    /// Returns `LearnerError` if the learner's state cannot be loaded.
    pub async fn learner(&self, member: StaffMember) -> Result<LearnerService, LearnerError> {
        LearnerService::open(
            self.clock,
            member,
            Arc::clone(&self.storage.modules),
            Arc::clone(&self.storage.progress),
        )
        .await
    }
}
