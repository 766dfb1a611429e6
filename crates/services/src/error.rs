//! Shared error types for the services crate.

use std::path::PathBuf;

use thiserror::Error;

use onboard_core::model::{ModuleError, ModuleId, QuestionError};
use onboard_core::quiz::QuizError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `CatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error(transparent)]
    Module(#[from] ModuleError),
    #[error("generated question {index} is invalid: {source}")]
    GeneratedQuestion {
        index: usize,
        #[source]
        source: QuestionError,
    },
    #[error("quiz generator failed: {0}")]
    Provider(#[from] QuizProviderError),
    #[error("quiz generator returned no questions")]
    NothingGenerated,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failure reported by a `QuizContentProvider`.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct QuizProviderError(pub String);

/// Errors emitted by `LearnerService`.
///
/// Gateway failures keep their own variants so a failed read is never
/// mistaken for a learner with no progress.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LearnerError {
    #[error("module {0} is not in this learner's curriculum")]
    UnknownModule(ModuleId),
    #[error("module {0} has no quiz questions")]
    Configuration(ModuleId),
    #[error("module {0} is locked until the previous module is passed")]
    Locked(ModuleId),
    #[error("watch the video for module {0} before taking its quiz")]
    VideoRequired(ModuleId),
    #[error("module {0} is already passed; re-watch it to start over")]
    AlreadyPassed(ModuleId),
    #[error("module {module} needs a re-watch after {attempts} failed attempts")]
    StruckOut { module: ModuleId, attempts: u32 },
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error("could not load curriculum: {0}")]
    Catalog(#[source] StorageError),
    #[error("could not read progress: {0}")]
    GatewayRead(#[source] StorageError),
    #[error("could not save progress for module {module}: {source}")]
    GatewayWrite {
        module: ModuleId,
        #[source]
        source: StorageError,
    },
}

/// Errors emitted by `ReportService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportError {
    #[error("only HR may delete staff accounts")]
    Forbidden,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while loading `PortalConfig`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("database_url cannot be empty")]
    EmptyDatabaseUrl,
    #[error("invalid staff entry {email:?}: {reason}")]
    Staff { email: String, reason: String },
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
