#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog_service;
pub mod config;
pub mod error;
pub mod learner_service;
pub mod quiz_provider;
pub mod report_service;

pub use onboard_core::Clock;

pub use app_services::AppServices;
pub use catalog_service::CatalogService;
pub use config::{PortalConfig, StaffEntry};
pub use error::{
    AppServicesError, CatalogError, ConfigError, LearnerError, QuizProviderError, ReportError,
};
pub use learner_service::{CurriculumEntry, LearnerService};
pub use quiz_provider::{QuizContentProvider, SampleQuizProvider};
pub use report_service::{ReportRow, ReportService};
