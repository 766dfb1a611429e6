mod ids;
mod module;
mod progress;
mod question;
mod role;
mod staff;

pub use ids::{LearnerId, ModuleId, ParseIdError};
pub use module::{
    DEFAULT_FOLDER, ModuleDraft, ModuleError, TrainingModule, ValidatedModule,
    curriculum_for_role,
};
pub use progress::{MAX_SCORE, ProgressError, ProgressPatch, ProgressRecord, Score};
pub use question::{Question, QuestionDraft, QuestionError};
pub use role::{AccountType, AdminScope, ModuleCategory, RoleError, StaffRole};
pub use staff::StaffMember;
