use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::model::ids::ModuleId;
use crate::model::question::Question;
use crate::model::role::{ModuleCategory, StaffRole};

/// Folder that modules without an explicit folder are grouped under.
pub const DEFAULT_FOLDER: &str = "DEF Guidelines";

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModuleError {
    #[error("module title cannot be empty")]
    EmptyTitle,

    #[error("invalid video url: {0}")]
    InvalidVideoUrl(String),

    #[error("module has no quiz questions")]
    NoQuestions,
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Module as entered by an administrator, before validation and id assignment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub role: StaffRole,
    #[serde(default)]
    pub category: ModuleCategory,
    #[serde(default)]
    pub folder: Option<String>,
    pub video_url: String,
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl ModuleDraft {
    /// Validate authoring input.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::EmptyTitle`, `ModuleError::InvalidVideoUrl`, or
    /// `ModuleError::NoQuestions` when a quiz could never be completed.
    pub fn validate(self) -> Result<ValidatedModule, ModuleError> {
        let title = self.title.trim().to_owned();
        if title.is_empty() {
            return Err(ModuleError::EmptyTitle);
        }
        let video_url = Url::parse(self.video_url.trim())
            .map_err(|_| ModuleError::InvalidVideoUrl(self.video_url.clone()))?;
        if self.questions.is_empty() {
            return Err(ModuleError::NoQuestions);
        }

        Ok(ValidatedModule {
            title,
            description: self.description.trim().to_owned(),
            role: self.role,
            category: self.category,
            folder: normalize_folder(self.folder),
            video_url,
            transcript: self.transcript,
            questions: self.questions,
        })
    }
}

/// A validated module still waiting for its id and ordinal from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedModule {
    pub title: String,
    pub description: String,
    pub role: StaffRole,
    pub category: ModuleCategory,
    pub folder: Option<String>,
    pub video_url: Url,
    pub transcript: String,
    pub questions: Vec<Question>,
}

impl ValidatedModule {
    #[must_use]
    pub fn assign(self, id: ModuleId, ordinal: u32) -> TrainingModule {
        TrainingModule {
            id,
            title: self.title,
            description: self.description,
            role: self.role,
            category: self.category,
            folder: self.folder,
            video_url: self.video_url,
            transcript: self.transcript,
            questions: self.questions,
            ordinal,
        }
    }
}

//
// ─── MODULE ────────────────────────────────────────────────────────────────────
//

/// One unit of training: a video followed by a quiz, scoped to a role.
///
/// `ordinal` is the module's position in its role's curriculum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingModule {
    id: ModuleId,
    title: String,
    description: String,
    role: StaffRole,
    category: ModuleCategory,
    folder: Option<String>,
    video_url: Url,
    transcript: String,
    questions: Vec<Question>,
    ordinal: u32,
}

impl TrainingModule {
    /// Rehydrate a module from storage.
    ///
    /// Unlike [`ModuleDraft::validate`] this accepts an empty question list,
    /// since a catalog may hold modules whose quiz was never authored. Such a
    /// module is not completable and is refused at quiz entry.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError` if the title or video url are invalid.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: ModuleId,
        title: String,
        description: String,
        role: StaffRole,
        category: ModuleCategory,
        folder: Option<String>,
        video_url: &str,
        transcript: String,
        questions: Vec<Question>,
        ordinal: u32,
    ) -> Result<Self, ModuleError> {
        if title.trim().is_empty() {
            return Err(ModuleError::EmptyTitle);
        }
        let video_url =
            Url::parse(video_url).map_err(|_| ModuleError::InvalidVideoUrl(video_url.into()))?;
        Ok(Self {
            id,
            title,
            description,
            role,
            category,
            folder: normalize_folder(folder),
            video_url,
            transcript,
            questions,
            ordinal,
        })
    }

    #[must_use]
    pub fn id(&self) -> ModuleId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn role(&self) -> StaffRole {
        self.role
    }

    #[must_use]
    pub fn category(&self) -> ModuleCategory {
        self.category
    }

    /// Explicit folder, if one was set.
    #[must_use]
    pub fn folder(&self) -> Option<&str> {
        self.folder.as_deref()
    }

    /// Folder used for grouping, falling back to [`DEFAULT_FOLDER`].
    #[must_use]
    pub fn folder_name(&self) -> &str {
        self.folder.as_deref().unwrap_or(DEFAULT_FOLDER)
    }

    #[must_use]
    pub fn video_url(&self) -> &Url {
        &self.video_url
    }

    #[must_use]
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    /// A module can only be passed if it has at least one question.
    #[must_use]
    pub fn is_completable(&self) -> bool {
        !self.questions.is_empty()
    }
}

/// Filter `modules` to `role` and sort them into curriculum order.
///
/// Ties on `ordinal` are broken by id so the order is total.
#[must_use]
pub fn curriculum_for_role(modules: &[TrainingModule], role: StaffRole) -> Vec<TrainingModule> {
    let mut selected: Vec<TrainingModule> =
        modules.iter().filter(|m| m.role == role).cloned().collect();
    selected.sort_by_key(|m| (m.ordinal, m.id));
    selected
}

fn normalize_folder(folder: Option<String>) -> Option<String> {
    folder
        .map(|f| f.trim().to_owned())
        .filter(|f| !f.is_empty())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
