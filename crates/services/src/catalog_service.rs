use std::collections::BTreeMap;
use std::sync::Arc;

use onboard_core::model::{ModuleDraft, ModuleId, Question, StaffRole, TrainingModule};
use storage::repository::ModuleRepository;

use crate::error::CatalogError;
use crate::quiz_provider::{QuizContentProvider, transcript_excerpt};

/// Curriculum management for administrators.
#[derive(Clone)]
pub struct CatalogService {
    modules: Arc<dyn ModuleRepository>,
    quiz_provider: Arc<dyn QuizContentProvider>,
}

impl CatalogService {
    #[must_use]
    pub fn new(
        modules: Arc<dyn ModuleRepository>,
        quiz_provider: Arc<dyn QuizContentProvider>,
    ) -> Self {
        Self {
            modules,
            quiz_provider,
        }
    }

    /// Modules of `role` in curriculum order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if repository access fails.
    pub async fn list_modules(&self, role: StaffRole) -> Result<Vec<TrainingModule>, CatalogError> {
        Ok(self.modules.list_modules(role).await?)
    }

    /// Every module, grouped by role and then curriculum order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if repository access fails.
    pub async fn list_all_modules(&self) -> Result<Vec<TrainingModule>, CatalogError> {
        Ok(self.modules.list_all_modules().await?)
    }

    /// Modules of `role` keyed by folder name.
    ///
    /// Folder names are sorted; each folder keeps curriculum order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if repository access fails.
    pub async fn folders(
        &self,
        role: StaffRole,
    ) -> Result<BTreeMap<String, Vec<TrainingModule>>, CatalogError> {
        let mut folders: BTreeMap<String, Vec<TrainingModule>> = BTreeMap::new();
        for module in self.modules.list_modules(role).await? {
            folders
                .entry(module.folder_name().to_owned())
                .or_default()
                .push(module);
        }
        Ok(folders)
    }

    /// Validate and persist a new module at the end of its role's curriculum.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Module` for invalid drafts, including drafts
    /// without questions. Returns `CatalogError::Storage` if persistence fails.
    pub async fn add_module(&self, draft: ModuleDraft) -> Result<TrainingModule, CatalogError> {
        let validated = draft.validate()?;
        let module = self.modules.insert_new_module(validated).await?;
        tracing::info!(
            module_id = %module.id(),
            role = %module.role(),
            ordinal = module.ordinal(),
            title = module.title(),
            "module added"
        );
        Ok(module)
    }

    /// Delete a module together with every learner's progress on it.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` (`NotFound` for an unknown id).
    pub async fn delete_module(&self, id: ModuleId) -> Result<(), CatalogError> {
        self.modules.delete_module(id).await?;
        tracing::info!(module_id = %id, "module deleted");
        Ok(())
    }

    /// Delete every module in `folder`, optionally restricted to one role.
    ///
    /// Modules without an explicit folder belong to the default folder.
    /// Returns the number of modules removed.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if repository access fails.
    pub async fn delete_folder(
        &self,
        folder: &str,
        role: Option<StaffRole>,
    ) -> Result<usize, CatalogError> {
        let folder = folder.trim();
        let targets: Vec<ModuleId> = self
            .modules
            .list_all_modules()
            .await?
            .iter()
            .filter(|m| m.folder_name() == folder && role.is_none_or(|r| m.role() == r))
            .map(TrainingModule::id)
            .collect();

        for id in &targets {
            self.modules.delete_module(*id).await?;
        }
        tracing::info!(folder, removed = targets.len(), "folder deleted");
        Ok(targets.len())
    }

    /// Ask the quiz provider for questions and validate them.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Provider` if generation fails,
    /// `CatalogError::NothingGenerated` for an empty quiz, and
    /// `CatalogError::GeneratedQuestion` for the first invalid question.
    pub async fn generate_questions(
        &self,
        transcript: &str,
        role: StaffRole,
    ) -> Result<Vec<Question>, CatalogError> {
        let drafts = self
            .quiz_provider
            .generate(transcript_excerpt(transcript), role)
            .await?;
        if drafts.is_empty() {
            return Err(CatalogError::NothingGenerated);
        }
        drafts
            .into_iter()
            .enumerate()
            .map(|(index, draft)| {
                draft
                    .validate()
                    .map_err(|source| CatalogError::GeneratedQuestion { index, source })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use onboard_core::model::{DEFAULT_FOLDER, ModuleCategory, ModuleError, QuestionDraft};
    use storage::repository::InMemoryRepository;

    use crate::error::QuizProviderError;
    use crate::quiz_provider::SampleQuizProvider;

    fn draft(title: &str, role: StaffRole, folder: Option<&str>) -> ModuleDraft {
        ModuleDraft {
            title: title.into(),
            description: String::new(),
            role,
            category: ModuleCategory::New,
            folder: folder.map(str::to_owned),
            video_url: "https://youtu.be/abc".into(),
            transcript: String::new(),
            questions: vec![Question::new("Q", vec!["A".into(), "B".into()], 0).unwrap()],
        }
    }

    fn service() -> CatalogService {
        CatalogService::new(
            Arc::new(InMemoryRepository::new()),
            Arc::new(SampleQuizProvider),
        )
    }

    struct BrokenProvider;

    #[async_trait::async_trait]
    impl QuizContentProvider for BrokenProvider {
        async fn generate(
            &self,
            _transcript: &str,
            _role: StaffRole,
        ) -> Result<Vec<QuestionDraft>, QuizProviderError> {
            Ok(vec![QuestionDraft {
                text: "Which exit?".into(),
                options: vec!["North".into(), "South".into()],
                correct_answer_index: 4,
            }])
        }
    }

    #[tokio::test]
    async fn add_module_rejects_empty_quiz() {
        let service = service();
        let mut d = draft("Empty", StaffRole::Teacher, None);
        d.questions.clear();
        let err = service.add_module(d).await.unwrap_err();
        assert!(matches!(err, CatalogError::Module(ModuleError::NoQuestions)));
        assert!(service.list_all_modules().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn folders_group_by_name_with_default() {
        let service = service();
        service
            .add_module(draft("A", StaffRole::Teacher, Some("Safety")))
            .await
            .unwrap();
        service
            .add_module(draft("B", StaffRole::Teacher, None))
            .await
            .unwrap();
        service
            .add_module(draft("C", StaffRole::Teacher, Some("Safety")))
            .await
            .unwrap();

        let folders = service.folders(StaffRole::Teacher).await.unwrap();
        let names: Vec<&str> = folders.keys().map(String::as_str).collect();
        assert_eq!(names, vec![DEFAULT_FOLDER, "Safety"]);
        let safety: Vec<&str> = folders["Safety"].iter().map(TrainingModule::title).collect();
        assert_eq!(safety, vec!["A", "C"]);
    }

    #[tokio::test]
    async fn delete_folder_respects_role_filter() {
        let service = service();
        service
            .add_module(draft("T", StaffRole::Teacher, Some("Safety")))
            .await
            .unwrap();
        service
            .add_module(draft("S", StaffRole::Security, Some("Safety")))
            .await
            .unwrap();
        service
            .add_module(draft("D", StaffRole::Teacher, None))
            .await
            .unwrap();

        let removed = service
            .delete_folder("Safety", Some(StaffRole::Teacher))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(service.list_modules(StaffRole::Security).await.unwrap().len(), 1);

        let removed = service.delete_folder(DEFAULT_FOLDER, None).await.unwrap();
        assert_eq!(removed, 1);
        assert!(service.list_modules(StaffRole::Teacher).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn generated_questions_are_validated() {
        let questions = service()
            .generate_questions("transcript", StaffRole::Security)
            .await
            .unwrap();
        assert_eq!(questions.len(), 2);

        let broken = CatalogService::new(
            Arc::new(InMemoryRepository::new()),
            Arc::new(BrokenProvider),
        );
        let err = broken
            .generate_questions("transcript", StaffRole::Security)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::GeneratedQuestion { index: 0, .. }));
    }
}
