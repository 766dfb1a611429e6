//! Source of quiz questions at authoring time.

use onboard_core::model::{QuestionDraft, StaffRole};

use crate::error::QuizProviderError;

/// Longest transcript excerpt handed to a generator.
pub const MAX_TRANSCRIPT_CHARS: usize = 5000;

/// Produces candidate questions for a module from its transcript.
///
/// Output is untrusted: `CatalogService` validates every draft before it
/// reaches a module.
#[async_trait::async_trait]
pub trait QuizContentProvider: Send + Sync {
    /// # Errors
    ///
    /// Returns `QuizProviderError` when the generator cannot produce a quiz.
    async fn generate(
        &self,
        transcript: &str,
        role: StaffRole,
    ) -> Result<Vec<QuestionDraft>, QuizProviderError>;
}

/// Placeholder quiz used when no generator is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleQuizProvider;

#[async_trait::async_trait]
impl QuizContentProvider for SampleQuizProvider {
    async fn generate(
        &self,
        _transcript: &str,
        role: StaffRole,
    ) -> Result<Vec<QuestionDraft>, QuizProviderError> {
        tracing::warn!(%role, "no quiz generator configured, returning sample quiz");
        let options = || ["A", "B", "C", "D"].map(String::from).to_vec();
        Ok(vec![
            QuestionDraft {
                text: "Sample Question 1 (AI Unavailable)".into(),
                options: options(),
                correct_answer_index: 0,
            },
            QuestionDraft {
                text: "Sample Question 2 (AI Unavailable)".into(),
                options: options(),
                correct_answer_index: 1,
            },
        ])
    }
}

/// Cut `transcript` to at most [`MAX_TRANSCRIPT_CHARS`] characters.
#[must_use]
pub fn transcript_excerpt(transcript: &str) -> &str {
    match transcript.char_indices().nth(MAX_TRANSCRIPT_CHARS) {
        Some((end, _)) => &transcript[..end],
        None => transcript,
    }
}
