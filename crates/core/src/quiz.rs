//! Quiz session state machine.
//!
//! `NotStarted -> InProgress(question_index) -> Finished(outcome)`.
//!
//! A session is ephemeral: dropping it mid-quiz leaves no trace in progress.
//! Only two transitions produce a [`ProgressPatch`]: [`QuizSession::start`]
//! clears the previous score, and the final answer records the outcome.

use thiserror::Error;

use crate::gating::{PASS_MARK, is_quiz_accessible, is_strike_out};
use crate::model::{ModuleId, ProgressPatch, ProgressRecord, Question, Score, TrainingModule};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    /// The module has no questions and can never be passed.
    #[error("module {0} has no quiz questions")]
    NoQuestions(ModuleId),

    #[error("the video must be watched before taking the quiz")]
    VideoRequired,

    #[error("quiz locked after {attempts} failed attempts; re-watch the video")]
    StruckOut { attempts: u32 },

    #[error("progress belongs to module {found}, quiz is for module {expected}")]
    ProgressMismatch { expected: ModuleId, found: ModuleId },

    #[error("quiz session has already started")]
    AlreadyStarted,

    #[error("quiz session has not started")]
    NotStarted,

    #[error("quiz session is finished")]
    Finished,

    #[error("no option selected")]
    NoSelection,

    #[error("option {selected} is out of range for {len} options")]
    InvalidOption { selected: usize, len: usize },
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Result of a completed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizOutcome {
    pub score: Score,
    pub passed: bool,
    pub correct: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    NotStarted,
    InProgress { question_index: usize },
    Finished(QuizOutcome),
}

/// What happened after an answer was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizStep {
    /// Moved on to the next question.
    Next { question_index: usize },
    /// Last question answered; `patch` must be written to the progress gateway.
    Finished {
        outcome: QuizOutcome,
        patch: ProgressPatch,
    },
}

/// One attempt at a module's quiz.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSession {
    module_id: ModuleId,
    questions: Vec<Question>,
    phase: QuizPhase,
    running_score: f64,
    correct: usize,
    selected_option: Option<usize>,
    attempts_before: u32,
}

impl QuizSession {
    /// Prepare a session for `module`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoQuestions` if the module is not completable.
    pub fn new(module: &TrainingModule) -> Result<Self, QuizError> {
        if !module.is_completable() {
            return Err(QuizError::NoQuestions(module.id()));
        }
        Ok(Self {
            module_id: module.id(),
            questions: module.questions().to_vec(),
            phase: QuizPhase::NotStarted,
            running_score: 0.0,
            correct: 0,
            selected_option: None,
            attempts_before: 0,
        })
    }

    /// Enter the quiz at question 0.
    ///
    /// Returns the patch that clears the stored score for the duration of the
    /// attempt.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::VideoRequired` or `QuizError::StruckOut` when the
    /// quiz is not accessible, `QuizError::ProgressMismatch` if `progress` is
    /// for another module, and `QuizError::AlreadyStarted` if called twice.
    pub fn start(&mut self, progress: &ProgressRecord) -> Result<ProgressPatch, QuizError> {
        if self.phase != QuizPhase::NotStarted {
            return Err(QuizError::AlreadyStarted);
        }
        if progress.module_id() != self.module_id {
            return Err(QuizError::ProgressMismatch {
                expected: self.module_id,
                found: progress.module_id(),
            });
        }
        if !is_quiz_accessible(progress) {
            if is_strike_out(progress) {
                return Err(QuizError::StruckOut {
                    attempts: progress.attempts(),
                });
            }
            return Err(QuizError::VideoRequired);
        }

        self.phase = QuizPhase::InProgress { question_index: 0 };
        self.running_score = 0.0;
        self.correct = 0;
        self.selected_option = None;
        self.attempts_before = progress.attempts();
        Ok(ProgressPatch::new().with_score(None))
    }

    /// Highlight an option on the current question without submitting it.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidOption` for an out-of-range option, or a
    /// phase error if no question is active.
    pub fn select_option(&mut self, option: usize) -> Result<(), QuizError> {
        let question = self.active_question()?;
        check_option(question, option)?;
        self.selected_option = Some(option);
        Ok(())
    }

    /// Submit the currently selected option.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoSelection` if nothing is selected, otherwise as
    /// [`QuizSession::submit_answer`].
    pub fn submit_selected(&mut self) -> Result<QuizStep, QuizError> {
        self.active_question()?;
        let selected = self.selected_option.ok_or(QuizError::NoSelection)?;
        self.submit_answer(selected)
    }

    /// Answer the current question and advance.
    ///
    /// Each correct answer is worth `100 / total` points. On the last question
    /// the session finishes with a rounded score and pass/fail verdict.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotStarted` / `QuizError::Finished` outside
    /// `InProgress`, or `QuizError::InvalidOption` for an out-of-range option.
    pub fn submit_answer(&mut self, selected: usize) -> Result<QuizStep, QuizError> {
        let question_index = match self.phase {
            QuizPhase::InProgress { question_index } => question_index,
            QuizPhase::NotStarted => return Err(QuizError::NotStarted),
            QuizPhase::Finished(_) => return Err(QuizError::Finished),
        };
        let question = &self.questions[question_index];
        check_option(question, selected)?;

        let total = self.questions.len();
        if question.is_correct(selected) {
            self.correct += 1;
            self.running_score += point_value(total);
        }
        self.selected_option = None;

        if question_index + 1 < total {
            let next = question_index + 1;
            self.phase = QuizPhase::InProgress {
                question_index: next,
            };
            return Ok(QuizStep::Next {
                question_index: next,
            });
        }

        let score = final_score(self.correct, total);
        let outcome = QuizOutcome {
            score,
            passed: score.value() >= PASS_MARK,
            correct: self.correct,
            total,
        };
        self.phase = QuizPhase::Finished(outcome);
        Ok(QuizStep::Finished {
            outcome,
            patch: outcome_patch(&outcome, self.attempts_before),
        })
    }

    #[must_use]
    pub fn module_id(&self) -> ModuleId {
        self.module_id
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn question_index(&self) -> Option<usize> {
        match self.phase {
            QuizPhase::InProgress { question_index } => Some(question_index),
            QuizPhase::NotStarted | QuizPhase::Finished(_) => None,
        }
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.question_index().map(|idx| &self.questions[idx])
    }

    #[must_use]
    pub fn selected_option(&self) -> Option<usize> {
        self.selected_option
    }

    /// Unrounded points collected so far.
    #[must_use]
    pub fn running_score(&self) -> f64 {
        self.running_score
    }

    #[must_use]
    pub fn outcome(&self) -> Option<QuizOutcome> {
        match self.phase {
            QuizPhase::Finished(outcome) => Some(outcome),
            QuizPhase::NotStarted | QuizPhase::InProgress { .. } => None,
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, QuizPhase::Finished(_))
    }

    fn active_question(&self) -> Result<&Question, QuizError> {
        match self.phase {
            QuizPhase::InProgress { question_index } => Ok(&self.questions[question_index]),
            QuizPhase::NotStarted => Err(QuizError::NotStarted),
            QuizPhase::Finished(_) => Err(QuizError::Finished),
        }
    }
}

fn check_option(question: &Question, option: usize) -> Result<(), QuizError> {
    let len = question.options().len();
    if option >= len {
        return Err(QuizError::InvalidOption {
            selected: option,
            len,
        });
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn point_value(total: usize) -> f64 {
    100.0 / total as f64
}

//
// ─── SCORING ───────────────────────────────────────────────────────────────────
//

/// `round(100 * correct / total)`, halves rounding up.
///
/// Computed in integers so that summing `100 / total` per correct answer can
/// not drift across a rounding boundary.
///
/// `correct` is clamped to `total`; `total == 0` scores 0.
#[must_use]
pub fn final_score(correct: usize, total: usize) -> Score {
    if total == 0 {
        return Score::saturating(0);
    }
    let correct = correct.min(total) as u64;
    let total = total as u64;
    let rounded = (200 * correct + total) / (2 * total);
    Score::saturating(u8::try_from(rounded).unwrap_or(u8::MAX))
}

/// Progress written when an attempt finishes.
///
/// A failed attempt adds one strike; a pass leaves `attempts` at its
/// pre-attempt value.
#[must_use]
pub fn outcome_patch(outcome: &QuizOutcome, attempts_before: u32) -> ProgressPatch {
    let attempts = if outcome.passed {
        attempts_before
    } else {
        attempts_before.saturating_add(1)
    };
    ProgressPatch::new()
        .with_score(Some(outcome.score))
        .with_passed(outcome.passed)
        .with_attempts(attempts)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
