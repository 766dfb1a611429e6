use onboard_core::model::{
    LearnerId, ModuleCategory, ModuleId, ProgressRecord, Question, StaffRole, TrainingModule,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn module_id_to_i64(id: ModuleId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("module_id overflow".into()))
}

pub(crate) fn module_id_from_i64(v: i64) -> Result<ModuleId, StorageError> {
    u64::try_from(v)
        .map(ModuleId::new)
        .map_err(|_| StorageError::Serialization("module_id sign overflow".into()))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn questions_to_json(questions: &[Question]) -> Result<String, StorageError> {
    serde_json::to_string(questions).map_err(ser)
}

/// Deserializing re-validates every question.
fn questions_from_json(raw: &str) -> Result<Vec<Question>, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) const MODULE_COLUMNS: &str =
    "id, title, description, role, category, folder, video_url, transcript, questions, ordinal";

pub(crate) fn map_module_row(row: &SqliteRow) -> Result<TrainingModule, StorageError> {
    let role: StaffRole = row
        .try_get::<String, _>("role")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let category: ModuleCategory = row
        .try_get::<String, _>("category")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let questions = questions_from_json(&row.try_get::<String, _>("questions").map_err(ser)?)?;
    let video_url: String = row.try_get("video_url").map_err(ser)?;

    TrainingModule::from_persisted(
        module_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get("title").map_err(ser)?,
        row.try_get("description").map_err(ser)?,
        role,
        category,
        row.try_get("folder").map_err(ser)?,
        &video_url,
        row.try_get("transcript").map_err(ser)?,
        questions,
        u32_from_i64("ordinal", row.try_get::<i64, _>("ordinal").map_err(ser)?)?,
    )
    .map_err(ser)
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<ProgressRecord, StorageError> {
    let learner_id =
        LearnerId::new(row.try_get::<String, _>("learner_id").map_err(ser)?).map_err(ser)?;
    let score = row
        .try_get::<Option<i64>, _>("score")
        .map_err(ser)?
        .map(|s| {
            u8::try_from(s).map_err(|_| StorageError::Serialization(format!("invalid score: {s}")))
        })
        .transpose()?;

    ProgressRecord::from_persisted(
        learner_id,
        module_id_from_i64(row.try_get::<i64, _>("module_id").map_err(ser)?)?,
        row.try_get::<i64, _>("video_watched").map_err(ser)? != 0,
        score,
        row.try_get::<i64, _>("passed").map_err(ser)? != 0,
        u32_from_i64("attempts", row.try_get::<i64, _>("attempts").map_err(ser)?)?,
        row.try_get("updated_at").map_err(ser)?,
    )
    .map_err(ser)
}
