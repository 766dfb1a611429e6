use chrono::{DateTime, Utc};
use onboard_core::model::{LearnerId, ModuleId, ProgressPatch, ProgressRecord};

use super::SqliteRepository;
use super::mapping::{conn, map_progress_row, module_id_to_i64};
use crate::repository::{ProgressRepository, StorageError};

const PROGRESS_COLUMNS: &str =
    "learner_id, module_id, video_watched, score, passed, attempts, updated_at";

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn read_progress(
        &self,
        learner: &LearnerId,
        module_id: ModuleId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let sql =
            format!("SELECT {PROGRESS_COLUMNS} FROM progress WHERE learner_id = ?1 AND module_id = ?2");
        let row = sqlx::query(&sql)
            .bind(learner.as_str())
            .bind(module_id_to_i64(module_id)?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn list_progress(
        &self,
        learner: &LearnerId,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM progress WHERE learner_id = ?1 ORDER BY module_id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(learner.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_progress_row).collect()
    }

    async fn list_all_progress(&self) -> Result<Vec<ProgressRecord>, StorageError> {
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM progress ORDER BY learner_id ASC, module_id ASC"
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_progress_row).collect()
    }

    async fn write_progress(
        &self,
        learner: &LearnerId,
        module_id: ModuleId,
        patch: &ProgressPatch,
        at: DateTime<Utc>,
    ) -> Result<ProgressRecord, StorageError> {
        let module_key = module_id_to_i64(module_id)?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let module_exists = sqlx::query("SELECT 1 FROM modules WHERE id = ?1")
            .bind(module_key)
            .fetch_optional(&mut *tx)
            .await
            .map_err(conn)?
            .is_some();
        if !module_exists {
            return Err(StorageError::NotFound);
        }

        let sql =
            format!("SELECT {PROGRESS_COLUMNS} FROM progress WHERE learner_id = ?1 AND module_id = ?2");
        let existing = sqlx::query(&sql)
            .bind(learner.as_str())
            .bind(module_key)
            .fetch_optional(&mut *tx)
            .await
            .map_err(conn)?
            .as_ref()
            .map(map_progress_row)
            .transpose()?;

        let merged = existing
            .unwrap_or_else(|| ProgressRecord::new(learner.clone(), module_id))
            .apply(patch)
            .touched(at);

        sqlx::query(
            r"
            INSERT INTO progress (
                learner_id, module_id, video_watched, score, passed, attempts, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(learner_id, module_id) DO UPDATE SET
                video_watched = excluded.video_watched,
                score = excluded.score,
                passed = excluded.passed,
                attempts = excluded.attempts,
                updated_at = excluded.updated_at
            ",
        )
        .bind(learner.as_str())
        .bind(module_key)
        .bind(i64::from(merged.video_watched()))
        .bind(merged.score().map(|s| i64::from(s.value())))
        .bind(i64::from(merged.passed()))
        .bind(i64::from(merged.attempts()))
        .bind(merged.updated_at())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        tx.commit().await.map_err(conn)?;
        tracing::debug!(
            learner = %learner,
            module_id = %module_id,
            video_watched = merged.video_watched(),
            passed = merged.passed(),
            attempts = merged.attempts(),
            "wrote progress"
        );
        Ok(merged)
    }

    async fn delete_learner_progress(&self, learner: &LearnerId) -> Result<u64, StorageError> {
        let res = sqlx::query("DELETE FROM progress WHERE learner_id = ?1")
            .bind(learner.as_str())
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(res.rows_affected())
    }
}
