use onboard_core::model::{ModuleId, StaffRole, TrainingModule, ValidatedModule};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{
    MODULE_COLUMNS, conn, map_module_row, module_id_from_i64, module_id_to_i64,
    questions_to_json, ser,
};
use crate::repository::{ModuleRepository, StorageError};

#[async_trait::async_trait]
impl ModuleRepository for SqliteRepository {
    async fn insert_new_module(
        &self,
        module: ValidatedModule,
    ) -> Result<TrainingModule, StorageError> {
        let questions = questions_to_json(&module.questions)?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let next: i64 = sqlx::query(
            r"
            SELECT COALESCE(MAX(ordinal) + 1, 0) AS next_ordinal
            FROM modules WHERE role = ?1
            ",
        )
        .bind(module.role.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(conn)?
        .try_get("next_ordinal")
        .map_err(ser)?;
        let ordinal = u32::try_from(next)
            .map_err(|_| StorageError::Serialization(format!("invalid ordinal: {next}")))?;

        let res = sqlx::query(
            r"
            INSERT INTO modules (
                title, description, role, category, folder, video_url,
                transcript, questions, ordinal
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
        )
        .bind(&module.title)
        .bind(&module.description)
        .bind(module.role.as_str())
        .bind(module.category.as_str())
        .bind(module.folder.as_deref())
        .bind(module.video_url.as_str())
        .bind(&module.transcript)
        .bind(questions)
        .bind(next)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
            other => conn(other),
        })?;

        tx.commit().await.map_err(conn)?;

        let id = module_id_from_i64(res.last_insert_rowid())?;
        tracing::debug!(module_id = %id, ordinal, role = %module.role, "inserted module");
        Ok(module.assign(id, ordinal))
    }

    async fn get_module(&self, id: ModuleId) -> Result<Option<TrainingModule>, StorageError> {
        let sql = format!("SELECT {MODULE_COLUMNS} FROM modules WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(module_id_to_i64(id)?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_module_row).transpose()
    }

    async fn list_modules(&self, role: StaffRole) -> Result<Vec<TrainingModule>, StorageError> {
        let sql = format!(
            "SELECT {MODULE_COLUMNS} FROM modules WHERE role = ?1 ORDER BY ordinal ASC, id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(role.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_module_row).collect()
    }

    async fn list_all_modules(&self) -> Result<Vec<TrainingModule>, StorageError> {
        let sql = format!("SELECT {MODULE_COLUMNS} FROM modules ORDER BY ordinal ASC, id ASC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        let mut modules = rows
            .iter()
            .map(map_module_row)
            .collect::<Result<Vec<_>, _>>()?;
        // role is stored as text; order by the enum, not the string
        modules.sort_by_key(|m| (m.role(), m.ordinal(), m.id()));
        Ok(modules)
    }

    async fn delete_module(&self, id: ModuleId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM modules WHERE id = ?1")
            .bind(module_id_to_i64(id)?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        tracing::debug!(module_id = %id, "deleted module and its progress");
        Ok(())
    }
}
