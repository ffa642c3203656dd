use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use crate::repository::{IdentityRepository, StorageError};
use classroom_core::model::Identity;

use super::SqliteRepository;

#[async_trait]
impl IdentityRepository for SqliteRepository {
    async fn get_identity(&self) -> Result<Option<Identity>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT student_name, class_group
            FROM identity
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let student_name: String = row
            .try_get("student_name")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        let class_group: String = row
            .try_get("class_group")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;

        Identity::from_persisted(student_name, class_group)
            .map(Some)
            .map_err(|err| StorageError::Serialization(err.to_string()))
    }

    async fn save_identity(&self, identity: &Identity) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO identity (id, student_name, class_group, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                student_name = excluded.student_name,
                class_group = excluded.class_group,
                updated_at = excluded.updated_at
            ",
        )
        .bind(1_i64)
        .bind(identity.student_name())
        .bind(identity.class_group())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }

    async fn clear_identity(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM identity WHERE id = 1")
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }
}
