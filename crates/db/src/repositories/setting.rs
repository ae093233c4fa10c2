use cotiza_core::domain::setting::Setting;

use super::{get_column, get_optional_decimal, RepositoryError, SettingsRepository};
use crate::DbPool;

pub struct SqlSettingsRepository {
    pool: DbPool,
}

impl SqlSettingsRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_setting(row: &sqlx::sqlite::SqliteRow) -> Result<Setting, RepositoryError> {
    Ok(Setting {
        key: get_column(row, "key")?,
        value_text: get_column(row, "value_text")?,
        value_float: get_optional_decimal(row, "value_float")?,
    })
}

#[async_trait::async_trait]
impl SettingsRepository for SqlSettingsRepository {
    async fn upsert(&self, setting: Setting) -> Result<Setting, RepositoryError> {
        sqlx::query(
            "INSERT INTO system_config (key, value_text, value_float) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET
                value_text = excluded.value_text,
                value_float = excluded.value_float",
        )
        .bind(&setting.key)
        .bind(setting.value_text.as_deref())
        .bind(setting.value_float.map(|value| value.to_string()))
        .execute(&self.pool)
        .await?;

        Ok(setting)
    }

    async fn find(&self, key: &str) -> Result<Option<Setting>, RepositoryError> {
        let row = sqlx::query("SELECT key, value_text, value_float FROM system_config WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_setting).transpose()
    }

    async fn list(&self) -> Result<Vec<Setting>, RepositoryError> {
        let rows = sqlx::query("SELECT key, value_text, value_float FROM system_config ORDER BY key")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_setting).collect()
    }
}
