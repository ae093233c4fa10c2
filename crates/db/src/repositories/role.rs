use cotiza_core::domain::role::{NewRole, Role, RoleId};

use super::{get_column, get_decimal, RepositoryError, RoleRepository};
use crate::DbPool;

pub struct SqlRoleRepository {
    pool: DbPool,
}

impl SqlRoleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_role(row: &sqlx::sqlite::SqliteRow) -> Result<Role, RepositoryError> {
    Ok(Role {
        id: RoleId(get_column(row, "id")?),
        name: get_column(row, "name")?,
        hourly_rate: get_decimal(row, "hourly_rate")?,
    })
}

#[async_trait::async_trait]
impl RoleRepository for SqlRoleRepository {
    async fn create(&self, role: NewRole) -> Result<Role, RepositoryError> {
        let result = sqlx::query("INSERT INTO role (name, hourly_rate) VALUES (?, ?)")
            .bind(&role.name)
            .bind(role.hourly_rate.to_string())
            .execute(&self.pool)
            .await?;

        Ok(Role { id: RoleId(result.last_insert_rowid()), name: role.name, hourly_rate: role.hourly_rate })
    }

    async fn find_by_id(&self, id: RoleId) -> Result<Option<Role>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, hourly_rate FROM role WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_role).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, hourly_rate FROM role WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_role).transpose()
    }

    async fn list(&self) -> Result<Vec<Role>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name, hourly_rate FROM role ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_role).collect()
    }

    async fn update(&self, id: RoleId, role: NewRole) -> Result<Option<Role>, RepositoryError> {
        let result = sqlx::query("UPDATE role SET name = ?, hourly_rate = ? WHERE id = ?")
            .bind(&role.name)
            .bind(role.hourly_rate.to_string())
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(Role { id, name: role.name, hourly_rate: role.hourly_rate }))
    }

    async fn delete(&self, id: RoleId) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM role WHERE id = ?").bind(id.0).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
