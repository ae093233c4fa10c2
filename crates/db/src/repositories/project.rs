use chrono::{DateTime, Utc};

use cotiza_core::domain::project::{NewProject, Project, ProjectId, ProjectStatus};

use super::{get_column, ProjectRepository, RepositoryError};
use crate::DbPool;

pub struct SqlProjectRepository {
    pool: DbPool,
}

impl SqlProjectRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const PROJECT_COLUMNS: &str = "id, name, client_name, raw_requirements, status, created_at";

fn row_to_project(row: &sqlx::sqlite::SqliteRow) -> Result<Project, RepositoryError> {
    let status_str: String = get_column(row, "status")?;
    let status = ProjectStatus::parse(&status_str)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown project status `{status_str}`")))?;
    let created_at_str: String = get_column(row, "created_at")?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("created_at: {error}")))?;

    Ok(Project {
        id: ProjectId(get_column(row, "id")?),
        name: get_column(row, "name")?,
        client_name: get_column(row, "client_name")?,
        raw_requirements: get_column(row, "raw_requirements")?,
        status,
        created_at,
    })
}

#[async_trait::async_trait]
impl ProjectRepository for SqlProjectRepository {
    async fn create(&self, project: NewProject) -> Result<Project, RepositoryError> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO project (name, client_name, raw_requirements, status, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&project.name)
        .bind(&project.client_name)
        .bind(&project.raw_requirements)
        .bind(ProjectStatus::Draft.as_str())
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(Project {
            id: ProjectId(result.last_insert_rowid()),
            name: project.name,
            client_name: project.client_name,
            raw_requirements: project.raw_requirements,
            status: ProjectStatus::Draft,
            created_at,
        })
    }

    async fn find_by_id(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {PROJECT_COLUMNS} FROM project WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_project).transpose()
    }

    async fn list(&self) -> Result<Vec<Project>, RepositoryError> {
        let rows = sqlx::query(&format!("SELECT {PROJECT_COLUMNS} FROM project ORDER BY id ASC"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_project).collect()
    }

    async fn update(
        &self,
        id: ProjectId,
        project: NewProject,
    ) -> Result<Option<Project>, RepositoryError> {
        let result = sqlx::query(
            "UPDATE project SET name = ?, client_name = ?, raw_requirements = ? WHERE id = ?",
        )
        .bind(&project.name)
        .bind(&project.client_name)
        .bind(&project.raw_requirements)
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn update_status(
        &self,
        id: ProjectId,
        status: ProjectStatus,
    ) -> Result<Option<Project>, RepositoryError> {
        let result = sqlx::query("UPDATE project SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }
}
