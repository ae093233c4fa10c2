use tracing::info;

use cotiza_core::domain::project::{NewProject, Project, ProjectId};
use cotiza_core::errors::ApplicationError;

use crate::repositories::Repositories;

#[derive(Clone)]
pub struct ProjectService {
    repos: Repositories,
}

impl ProjectService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn list(&self) -> Result<Vec<Project>, ApplicationError> {
        Ok(self.repos.projects.list().await?)
    }

    pub async fn get(&self, id: ProjectId) -> Result<Project, ApplicationError> {
        self.repos
            .projects
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("project", id))
    }

    pub async fn create(&self, project: NewProject) -> Result<Project, ApplicationError> {
        project.validate()?;
        let created = self.repos.projects.create(project).await?;
        info!(
            event_name = "project.created",
            project_id = %created.id,
            client_name = %created.client_name,
            "project created"
        );
        Ok(created)
    }

    pub async fn update(
        &self,
        id: ProjectId,
        project: NewProject,
    ) -> Result<Project, ApplicationError> {
        project.validate()?;
        self.repos
            .projects
            .update(id, project)
            .await?
            .ok_or_else(|| ApplicationError::not_found("project", id))
    }

    /// Moves a draft project to sent. Already sent projects are returned unchanged.
    pub async fn finalize(&self, id: ProjectId) -> Result<Project, ApplicationError> {
        let mut project = self.get(id).await?;
        let previous = project.status;
        project.finalize()?;
        if project.status == previous {
            return Ok(project);
        }

        let updated = self
            .repos
            .projects
            .update_status(id, project.status)
            .await?
            .ok_or_else(|| ApplicationError::not_found("project", id))?;
        info!(event_name = "project.finalized", project_id = %id, "project marked as sent");
        Ok(updated)
    }
}
