use tracing::info;

use cotiza_core::cpq::RoleDirectory;
use cotiza_core::domain::role::{NewRole, Role, RoleId};
use cotiza_core::errors::{ApplicationError, DomainError};

use crate::repositories::Repositories;

#[derive(Clone)]
pub struct RoleService {
    repos: Repositories,
}

impl RoleService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn list(&self) -> Result<Vec<Role>, ApplicationError> {
        Ok(self.repos.roles.list().await?)
    }

    /// Snapshot of the catalog for rate and name lookups.
    pub async fn directory(&self) -> Result<RoleDirectory, ApplicationError> {
        Ok(RoleDirectory::new(self.repos.roles.list().await?))
    }

    pub async fn create(&self, role: NewRole) -> Result<Role, ApplicationError> {
        role.validate()?;
        self.ensure_name_available(&role.name, None).await?;

        let created = self.repos.roles.create(role).await?;
        info!(
            event_name = "catalog.role.created",
            role_id = %created.id,
            role_name = %created.name,
            "role created"
        );
        Ok(created)
    }

    /// Rate changes only affect items created afterwards; existing items keep
    /// their snapshot.
    pub async fn update(&self, id: RoleId, role: NewRole) -> Result<Role, ApplicationError> {
        role.validate()?;
        self.ensure_name_available(&role.name, Some(id)).await?;

        let updated = self
            .repos
            .roles
            .update(id, role)
            .await?
            .ok_or_else(|| ApplicationError::not_found("role", id))?;
        info!(event_name = "catalog.role.updated", role_id = %id, "role updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: RoleId) -> Result<(), ApplicationError> {
        if !self.repos.roles.delete(id).await? {
            return Err(ApplicationError::not_found("role", id));
        }
        info!(event_name = "catalog.role.deleted", role_id = %id, "role deleted");
        Ok(())
    }

    async fn ensure_name_available(
        &self,
        name: &str,
        current: Option<RoleId>,
    ) -> Result<(), ApplicationError> {
        match self.repos.roles.find_by_name(name).await? {
            Some(existing) if Some(existing.id) != current => {
                Err(DomainError::InvariantViolation(format!("role `{name}` already exists")).into())
            }
            _ => Ok(()),
        }
    }
}
