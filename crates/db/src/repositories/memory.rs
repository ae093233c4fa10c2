use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use tokio::sync::RwLock;

use cotiza_core::domain::line_item::{sort_for_display, LineItem, LineItemId, NewLineItem};
use cotiza_core::domain::project::{NewProject, Project, ProjectId, ProjectStatus};
use cotiza_core::domain::quote::{FinancialParameters, Quote, QuoteId};
use cotiza_core::domain::role::{NewRole, Role, RoleId};
use cotiza_core::domain::setting::Setting;

use super::{
    LineItemRepository, ProjectRepository, QuoteRepository, RepositoryError, RoleRepository,
    SettingsRepository,
};

/// Hands out ids starting at 1, like SQLite's AUTOINCREMENT.
#[derive(Default)]
struct IdSequence(AtomicI64);

impl IdSequence {
    fn next(&self) -> i64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[derive(Default)]
pub struct InMemoryRoleRepository {
    ids: IdSequence,
    roles: RwLock<BTreeMap<RoleId, Role>>,
}

#[async_trait::async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn create(&self, role: NewRole) -> Result<Role, RepositoryError> {
        let mut roles = self.roles.write().await;
        if roles.values().any(|existing| existing.name == role.name) {
            return Err(RepositoryError::Conflict(format!("role `{}` already exists", role.name)));
        }
        let created =
            Role { id: RoleId(self.ids.next()), name: role.name, hourly_rate: role.hourly_rate };
        roles.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: RoleId) -> Result<Option<Role>, RepositoryError> {
        Ok(self.roles.read().await.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, RepositoryError> {
        Ok(self.roles.read().await.values().find(|role| role.name == name).cloned())
    }

    async fn list(&self) -> Result<Vec<Role>, RepositoryError> {
        Ok(self.roles.read().await.values().cloned().collect())
    }

    async fn update(&self, id: RoleId, role: NewRole) -> Result<Option<Role>, RepositoryError> {
        let mut roles = self.roles.write().await;
        let Some(existing) = roles.get_mut(&id) else {
            return Ok(None);
        };
        existing.name = role.name;
        existing.hourly_rate = role.hourly_rate;
        Ok(Some(existing.clone()))
    }

    async fn delete(&self, id: RoleId) -> Result<bool, RepositoryError> {
        Ok(self.roles.write().await.remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryProjectRepository {
    ids: IdSequence,
    projects: RwLock<BTreeMap<ProjectId, Project>>,
}

#[async_trait::async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    async fn create(&self, project: NewProject) -> Result<Project, RepositoryError> {
        let created = Project {
            id: ProjectId(self.ids.next()),
            name: project.name,
            client_name: project.client_name,
            raw_requirements: project.raw_requirements,
            status: ProjectStatus::Draft,
            created_at: Utc::now(),
        };
        self.projects.write().await.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError> {
        Ok(self.projects.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Project>, RepositoryError> {
        Ok(self.projects.read().await.values().cloned().collect())
    }

    async fn update(
        &self,
        id: ProjectId,
        project: NewProject,
    ) -> Result<Option<Project>, RepositoryError> {
        let mut projects = self.projects.write().await;
        let Some(existing) = projects.get_mut(&id) else {
            return Ok(None);
        };
        existing.name = project.name;
        existing.client_name = project.client_name;
        existing.raw_requirements = project.raw_requirements;
        Ok(Some(existing.clone()))
    }

    async fn update_status(
        &self,
        id: ProjectId,
        status: ProjectStatus,
    ) -> Result<Option<Project>, RepositoryError> {
        let mut projects = self.projects.write().await;
        let Some(existing) = projects.get_mut(&id) else {
            return Ok(None);
        };
        existing.status = status;
        Ok(Some(existing.clone()))
    }
}

#[derive(Default)]
pub struct InMemoryQuoteRepository {
    ids: IdSequence,
    quotes: RwLock<BTreeMap<QuoteId, Quote>>,
}

#[async_trait::async_trait]
impl QuoteRepository for InMemoryQuoteRepository {
    async fn create(
        &self,
        project_id: ProjectId,
        financials: FinancialParameters,
        ai_raw_input: Option<String>,
    ) -> Result<Quote, RepositoryError> {
        let created = Quote {
            id: QuoteId(self.ids.next()),
            project_id,
            applied_margin: financials.margin,
            applied_risk: financials.risk,
            applied_tax: financials.tax,
            ai_raw_input,
            created_at: Utc::now(),
        };
        self.quotes.write().await.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: QuoteId) -> Result<Option<Quote>, RepositoryError> {
        Ok(self.quotes.read().await.get(&id).cloned())
    }

    async fn list_for_project(&self, project_id: ProjectId) -> Result<Vec<Quote>, RepositoryError> {
        Ok(self
            .quotes
            .read()
            .await
            .values()
            .filter(|quote| quote.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn update_financials(
        &self,
        id: QuoteId,
        financials: FinancialParameters,
    ) -> Result<Option<Quote>, RepositoryError> {
        let mut quotes = self.quotes.write().await;
        let Some(existing) = quotes.get_mut(&id) else {
            return Ok(None);
        };
        existing.apply_financials(financials);
        Ok(Some(existing.clone()))
    }
}

#[derive(Default)]
pub struct InMemoryLineItemRepository {
    ids: IdSequence,
    items: RwLock<BTreeMap<LineItemId, LineItem>>,
}

#[async_trait::async_trait]
impl LineItemRepository for InMemoryLineItemRepository {
    async fn create(
        &self,
        quote_id: QuoteId,
        item: NewLineItem,
    ) -> Result<LineItem, RepositoryError> {
        let item = item.normalized();
        let created = LineItem {
            id: LineItemId(self.ids.next()),
            quote_id,
            role_id: item.role_id,
            description: item.description,
            manual_hours: item.manual_hours,
            hourly_rate: item.hourly_rate,
            ai_suggested_hours: item.ai_suggested_hours,
            sequence: item.sequence,
        };
        self.items.write().await.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: LineItemId) -> Result<Option<LineItem>, RepositoryError> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn list_for_quote(&self, quote_id: QuoteId) -> Result<Vec<LineItem>, RepositoryError> {
        let mut items: Vec<LineItem> = self
            .items
            .read()
            .await
            .values()
            .filter(|item| item.quote_id == quote_id)
            .cloned()
            .collect();
        sort_for_display(&mut items);
        Ok(items)
    }

    async fn update(
        &self,
        id: LineItemId,
        item: NewLineItem,
    ) -> Result<Option<LineItem>, RepositoryError> {
        let item = item.normalized();
        let mut items = self.items.write().await;
        let Some(existing) = items.get_mut(&id) else {
            return Ok(None);
        };
        existing.role_id = item.role_id;
        existing.description = item.description;
        existing.manual_hours = item.manual_hours;
        existing.hourly_rate = item.hourly_rate;
        existing.ai_suggested_hours = item.ai_suggested_hours;
        existing.sequence = item.sequence;
        Ok(Some(existing.clone()))
    }

    async fn delete(&self, id: LineItemId) -> Result<bool, RepositoryError> {
        Ok(self.items.write().await.remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct InMemorySettingsRepository {
    settings: RwLock<BTreeMap<String, Setting>>,
}

#[async_trait::async_trait]
impl SettingsRepository for InMemorySettingsRepository {
    async fn upsert(&self, setting: Setting) -> Result<Setting, RepositoryError> {
        self.settings.write().await.insert(setting.key.clone(), setting.clone());
        Ok(setting)
    }

    async fn find(&self, key: &str) -> Result<Option<Setting>, RepositoryError> {
        Ok(self.settings.read().await.get(key).cloned())
    }

    async fn list(&self) -> Result<Vec<Setting>, RepositoryError> {
        Ok(self.settings.read().await.values().cloned().collect())
    }
}
