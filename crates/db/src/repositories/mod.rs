use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::Row;
use thiserror::Error;

use cotiza_core::domain::line_item::{LineItem, LineItemId, NewLineItem};
use cotiza_core::domain::project::{NewProject, Project, ProjectId, ProjectStatus};
use cotiza_core::domain::quote::{FinancialParameters, Quote, QuoteId};
use cotiza_core::domain::role::{NewRole, Role, RoleId};
use cotiza_core::domain::setting::Setting;
use cotiza_core::errors::{ApplicationError, DomainError};

use crate::DbPool;

pub mod line_item;
pub mod memory;
pub mod project;
pub mod quote;
pub mod role;
pub mod setting;

pub use line_item::SqlLineItemRepository;
pub use memory::{
    InMemoryLineItemRepository, InMemoryProjectRepository, InMemoryQuoteRepository,
    InMemoryRoleRepository, InMemorySettingsRepository,
};
pub use project::SqlProjectRepository;
pub use quote::SqlQuoteRepository;
pub use role::SqlRoleRepository;
pub use setting::SqlSettingsRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Conflict(message) => {
                ApplicationError::Domain(DomainError::InvariantViolation(message))
            }
            other => ApplicationError::Persistence(other.to_string()),
        }
    }
}

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn create(&self, role: NewRole) -> Result<Role, RepositoryError>;
    async fn find_by_id(&self, id: RoleId) -> Result<Option<Role>, RepositoryError>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, RepositoryError>;
    async fn list(&self) -> Result<Vec<Role>, RepositoryError>;
    async fn update(&self, id: RoleId, role: NewRole) -> Result<Option<Role>, RepositoryError>;
    async fn delete(&self, id: RoleId) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn create(&self, project: NewProject) -> Result<Project, RepositoryError>;
    async fn find_by_id(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError>;
    async fn list(&self) -> Result<Vec<Project>, RepositoryError>;
    async fn update(
        &self,
        id: ProjectId,
        project: NewProject,
    ) -> Result<Option<Project>, RepositoryError>;
    async fn update_status(
        &self,
        id: ProjectId,
        status: ProjectStatus,
    ) -> Result<Option<Project>, RepositoryError>;
}

#[async_trait]
pub trait QuoteRepository: Send + Sync {
    async fn create(
        &self,
        project_id: ProjectId,
        financials: FinancialParameters,
        ai_raw_input: Option<String>,
    ) -> Result<Quote, RepositoryError>;
    async fn find_by_id(&self, id: QuoteId) -> Result<Option<Quote>, RepositoryError>;
    async fn list_for_project(&self, project_id: ProjectId) -> Result<Vec<Quote>, RepositoryError>;
    async fn update_financials(
        &self,
        id: QuoteId,
        financials: FinancialParameters,
    ) -> Result<Option<Quote>, RepositoryError>;
}

#[async_trait]
pub trait LineItemRepository: Send + Sync {
    async fn create(&self, quote_id: QuoteId, item: NewLineItem)
        -> Result<LineItem, RepositoryError>;
    async fn find_by_id(&self, id: LineItemId) -> Result<Option<LineItem>, RepositoryError>;
    /// Items of a quote in display order (sequence, then id).
    async fn list_for_quote(&self, quote_id: QuoteId) -> Result<Vec<LineItem>, RepositoryError>;
    async fn update(
        &self,
        id: LineItemId,
        item: NewLineItem,
    ) -> Result<Option<LineItem>, RepositoryError>;
    async fn delete(&self, id: LineItemId) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn upsert(&self, setting: Setting) -> Result<Setting, RepositoryError>;
    async fn find(&self, key: &str) -> Result<Option<Setting>, RepositoryError>;
    async fn list(&self) -> Result<Vec<Setting>, RepositoryError>;
}

/// The record store as a set of per-entity repositories.
#[derive(Clone)]
pub struct Repositories {
    pub roles: Arc<dyn RoleRepository>,
    pub projects: Arc<dyn ProjectRepository>,
    pub quotes: Arc<dyn QuoteRepository>,
    pub line_items: Arc<dyn LineItemRepository>,
    pub settings: Arc<dyn SettingsRepository>,
}

impl Repositories {
    pub fn sql(pool: DbPool) -> Self {
        Self {
            roles: Arc::new(SqlRoleRepository::new(pool.clone())),
            projects: Arc::new(SqlProjectRepository::new(pool.clone())),
            quotes: Arc::new(SqlQuoteRepository::new(pool.clone())),
            line_items: Arc::new(SqlLineItemRepository::new(pool.clone())),
            settings: Arc::new(SqlSettingsRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            roles: Arc::new(InMemoryRoleRepository::default()),
            projects: Arc::new(InMemoryProjectRepository::default()),
            quotes: Arc::new(InMemoryQuoteRepository::default()),
            line_items: Arc::new(InMemoryLineItemRepository::default()),
            settings: Arc::new(InMemorySettingsRepository::default()),
        }
    }
}

fn decode_err(error: impl ToString) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}

pub(crate) fn get_decimal(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Decimal, RepositoryError> {
    let raw: String = row.try_get(column).map_err(decode_err)?;
    Decimal::from_str(raw.trim())
        .map_err(|error| RepositoryError::Decode(format!("column `{column}`: {error}")))
}

pub(crate) fn get_optional_decimal(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Option<Decimal>, RepositoryError> {
    let raw: Option<String> = row.try_get(column).map_err(decode_err)?;
    raw.map(|value| {
        Decimal::from_str(value.trim())
            .map_err(|error| RepositoryError::Decode(format!("column `{column}`: {error}")))
    })
    .transpose()
}

pub(crate) fn get_column<'r, T>(
    row: &'r sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column).map_err(decode_err)
}
