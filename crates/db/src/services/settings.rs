use tracing::info;

use cotiza_core::domain::quote::FinancialParameters;
use cotiza_core::domain::setting::{financial_defaults, Setting};
use cotiza_core::errors::{ApplicationError, DomainError};

use crate::repositories::Repositories;

#[derive(Clone)]
pub struct SettingsService {
    repos: Repositories,
}

impl SettingsService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn list(&self) -> Result<Vec<Setting>, ApplicationError> {
        Ok(self.repos.settings.list().await?)
    }

    pub async fn upsert(&self, setting: Setting) -> Result<Setting, ApplicationError> {
        if setting.key.trim().is_empty() {
            return Err(DomainError::InvariantViolation(
                "setting key must not be empty".to_string(),
            )
            .into());
        }
        let stored = self.repos.settings.upsert(setting).await?;
        info!(event_name = "config.setting.saved", key = %stored.key, "setting saved");
        Ok(stored)
    }

    /// Defaults applied to new quotes that omit margin, risk or tax.
    pub async fn financial_defaults(&self) -> Result<FinancialParameters, ApplicationError> {
        Ok(financial_defaults(&self.repos.settings.list().await?))
    }
}
