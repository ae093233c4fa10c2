use tracing::info;

use cotiza_core::cpq::RoleDirectory;
use cotiza_core::domain::line_item::{LineItem, LineItemId, LineItemInput};
use cotiza_core::domain::quote::{FinancialParameters, NewQuote, Quote, QuoteId};
use cotiza_core::domain::setting::financial_defaults;
use cotiza_core::errors::ApplicationError;

use crate::repositories::Repositories;

#[derive(Clone)]
pub struct QuoteService {
    repos: Repositories,
}

impl QuoteService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Creates an empty quote for an existing project. Omitted financial
    /// parameters are taken from the stored defaults.
    pub async fn create(&self, new_quote: NewQuote) -> Result<Quote, ApplicationError> {
        if self.repos.projects.find_by_id(new_quote.project_id).await?.is_none() {
            return Err(ApplicationError::not_found("project", new_quote.project_id));
        }

        let defaults = financial_defaults(&self.repos.settings.list().await?);
        let financials = new_quote.resolve_financials(defaults);
        let quote = self
            .repos
            .quotes
            .create(new_quote.project_id, financials, new_quote.ai_raw_input)
            .await?;

        info!(
            event_name = "quote.created",
            quote_id = %quote.id,
            project_id = %quote.project_id,
            "quote created"
        );
        Ok(quote)
    }

    pub async fn get(&self, id: QuoteId) -> Result<Quote, ApplicationError> {
        self.repos.quotes.find_by_id(id).await?.ok_or_else(|| ApplicationError::not_found("quote", id))
    }

    pub async fn update_financials(
        &self,
        id: QuoteId,
        financials: FinancialParameters,
    ) -> Result<Quote, ApplicationError> {
        let quote = self
            .repos
            .quotes
            .update_financials(id, financials)
            .await?
            .ok_or_else(|| ApplicationError::not_found("quote", id))?;
        info!(event_name = "quote.financials.updated", quote_id = %id, "quote financials updated");
        Ok(quote)
    }

    pub async fn list_items(&self, quote_id: QuoteId) -> Result<Vec<LineItem>, ApplicationError> {
        self.get(quote_id).await?;
        Ok(self.repos.line_items.list_for_quote(quote_id).await?)
    }

    /// Adds a manual item. Items without an explicit sequence go to the end.
    pub async fn add_item(
        &self,
        quote_id: QuoteId,
        input: LineItemInput,
    ) -> Result<LineItem, ApplicationError> {
        self.get(quote_id).await?;
        let next_sequence = self.repos.line_items.list_for_quote(quote_id).await?.len() as i64;
        let item = input.resolve(&self.directory().await?, next_sequence)?;

        let created = self.repos.line_items.create(quote_id, item).await?;
        info!(
            event_name = "quote.item.added",
            quote_id = %quote_id,
            item_id = %created.id,
            "line item added"
        );
        Ok(created)
    }

    /// Replaces an item's fields. An omitted rate is re-snapshotted from the
    /// current catalog; an omitted sequence keeps the item where it is and an
    /// omitted `ai_suggested_hours` keeps the recorded suggestion.
    pub async fn update_item(
        &self,
        id: LineItemId,
        mut input: LineItemInput,
    ) -> Result<LineItem, ApplicationError> {
        let existing = self
            .repos
            .line_items
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("line item", id))?;
        if input.ai_suggested_hours.is_none() {
            input.ai_suggested_hours = existing.ai_suggested_hours;
        }
        let item = input.resolve(&self.directory().await?, existing.sequence)?;

        self.repos
            .line_items
            .update(id, item)
            .await?
            .ok_or_else(|| ApplicationError::not_found("line item", id))
    }

    pub async fn delete_item(&self, id: LineItemId) -> Result<(), ApplicationError> {
        if !self.repos.line_items.delete(id).await? {
            return Err(ApplicationError::not_found("line item", id));
        }
        info!(event_name = "quote.item.deleted", item_id = %id, "line item deleted");
        Ok(())
    }

    async fn directory(&self) -> Result<RoleDirectory, ApplicationError> {
        Ok(RoleDirectory::new(self.repos.roles.list().await?))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use cotiza_core::domain::line_item::{LineItemId, LineItemInput};
    use cotiza_core::domain::project::{NewProject, ProjectId};
    use cotiza_core::domain::quote::NewQuote;
    use cotiza_core::domain::role::{NewRole, Role, RoleId};
    use cotiza_core::domain::setting::{Setting, DEFAULT_MARGIN_KEY, DEFAULT_TAX_KEY};
    use cotiza_core::errors::{ApplicationError, DomainError};

    use super::QuoteService;
    use crate::repositories::Repositories;

    async fn seeded() -> (Repositories, Role, ProjectId) {
        let repos = Repositories::in_memory();
        let role = repos
            .roles
            .create(NewRole { name: "Backend Developer".to_string(), hourly_rate: Decimal::new(40, 0) })
            .await
            .expect("role");
        let project = repos
            .projects
            .create(NewProject {
                name: "ERP".to_string(),
                client_name: "Textiles Norte".to_string(),
                raw_requirements: None,
            })
            .await
            .expect("project");
        for (key, value) in [(DEFAULT_MARGIN_KEY, 30), (DEFAULT_TAX_KEY, 16)] {
            repos
                .settings
                .upsert(Setting {
                    key: key.to_string(),
                    value_text: None,
                    value_float: Some(Decimal::new(value, 2)),
                })
                .await
                .expect("setting");
        }
        (repos, role, project.id)
    }

    fn item_input(role_id: RoleId, hours: i64) -> LineItemInput {
        LineItemInput {
            role_id,
            description: "Integración con SAT".to_string(),
            manual_hours: Decimal::new(hours, 0),
            hourly_rate: None,
            ai_suggested_hours: None,
            sequence: None,
        }
    }

    #[tokio::test]
    async fn new_quotes_pick_up_stored_defaults() {
        let (repos, _, project_id) = seeded().await;
        let service = QuoteService::new(repos);

        let quote = service
            .create(NewQuote { applied_risk: Some(Decimal::new(5, 2)), ..NewQuote::for_project(project_id) })
            .await
            .expect("create");

        assert_eq!(quote.applied_margin, Decimal::new(30, 2));
        assert_eq!(quote.applied_risk, Decimal::new(5, 2));
        assert_eq!(quote.applied_tax, Decimal::new(16, 2));
    }

    #[tokio::test]
    async fn quotes_require_an_existing_project() {
        let (repos, _, _) = seeded().await;
        let service = QuoteService::new(repos);

        let error = service.create(NewQuote::for_project(ProjectId(404))).await.expect_err("missing");
        assert!(matches!(error, ApplicationError::NotFound { entity: "project", .. }));
    }

    #[tokio::test]
    async fn item_rates_are_snapshots_of_the_catalog() {
        let (repos, role, project_id) = seeded().await;
        let service = QuoteService::new(repos.clone());
        let quote = service.create(NewQuote::for_project(project_id)).await.expect("quote");

        let first = service.add_item(quote.id, item_input(role.id, 10)).await.expect("first");
        assert_eq!(first.hourly_rate, Decimal::new(40, 0));
        assert_eq!(first.sequence, 0);

        repos
            .roles
            .update(role.id, NewRole { name: role.name.clone(), hourly_rate: Decimal::new(50, 0) })
            .await
            .expect("rate change");

        let second = service.add_item(quote.id, item_input(role.id, 2)).await.expect("second");
        assert_eq!(second.hourly_rate, Decimal::new(50, 0));
        assert_eq!(second.sequence, 1);

        let items = service.list_items(quote.id).await.expect("items");
        assert_eq!(items[0].hourly_rate, Decimal::new(40, 0));
    }

    #[tokio::test]
    async fn item_edits_keep_position_and_validate_roles() {
        let (repos, role, project_id) = seeded().await;
        let service = QuoteService::new(repos);
        let quote = service.create(NewQuote::for_project(project_id)).await.expect("quote");
        let item = service
            .add_item(quote.id, LineItemInput { sequence: Some(7), ..item_input(role.id, 3) })
            .await
            .expect("item");

        let edited = service
            .update_item(item.id, LineItemInput { hourly_rate: Some(Decimal::new(45, 0)), ..item_input(role.id, 5) })
            .await
            .expect("edit");
        assert_eq!(edited.sequence, 7);
        assert_eq!(edited.manual_hours, Decimal::new(5, 0));
        assert_eq!(edited.hourly_rate, Decimal::new(45, 0));

        let error = service
            .update_item(item.id, item_input(RoleId(99), 1))
            .await
            .expect_err("unknown role");
        assert!(matches!(error, ApplicationError::Domain(DomainError::InvariantViolation(_))));
    }

    #[tokio::test]
    async fn manual_edits_keep_the_suggested_hours() {
        let (repos, role, project_id) = seeded().await;
        let service = QuoteService::new(repos);
        let quote = service.create(NewQuote::for_project(project_id)).await.expect("quote");
        let item = service
            .add_item(
                quote.id,
                LineItemInput { ai_suggested_hours: Some(Decimal::new(24, 0)), ..item_input(role.id, 24) },
            )
            .await
            .expect("item");

        let edited = service.update_item(item.id, item_input(role.id, 30)).await.expect("edit");
        assert_eq!(edited.manual_hours, Decimal::new(30, 0));
        assert_eq!(edited.ai_suggested_hours, Some(Decimal::new(24, 0)));

        let stored = service.list_items(quote.id).await.expect("items");
        assert_eq!(stored[0].ai_suggested_hours, Some(Decimal::new(24, 0)));
    }

    #[tokio::test]
    async fn deleting_a_missing_item_is_not_found() {
        let (repos, _, _) = seeded().await;
        let service = QuoteService::new(repos);

        assert!(matches!(
            service.delete_item(LineItemId(1)).await,
            Err(ApplicationError::NotFound { entity: "line item", .. })
        ));
    }
}
