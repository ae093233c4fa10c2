//! Read-side composition of a quote with its items, project and computed totals.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use cotiza_core::cpq::{DeterministicPricingEngine, PricingBreakdown, PricingEngine, RoleDirectory};
use cotiza_core::domain::line_item::LineItem;
use cotiza_core::domain::project::ProjectId;
use cotiza_core::domain::quote::QuoteId;
use cotiza_core::errors::ApplicationError;

use crate::repositories::Repositories;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteViewItem {
    #[serde(flatten)]
    pub item: LineItem,
    /// `None` when the role was removed from the catalog after the item was created.
    pub role_name: Option<String>,
    pub line_cost: Decimal,
}

/// A quote as presented to consumers. Totals are recomputed on every render.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteView {
    pub id: QuoteId,
    pub project_id: ProjectId,
    pub applied_margin: Decimal,
    pub applied_risk: Decimal,
    pub applied_tax: Decimal,
    pub ai_raw_input: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<QuoteViewItem>,
    pub project_name: Option<String>,
    pub client_name: Option<String>,
    pub total_cost: Decimal,
    pub total_price: Decimal,
    pub pricing: PricingBreakdown,
}

pub struct QuoteAggregator<P = DeterministicPricingEngine> {
    repos: Repositories,
    engine: P,
}

impl QuoteAggregator<DeterministicPricingEngine> {
    pub fn new(repos: Repositories) -> Self {
        Self { repos, engine: DeterministicPricingEngine }
    }
}

impl<P: PricingEngine> QuoteAggregator<P> {
    pub fn with_engine(repos: Repositories, engine: P) -> Self {
        Self { repos, engine }
    }

    pub async fn render_quote(&self, quote_id: QuoteId) -> Result<QuoteView, ApplicationError> {
        let quote = self
            .repos
            .quotes
            .find_by_id(quote_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("quote", quote_id))?;
        let items = self.repos.line_items.list_for_quote(quote_id).await?;
        let pricing = self.engine.price(&items, quote.financials());

        let (project_name, client_name) = match self.repos.projects.find_by_id(quote.project_id).await
        {
            Ok(Some(project)) => (Some(project.name), Some(project.client_name)),
            Ok(None) => {
                debug!(
                    event_name = "quote.render.project_missing",
                    quote_id = %quote_id,
                    project_id = %quote.project_id,
                    "rendering quote without project details"
                );
                (None, None)
            }
            Err(error) => {
                warn!(
                    event_name = "quote.render.project_lookup_failed",
                    quote_id = %quote_id,
                    project_id = %quote.project_id,
                    error = %error,
                    "rendering quote without project details"
                );
                (None, None)
            }
        };

        let directory = match self.repos.roles.list().await {
            Ok(roles) => RoleDirectory::new(roles),
            Err(error) => {
                warn!(
                    event_name = "quote.render.role_lookup_failed",
                    quote_id = %quote_id,
                    error = %error,
                    "rendering quote without role names"
                );
                RoleDirectory::default()
            }
        };

        let items = items
            .into_iter()
            .map(|item| QuoteViewItem {
                role_name: directory.name_of(item.role_id).map(str::to_owned),
                line_cost: item.cost(),
                item,
            })
            .collect();

        Ok(QuoteView {
            id: quote.id,
            project_id: quote.project_id,
            applied_margin: quote.applied_margin,
            applied_risk: quote.applied_risk,
            applied_tax: quote.applied_tax,
            ai_raw_input: quote.ai_raw_input,
            created_at: quote.created_at,
            items,
            project_name,
            client_name,
            total_cost: pricing.subtotal_cost,
            total_price: pricing.total_price,
            pricing: pricing.breakdown,
        })
    }
}
