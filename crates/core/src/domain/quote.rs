use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::project::ProjectId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteId(pub i64);

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Margin, risk and tax fractions applied when pricing a quote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialParameters {
    pub margin: Decimal,
    pub risk: Decimal,
    pub tax: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub id: QuoteId,
    pub project_id: ProjectId,
    pub applied_margin: Decimal,
    pub applied_risk: Decimal,
    pub applied_tax: Decimal,
    pub ai_raw_input: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Quote {
    pub fn financials(&self) -> FinancialParameters {
        FinancialParameters {
            margin: self.applied_margin,
            risk: self.applied_risk,
            tax: self.applied_tax,
        }
    }

    pub fn apply_financials(&mut self, financials: FinancialParameters) {
        self.applied_margin = financials.margin;
        self.applied_risk = financials.risk;
        self.applied_tax = financials.tax;
    }
}

/// Quote creation input. Omitted parameters fall back to the configured defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuote {
    pub project_id: ProjectId,
    #[serde(default)]
    pub applied_margin: Option<Decimal>,
    #[serde(default)]
    pub applied_risk: Option<Decimal>,
    #[serde(default)]
    pub applied_tax: Option<Decimal>,
    #[serde(default)]
    pub ai_raw_input: Option<String>,
}

impl NewQuote {
    pub fn for_project(project_id: ProjectId) -> Self {
        Self {
            project_id,
            applied_margin: None,
            applied_risk: None,
            applied_tax: None,
            ai_raw_input: None,
        }
    }

    pub fn resolve_financials(&self, defaults: FinancialParameters) -> FinancialParameters {
        FinancialParameters {
            margin: self.applied_margin.unwrap_or(defaults.margin),
            risk: self.applied_risk.unwrap_or(defaults.risk),
            tax: self.applied_tax.unwrap_or(defaults.tax),
        }
    }
}
