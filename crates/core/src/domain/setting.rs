use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::quote::FinancialParameters;

pub const DEFAULT_MARGIN_KEY: &str = "default_margin";
pub const DEFAULT_RISK_KEY: &str = "default_risk";
pub const DEFAULT_TAX_KEY: &str = "default_tax";

/// Operator-maintained key/value setting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    #[serde(default)]
    pub value_text: Option<String>,
    #[serde(default)]
    pub value_float: Option<Decimal>,
}

/// Builds the financial defaults for new quotes from stored settings.
/// Missing keys default to zero.
pub fn financial_defaults(settings: &[Setting]) -> FinancialParameters {
    let lookup = |key: &str| {
        settings
            .iter()
            .find(|setting| setting.key == key)
            .and_then(|setting| setting.value_float)
            .unwrap_or(Decimal::ZERO)
    };

    FinancialParameters {
        margin: lookup(DEFAULT_MARGIN_KEY),
        risk: lookup(DEFAULT_RISK_KEY),
        tax: lookup(DEFAULT_TAX_KEY),
    }
}
