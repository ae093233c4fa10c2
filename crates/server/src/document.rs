//! Printable itemized quote rendered from a `QuoteView`.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tera::{Context, Tera};

use cotiza_db::QuoteView;

const TEMPLATE_NAME: &str = "itemized.html.tera";

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("template error: {0}")]
    Template(String),
}

/// Register custom Tera filters used by quote templates.
///
/// - `money`: two decimals, e.g. `amount | money`
/// - `percent`: fraction as a percentage, e.g. `0.16 | percent` gives `16%`
pub fn register_template_filters(tera: &mut Tera) {
    tera.register_filter("money", tera_money_filter);
    tera.register_filter("percent", tera_percent_filter);
}

fn decimal_value(value: &tera::Value) -> Decimal {
    match value {
        tera::Value::String(text) => Decimal::from_str(text.trim()).unwrap_or(Decimal::ZERO),
        tera::Value::Number(number) => {
            Decimal::from_str(&number.to_string()).unwrap_or(Decimal::ZERO)
        }
        _ => Decimal::ZERO,
    }
}

fn tera_money_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    Ok(tera::Value::String(format!("{:.2}", decimal_value(value).round_dp(2))))
}

fn tera_percent_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let percent = (decimal_value(value) * Decimal::ONE_HUNDRED).round_dp(2).normalize();
    Ok(tera::Value::String(format!("{percent}%")))
}

#[derive(Clone, Debug)]
pub struct QuoteDocument {
    tera: Tera,
}

impl QuoteDocument {
    pub fn new() -> Result<Self, DocumentError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![".html.tera"]);
        register_template_filters(&mut tera);
        tera.add_raw_template(
            TEMPLATE_NAME,
            include_str!("../../../templates/quotes/itemized.html.tera"),
        )
        .map_err(|error| DocumentError::Template(error.to_string()))?;

        Ok(Self { tera })
    }

    pub fn render(&self, quote: &QuoteView, issued_on: NaiveDate) -> Result<String, DocumentError> {
        let pricing = &quote.pricing;
        let margin_label = match pricing.effective_margin {
            Some(margin) => format!("{}%", (margin * Decimal::ONE_HUNDRED).round_dp(2).normalize()),
            None => "not applied".to_string(),
        };

        let mut context = Context::new();
        context.insert("quote", quote);
        context.insert("issued_on", &issued_on.format("%Y-%m-%d").to_string());
        context.insert("margin_label", &margin_label);
        context.insert("margin_amount", &(pricing.price_before_tax - pricing.cost_base));

        self.tera
            .render(TEMPLATE_NAME, &context)
            .map_err(|error| DocumentError::Template(error.to_string()))
    }
}
