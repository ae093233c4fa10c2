use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cpq::directory::RoleDirectory;
use crate::domain::quote::QuoteId;
use crate::domain::role::RoleId;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineItemId(pub i64);

impl fmt::Display for LineItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One estimated unit of work attributed to a role within a quote.
///
/// `hourly_rate` is a snapshot taken when the item was created or last edited;
/// later role rate changes never reach existing items. `ai_suggested_hours` is
/// provenance only and plays no part in pricing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub quote_id: QuoteId,
    pub role_id: RoleId,
    pub description: String,
    pub manual_hours: Decimal,
    pub hourly_rate: Decimal,
    pub ai_suggested_hours: Option<Decimal>,
    pub sequence: i64,
}

impl LineItem {
    /// `manual_hours * hourly_rate`, saturating at `Decimal::MAX`.
    pub fn cost(&self) -> Decimal {
        self.manual_hours.saturating_mul(self.hourly_rate)
    }
}

/// Stored in place of a blank description.
pub const UNTITLED_DESCRIPTION: &str = "Untitled task";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLineItem {
    pub role_id: RoleId,
    pub description: String,
    pub manual_hours: Decimal,
    pub hourly_rate: Decimal,
    #[serde(default)]
    pub ai_suggested_hours: Option<Decimal>,
    #[serde(default)]
    pub sequence: i64,
}

impl NewLineItem {
    /// Negative hours and rates are stored as zero so pricing only ever sees
    /// non-negative inputs. A blank description becomes [`UNTITLED_DESCRIPTION`].
    pub fn normalized(mut self) -> Self {
        if self.description.trim().is_empty() {
            self.description = UNTITLED_DESCRIPTION.to_string();
        }
        self.manual_hours = non_negative(self.manual_hours);
        self.hourly_rate = non_negative(self.hourly_rate);
        self.ai_suggested_hours = self.ai_suggested_hours.map(non_negative);
        self
    }
}

/// Line item as submitted by an estimator. An omitted rate is snapshotted from
/// the role directory; an omitted sequence places the item at `fallback_sequence`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemInput {
    pub role_id: RoleId,
    pub description: String,
    #[serde(default)]
    pub manual_hours: Decimal,
    #[serde(default)]
    pub hourly_rate: Option<Decimal>,
    #[serde(default)]
    pub ai_suggested_hours: Option<Decimal>,
    #[serde(default)]
    pub sequence: Option<i64>,
}

impl LineItemInput {
    pub fn resolve(
        self,
        directory: &RoleDirectory,
        fallback_sequence: i64,
    ) -> Result<NewLineItem, DomainError> {
        let role_rate = directory.rate_of(self.role_id).ok_or_else(|| {
            DomainError::InvariantViolation(format!("role {} does not exist", self.role_id))
        })?;

        Ok(NewLineItem {
            role_id: self.role_id,
            description: self.description,
            manual_hours: self.manual_hours,
            hourly_rate: self.hourly_rate.unwrap_or(role_rate),
            ai_suggested_hours: self.ai_suggested_hours,
            sequence: self.sequence.unwrap_or(fallback_sequence),
        }
        .normalized())
    }
}

fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// Sorts items by sequence, breaking ties by id (creation order).
pub fn sort_for_display(items: &mut [LineItem]) {
    items.sort_by_key(|item| (item.sequence, item.id));
}
