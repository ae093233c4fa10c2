use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::line_item::LineItem;
use crate::domain::quote::FinancialParameters;

/// Margins at or above 1.0 are clamped to this value before use.
pub const MARGIN_CEILING: Decimal = Decimal::from_parts(99, 0, 0, false, 2);

const PRESENTATION_DP: u32 = 2;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTrace {
    pub steps: Vec<PricingTraceStep>,
}

/// Unrounded intermediate values of the cost to price cascade.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub subtotal_cost: Decimal,
    pub risk_amount: Decimal,
    pub cost_base: Decimal,
    /// Margin actually applied; `None` when a negative margin disabled the step.
    pub effective_margin: Option<Decimal>,
    pub price_before_tax: Decimal,
    pub tax_amount: Decimal,
    pub total_price: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingResult {
    /// Subtotal rounded to two decimals for presentation.
    pub subtotal_cost: Decimal,
    /// Final price rounded to two decimals for presentation.
    pub total_price: Decimal,
    pub breakdown: PricingBreakdown,
    pub trace: PricingTrace,
}

pub trait PricingEngine: Send + Sync {
    fn price(&self, items: &[LineItem], financials: FinancialParameters) -> PricingResult;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicPricingEngine;

impl PricingEngine for DeterministicPricingEngine {
    fn price(&self, items: &[LineItem], financials: FinancialParameters) -> PricingResult {
        compute_totals(items, financials.margin, financials.risk, financials.tax)
    }
}

/// Sums line costs, saturating at `Decimal::MAX` instead of overflowing.
pub fn subtotal_cost(items: &[LineItem]) -> Decimal {
    items.iter().map(LineItem::cost).fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Applies the margin guard: `>= 1` clamps to [`MARGIN_CEILING`], negative
/// disables the margin step entirely.
pub fn effective_margin(margin: Decimal) -> Option<Decimal> {
    if margin >= Decimal::ONE {
        return Some(MARGIN_CEILING);
    }
    if margin < Decimal::ZERO {
        return None;
    }
    Some(margin)
}

/// Runs the fixed cascade: subtotal, risk, cost base, gross margin, tax, total.
/// Inputs are assumed non-negative; only the two headline totals are rounded.
/// Every step saturates at the `Decimal` bounds, so pricing never panics.
pub fn compute_totals(
    items: &[LineItem],
    margin: Decimal,
    risk: Decimal,
    tax: Decimal,
) -> PricingResult {
    let subtotal = subtotal_cost(items);
    let risk_amount = subtotal.saturating_mul(risk);
    let cost_base = subtotal.saturating_add(risk_amount);

    let effective_margin = effective_margin(margin);
    let price_before_tax = match effective_margin {
        Some(margin) => gross_up(cost_base, margin),
        None => cost_base,
    };

    let tax_amount = price_before_tax.saturating_mul(tax);
    let total = price_before_tax.saturating_add(tax_amount);

    let margin_detail = match effective_margin {
        Some(applied) if applied != margin => {
            format!("cost_base / (1 - {applied}), margin {margin} clamped")
        }
        Some(applied) => format!("cost_base / (1 - {applied})"),
        None => format!("margin {margin} inactive, price = cost_base"),
    };

    let breakdown = PricingBreakdown {
        subtotal_cost: subtotal,
        risk_amount,
        cost_base,
        effective_margin,
        price_before_tax,
        tax_amount,
        total_price: total,
    };

    PricingResult {
        subtotal_cost: present(subtotal),
        total_price: present(total),
        trace: PricingTrace {
            steps: vec![
                step("subtotal", "sum(manual_hours * hourly_rate)".to_string(), subtotal),
                step("risk", format!("subtotal * {risk}"), risk_amount),
                step("cost_base", "subtotal + risk".to_string(), cost_base),
                step("margin", margin_detail, price_before_tax),
                step("tax", format!("price_before_tax * {tax}"), tax_amount),
                step("total", "price_before_tax + tax".to_string(), total),
            ],
        },
        breakdown,
    }
}

/// `cost_base / (1 - margin)` for a margin in `[0, 1)`.
fn gross_up(cost_base: Decimal, margin: Decimal) -> Decimal {
    cost_base.checked_div(Decimal::ONE - margin).unwrap_or(if cost_base.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    })
}

fn present(amount: Decimal) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(PRESENTATION_DP, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(PRESENTATION_DP);
    rounded
}

fn step(stage: &str, detail: String, amount: Decimal) -> PricingTraceStep {
    PricingTraceStep { stage: stage.to_string(), detail, amount }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{compute_totals, effective_margin, DeterministicPricingEngine, PricingEngine};
    use crate::domain::line_item::{LineItem, LineItemId};
    use crate::domain::quote::{FinancialParameters, QuoteId};
    use crate::domain::role::RoleId;

    fn item(id: i64, hours: Decimal, rate: Decimal) -> LineItem {
        LineItem {
            id: LineItemId(id),
            quote_id: QuoteId(1),
            role_id: RoleId(1),
            description: "work".to_string(),
            manual_hours: hours,
            hourly_rate: rate,
            ai_suggested_hours: None,
            sequence: id,
        }
    }

    fn thousand_of_cost() -> Vec<LineItem> {
        vec![
            item(1, Decimal::new(10, 0), Decimal::new(50, 0)),
            item(2, Decimal::new(20, 0), Decimal::new(25, 0)),
        ]
    }

    #[test]
    fn subtotal_is_exact_sum_of_hours_times_rate() {
        let items = vec![
            item(1, Decimal::new(1234, 3), Decimal::new(3333, 2)),
            item(2, Decimal::new(75, 1), Decimal::new(4125, 2)),
            item(3, Decimal::ZERO, Decimal::new(99, 0)),
        ];
        let expected = Decimal::new(1234, 3) * Decimal::new(3333, 2)
            + Decimal::new(75, 1) * Decimal::new(4125, 2);

        let result = compute_totals(&items, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);

        assert_eq!(result.breakdown.subtotal_cost, expected);
        assert_eq!(result.subtotal_cost, expected.round_dp(2));
    }

    #[test]
    fn reference_cascade_produces_1595() {
        let result = compute_totals(
            &thousand_of_cost(),
            Decimal::new(20, 2),
            Decimal::new(10, 2),
            Decimal::new(16, 2),
        );

        assert_eq!(result.subtotal_cost, Decimal::new(100_000, 2));
        assert_eq!(result.breakdown.risk_amount, Decimal::new(100, 0));
        assert_eq!(result.breakdown.cost_base, Decimal::new(1100, 0));
        assert_eq!(result.breakdown.price_before_tax, Decimal::new(1375, 0));
        assert_eq!(result.breakdown.tax_amount, Decimal::new(220, 0));
        assert_eq!(result.total_price, Decimal::new(159_500, 2));
    }

    #[test]
    fn margin_at_or_above_one_is_clamped() {
        for margin in [Decimal::ONE, Decimal::new(15, 1), Decimal::new(42, 0)] {
            let result =
                compute_totals(&thousand_of_cost(), margin, Decimal::new(10, 2), Decimal::ZERO);

            let expected = Decimal::new(1100, 0) / (Decimal::ONE - Decimal::new(99, 2));
            assert_eq!(result.breakdown.effective_margin, Some(Decimal::new(99, 2)));
            assert_eq!(result.breakdown.price_before_tax, expected);
            assert_eq!(result.total_price, Decimal::new(110_000, 0));
        }
    }

    #[test]
    fn negative_margin_bypasses_margin_step() {
        let result = compute_totals(
            &thousand_of_cost(),
            Decimal::new(-1, 1),
            Decimal::new(10, 2),
            Decimal::ZERO,
        );

        assert_eq!(result.breakdown.effective_margin, None);
        assert_eq!(result.breakdown.price_before_tax, result.breakdown.cost_base);
    }

    #[test]
    fn empty_quote_prices_to_zero() {
        let result = compute_totals(&[], Decimal::new(30, 2), Decimal::new(10, 2), Decimal::new(16, 2));

        assert_eq!(result.subtotal_cost, Decimal::ZERO);
        assert_eq!(result.total_price, Decimal::ZERO);
    }

    #[test]
    fn only_headline_totals_are_rounded() {
        let items = vec![item(1, Decimal::ONE, Decimal::new(100, 0))];
        let result =
            compute_totals(&items, Decimal::new(3, 1), Decimal::ZERO, Decimal::ZERO);

        assert!(result.breakdown.price_before_tax.scale() > 2);
        assert_eq!(result.total_price, Decimal::new(14286, 2));
    }

    #[test]
    fn engine_trait_uses_quote_financials_and_records_trace() {
        let engine = DeterministicPricingEngine;
        let result = engine.price(
            &thousand_of_cost(),
            FinancialParameters {
                margin: Decimal::new(20, 2),
                risk: Decimal::new(10, 2),
                tax: Decimal::new(16, 2),
            },
        );

        let stages: Vec<&str> = result.trace.steps.iter().map(|step| step.stage.as_str()).collect();
        assert_eq!(stages, vec!["subtotal", "risk", "cost_base", "margin", "tax", "total"]);
        assert_eq!(result.total_price, Decimal::new(159_500, 2));
    }

    #[test]
    fn oversized_line_costs_saturate_instead_of_overflowing() {
        let items = vec![
            item(1, Decimal::from_i128_with_scale(100_000_000_000_000_000_000, 0), Decimal::new(1_000_000_000_000, 0)),
            item(2, Decimal::MAX, Decimal::MAX),
        ];

        let result =
            compute_totals(&items, Decimal::new(30, 2), Decimal::new(10, 2), Decimal::new(16, 2));

        assert_eq!(result.breakdown.subtotal_cost, Decimal::MAX);
        assert_eq!(result.breakdown.cost_base, Decimal::MAX);
        assert_eq!(result.breakdown.total_price, Decimal::MAX);
        assert!(result.total_price >= Decimal::new(i64::MAX, 0));
    }

    #[test]
    fn margin_just_below_one_saturates_the_gross_up() {
        let margin = Decimal::ONE - Decimal::new(1, 28);
        let items = vec![item(1, Decimal::new(100, 0), Decimal::new(50, 0))];

        let result = compute_totals(&items, margin, Decimal::ZERO, Decimal::ZERO);

        assert_eq!(result.breakdown.effective_margin, Some(margin));
        assert_eq!(result.breakdown.price_before_tax, Decimal::MAX);
        assert_eq!(result.breakdown.total_price, Decimal::MAX);
        assert_eq!(result.subtotal_cost, Decimal::new(500_000, 2));
    }

    #[test]
    fn effective_margin_guard_boundaries() {
        assert_eq!(effective_margin(Decimal::ZERO), Some(Decimal::ZERO));
        assert_eq!(effective_margin(Decimal::new(999, 3)), Some(Decimal::new(999, 3)));
        assert_eq!(effective_margin(Decimal::ONE), Some(Decimal::new(99, 2)));
        assert_eq!(effective_margin(Decimal::new(-1, 2)), None);
    }
}
