use std::collections::HashMap;

use rust_decimal::Decimal;

use cotiza_core::domain::line_item::{NewLineItem, UNTITLED_DESCRIPTION};
use cotiza_core::domain::role::{Role, RoleId};

use crate::llm::ScopeCandidate;

/// Placeholder estimate used for every selected role when generation fails.
pub const FALLBACK_HOURS: Decimal = Decimal::from_parts(8, 0, 0, false, 0);
/// Longest failure reason embedded in a fallback description.
pub const FAILURE_REASON_MAX_CHARS: usize = 50;
pub const MISSING_DESCRIPTION: &str = UNTITLED_DESCRIPTION;

/// Why a generation run ended up on the fallback path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardrailDecision {
    Accept(Vec<NewLineItem>),
    Fallback { reason: String },
}

/// Keeps candidates whose role is one of the selected roles and turns them
/// into items priced at the role's current rate. A candidate's position in the
/// provider list becomes its sequence, so dropped candidates leave gaps.
pub fn review_candidates(candidates: Vec<ScopeCandidate>, selected: &[Role]) -> GuardrailDecision {
    let rates: HashMap<RoleId, Decimal> =
        selected.iter().map(|role| (role.id, role.hourly_rate)).collect();
    let total = candidates.len();

    let accepted: Vec<NewLineItem> = candidates
        .into_iter()
        .enumerate()
        .filter_map(|(index, candidate)| {
            let role_id = candidate.role_id?;
            let rate = *rates.get(&role_id)?;
            let hours = candidate.hours.unwrap_or(Decimal::ZERO).max(Decimal::ZERO);
            Some(NewLineItem {
                role_id,
                description: candidate
                    .description
                    .unwrap_or_else(|| MISSING_DESCRIPTION.to_string()),
                manual_hours: hours,
                hourly_rate: rate,
                ai_suggested_hours: Some(hours),
                sequence: index as i64,
            })
        })
        .collect();

    if accepted.is_empty() {
        let reason = if total == 0 {
            "provider returned no items".to_string()
        } else {
            format!("none of {total} items matched the selected roles")
        };
        return GuardrailDecision::Fallback { reason };
    }
    GuardrailDecision::Accept(accepted)
}

/// One baseline item per selected role, in selection order. Descriptions are
/// written in Spanish unless the working language is something else.
pub fn fallback_items(selected: &[Role], reason: &str, language: &str) -> Vec<NewLineItem> {
    let reason = truncate_reason(reason);
    let spanish = is_spanish(language);
    selected
        .iter()
        .enumerate()
        .map(|(index, role)| NewLineItem {
            role_id: role.id,
            description: if spanish {
                format!("Estimación base para {} (Error IA: {reason})", role.name)
            } else {
                format!("Baseline estimate for {} (AI error: {reason})", role.name)
            },
            manual_hours: FALLBACK_HOURS,
            hourly_rate: role.hourly_rate,
            ai_suggested_hours: Some(FALLBACK_HOURS),
            sequence: index as i64,
        })
        .collect()
}

fn is_spanish(language: &str) -> bool {
    let language = language.trim().to_lowercase();
    ["span", "espa", "es-", "es_"].iter().any(|prefix| language.starts_with(prefix))
        || language == "es"
}

pub fn truncate_reason(reason: &str) -> String {
    reason.chars().take(FAILURE_REASON_MAX_CHARS).collect()
}
