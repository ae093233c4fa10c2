use crate::llm::ScopeRequest;

/// Bumped whenever the policy wording changes; generated scopes depend on it.
pub const SCOPE_POLICY_VERSION: &str = "2024-06-scope-v1";

/// Builds the system message. Only the working language is parameterised.
pub fn system_policy(language: &str) -> String {
    format!(
        "You are an expert in software architecture and estimation. Turn detailed \
requirements into an executive summary of TECHNICAL SCOPE.

ESTIMATION RULES (MIDPOINT):
1. Do not be extreme: avoid inflating hours but never give an unrealistic theoretical minimum. Aim for the professional midpoint.
2. AGGREGATION: do not list every small detail as its own line. Group related requirements into main features or modules (e.g. \"Authentication and profiles\" instead of ten lines about buttons).
3. The analysis must be DEEP: even though the result is a summary, each line's hours must reflect ALL of the technical detail behind it.
4. ROLE DISTRIBUTION: assign each feature to the single best-fit role. Split a feature across roles only when it genuinely needs several.

RESPONSE FORMAT (JSON):
{{\"items\": [{{\"role_id\": int, \"description\": \"Feature summary\", \"hours\": float}}]}}

5. Do not write any text outside the JSON.
6. Write the descriptions in {language}.
7. At most 10-12 items in total so the summary stays readable."
    )
}

/// Builds the user message with the project context. Rates are never shared.
pub fn user_context(request: &ScopeRequest) -> String {
    let roles = request
        .roles
        .iter()
        .map(|role| serde_json::json!({ "id": role.id, "name": role.name }))
        .collect::<Vec<_>>();

    format!(
        "PROJECT: {project}\nDETAILED REQUIREMENTS:\n{requirements}\n\n\
AVAILABLE ROLES (id and name): {roles}\n\n\
Analyse all of the detail above but present a SUMMARY OF KEY FEATURES with their estimated hours (midpoint).",
        project = request.project_name,
        requirements = request.requirements,
        roles = serde_json::Value::Array(roles),
    )
}
