use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use cotiza_core::cpq::RoleDirectory;
use cotiza_core::domain::line_item::{LineItem, NewLineItem};
use cotiza_core::domain::project::Project;
use cotiza_core::domain::quote::QuoteId;
use cotiza_core::domain::role::RoleId;
use cotiza_core::errors::ApplicationError;
use cotiza_db::Repositories;

use crate::guardrails::{fallback_items, review_candidates, GuardrailDecision};
use crate::llm::{ScopeProvider, ScopeRequest, ScopeRole};

pub struct ScopeGenerator {
    repos: Repositories,
    provider: Arc<dyn ScopeProvider>,
}

impl ScopeGenerator {
    pub fn new(repos: Repositories, provider: Arc<dyn ScopeProvider>) -> Self {
        Self { repos, provider }
    }

    /// Looks up the quote and its project, then generates scope for them.
    pub async fn generate_for_quote(
        &self,
        quote_id: QuoteId,
        requirements: &str,
        role_ids: &[RoleId],
    ) -> Result<Vec<LineItem>, ApplicationError> {
        let quote = self
            .repos
            .quotes
            .find_by_id(quote_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("quote", quote_id))?;
        let project = self
            .repos
            .projects
            .find_by_id(quote.project_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("project", quote.project_id))?;

        let role_ids: HashSet<RoleId> = role_ids.iter().copied().collect();
        self.generate_scope(&project, quote_id, requirements, &role_ids).await
    }

    /// Generates and persists line items for the selected roles.
    ///
    /// Provider failures never reach the caller: they produce one baseline
    /// item per selected role instead. Only record-store errors propagate.
    pub async fn generate_scope(
        &self,
        project: &Project,
        quote_id: QuoteId,
        requirements: &str,
        role_ids: &HashSet<RoleId>,
    ) -> Result<Vec<LineItem>, ApplicationError> {
        let directory = RoleDirectory::new(self.repos.roles.list().await?);
        let selected = directory.resolve(role_ids);
        if selected.is_empty() {
            debug!(
                event_name = "scope.generate.no_roles",
                quote_id = %quote_id,
                requested = role_ids.len(),
                "no known roles selected; nothing to generate"
            );
            return Ok(Vec::new());
        }

        let request = ScopeRequest {
            project_name: project.name.clone(),
            requirements: requirements.to_string(),
            roles: selected
                .iter()
                .map(|role| ScopeRole { id: role.id, name: role.name.clone() })
                .collect(),
        };

        info!(
            event_name = "scope.generate.start",
            quote_id = %quote_id,
            project_id = %project.id,
            roles = selected.len(),
            "requesting scope suggestions"
        );

        let decision = match self.provider.suggest(&request).await {
            Ok(candidates) => review_candidates(candidates, &selected),
            Err(error) => GuardrailDecision::Fallback { reason: error.to_string() },
        };

        let items = match decision {
            GuardrailDecision::Accept(items) => {
                info!(
                    event_name = "scope.generate.accepted",
                    quote_id = %quote_id,
                    items = items.len(),
                    "scope suggestions accepted"
                );
                items
            }
            GuardrailDecision::Fallback { reason } => {
                warn!(
                    event_name = "scope.generate.fallback",
                    quote_id = %quote_id,
                    reason = %reason,
                    "scope generation fell back to baseline estimates"
                );
                fallback_items(&selected, &reason, self.provider.working_language())
            }
        };

        self.persist(quote_id, items).await
    }

    async fn persist(
        &self,
        quote_id: QuoteId,
        items: Vec<NewLineItem>,
    ) -> Result<Vec<LineItem>, ApplicationError> {
        let mut created = Vec::with_capacity(items.len());
        for item in items {
            created.push(self.repos.line_items.create(quote_id, item).await?);
        }
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use cotiza_core::domain::project::{NewProject, Project};
    use cotiza_core::domain::quote::{FinancialParameters, QuoteId};
    use cotiza_core::domain::role::{NewRole, Role, RoleId};
    use cotiza_core::errors::ApplicationError;
    use cotiza_db::Repositories;

    use super::ScopeGenerator;
    use crate::llm::{ProviderError, ScopeCandidate, ScopeProvider, ScopeRequest};

    enum Script {
        Candidates(Vec<ScopeCandidate>),
        Fail(String),
    }

    struct ScriptedProvider {
        script: Script,
        calls: AtomicUsize,
        last_request: Mutex<Option<ScopeRequest>>,
    }

    impl ScriptedProvider {
        fn new(script: Script) -> Arc<Self> {
            Arc::new(Self { script, calls: AtomicUsize::new(0), last_request: Mutex::new(None) })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ScopeProvider for ScriptedProvider {
        async fn suggest(
            &self,
            request: &ScopeRequest,
        ) -> Result<Vec<ScopeCandidate>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().expect("lock") = Some(request.clone());
            match &self.script {
                Script::Candidates(candidates) => Ok(candidates.clone()),
                Script::Fail(message) => Err(ProviderError::Transport(message.clone())),
            }
        }
    }

    struct Fixture {
        repos: Repositories,
        project: Project,
        quote_id: QuoteId,
        backend: Role,
        qa: Role,
        designer: Role,
    }

    async fn fixture() -> Fixture {
        let repos = Repositories::in_memory();
        let mut roles = Vec::new();
        for (name, rate) in [("Backend Developer", 40), ("QA Engineer", 30), ("UX/UI Designer", 35)] {
            roles.push(
                repos
                    .roles
                    .create(NewRole { name: name.to_string(), hourly_rate: Decimal::new(rate, 0) })
                    .await
                    .expect("role"),
            );
        }
        let project = repos
            .projects
            .create(NewProject {
                name: "Reservas".to_string(),
                client_name: "Hotel Mar".to_string(),
                raw_requirements: None,
            })
            .await
            .expect("project");
        let quote = repos
            .quotes
            .create(project.id, FinancialParameters::default(), None)
            .await
            .expect("quote");
        let designer = roles.pop().expect("designer");
        let qa = roles.pop().expect("qa");
        let backend = roles.pop().expect("backend");
        Fixture { repos, project, quote_id: quote.id, backend, qa, designer }
    }

    fn candidate(role_id: RoleId, hours: i64, description: &str) -> ScopeCandidate {
        ScopeCandidate {
            role_id: Some(role_id),
            description: Some(description.to_string()),
            hours: Some(Decimal::new(hours, 0)),
        }
    }

    fn ids(roles: &[&Role]) -> HashSet<RoleId> {
        roles.iter().map(|role| role.id).collect()
    }

    #[tokio::test]
    async fn empty_selection_makes_no_call_and_no_writes() {
        let fx = fixture().await;
        let provider = ScriptedProvider::new(Script::Candidates(Vec::new()));
        let generator = ScopeGenerator::new(fx.repos.clone(), provider.clone());

        let unknown: HashSet<RoleId> = [RoleId(99), RoleId(100)].into_iter().collect();
        let items = generator
            .generate_scope(&fx.project, fx.quote_id, "algo", &unknown)
            .await
            .expect("generate");

        assert!(items.is_empty());
        assert_eq!(provider.calls(), 0);
        assert!(fx.repos.line_items.list_for_quote(fx.quote_id).await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn provider_failure_falls_back_to_one_item_per_role() {
        let fx = fixture().await;
        let provider = ScriptedProvider::new(Script::Fail(
            "connection refused by upstream gateway after waiting far too long".to_string(),
        ));
        let generator = ScopeGenerator::new(fx.repos.clone(), provider.clone());

        let items = generator
            .generate_scope(&fx.project, fx.quote_id, "reservas", &ids(&[&fx.backend, &fx.qa]))
            .await
            .expect("fallback never fails");

        assert_eq!(provider.calls(), 1);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].role_id, fx.backend.id);
        assert_eq!(items[0].hourly_rate, Decimal::new(40, 0));
        assert_eq!(items[1].role_id, fx.qa.id);
        assert_eq!(items[1].hourly_rate, Decimal::new(30, 0));
        for item in &items {
            assert_eq!(item.manual_hours, Decimal::new(8, 0));
            assert!(item.description.starts_with("Estimación base para "));
            let reason = item
                .description
                .split_once("(Error IA: ")
                .map(|(_, rest)| rest.trim_end_matches(')'))
                .expect("reason embedded");
            assert!(reason.chars().count() <= 50);
        }
    }

    #[tokio::test]
    async fn unrequested_roles_never_become_items() {
        let fx = fixture().await;
        let provider = ScriptedProvider::new(Script::Candidates(vec![
            candidate(fx.designer.id, 12, "Diseño de interfaz"),
            candidate(fx.backend.id, 30, "API de reservas"),
            candidate(fx.qa.id, 10, "Pruebas end to end"),
        ]));
        let generator = ScopeGenerator::new(fx.repos.clone(), provider.clone());

        let items = generator
            .generate_scope(&fx.project, fx.quote_id, "reservas", &ids(&[&fx.backend, &fx.qa]))
            .await
            .expect("generate");

        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|item| item.role_id != fx.designer.id));
        assert_eq!(items[0].sequence, 1);
        assert_eq!(items[0].manual_hours, Decimal::new(30, 0));
        assert_eq!(items[0].ai_suggested_hours, Some(Decimal::new(30, 0)));
        assert_eq!(items[1].sequence, 2);

        let request = provider.last_request.lock().expect("lock").clone().expect("request sent");
        assert_eq!(request.project_name, "Reservas");
        assert_eq!(request.roles.len(), 2);
    }

    #[tokio::test]
    async fn all_candidates_filtered_triggers_fallback() {
        let fx = fixture().await;
        let provider = ScriptedProvider::new(Script::Candidates(vec![candidate(
            fx.designer.id,
            12,
            "Diseño",
        )]));
        let generator = ScopeGenerator::new(fx.repos.clone(), provider);

        let items = generator
            .generate_scope(&fx.project, fx.quote_id, "reservas", &ids(&[&fx.qa]))
            .await
            .expect("generate");

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].role_id, fx.qa.id);
        assert_eq!(items[0].manual_hours, Decimal::new(8, 0));
    }

    #[tokio::test]
    async fn generated_items_keep_their_rate_after_catalog_changes() {
        let fx = fixture().await;
        let provider =
            ScriptedProvider::new(Script::Candidates(vec![candidate(fx.backend.id, 20, "API")]));
        let generator = ScopeGenerator::new(fx.repos.clone(), provider);

        generator
            .generate_scope(&fx.project, fx.quote_id, "api", &ids(&[&fx.backend]))
            .await
            .expect("generate");
        fx.repos
            .roles
            .update(
                fx.backend.id,
                NewRole { name: fx.backend.name.clone(), hourly_rate: Decimal::new(60, 0) },
            )
            .await
            .expect("rate change");

        let stored = fx.repos.line_items.list_for_quote(fx.quote_id).await.expect("list");
        assert_eq!(stored[0].hourly_rate, Decimal::new(40, 0));
    }

    #[tokio::test]
    async fn unknown_quote_is_not_found() {
        let fx = fixture().await;
        let provider = ScriptedProvider::new(Script::Candidates(Vec::new()));
        let generator = ScopeGenerator::new(fx.repos.clone(), provider.clone());

        let error = generator
            .generate_for_quote(QuoteId(404), "x", &[fx.backend.id])
            .await
            .expect_err("missing quote");

        assert!(matches!(error, ApplicationError::NotFound { entity: "quote", .. }));
        assert_eq!(provider.calls(), 0);
    }
}
