use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use cotiza_core::config::LlmConfig;
use cotiza_core::domain::role::RoleId;

use crate::prompt::{system_policy, user_context};

/// Role offered to the provider. Rates are deliberately absent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScopeRole {
    pub id: RoleId,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScopeRequest {
    pub project_name: String,
    pub requirements: String,
    pub roles: Vec<ScopeRole>,
}

/// One suggested line as returned by the provider, before any filtering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScopeCandidate {
    /// `None` when the provider sent something that is not a role id.
    pub role_id: Option<RoleId>,
    pub description: Option<String>,
    pub hours: Option<Decimal>,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("missing api key for {0}")]
    MissingCredentials(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("provider returned HTTP {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Working language used when none is configured.
pub const DEFAULT_WORKING_LANGUAGE: &str = "Spanish";

/// Single-attempt source of scope suggestions.
#[async_trait]
pub trait ScopeProvider: Send + Sync {
    async fn suggest(&self, request: &ScopeRequest) -> Result<Vec<ScopeCandidate>, ProviderError>;

    /// Language the provider is asked to write descriptions in.
    fn working_language(&self) -> &str {
        DEFAULT_WORKING_LANGUAGE
    }
}

/// OpenAI-compatible chat-completions client (OpenAI, OpenRouter, Ollama).
pub struct ChatCompletionsProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    language: String,
    api_key: Option<SecretString>,
    requires_api_key: bool,
    provider_name: String,
}

impl ChatCompletionsProvider {
    pub fn from_config(config: &LlmConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|error| ProviderError::Transport(error.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint().trim_end_matches('/').to_string(),
            model: config.model.clone(),
            language: config.language.clone(),
            api_key: config
                .api_key
                .clone()
                .filter(|key| !key.expose_secret().trim().is_empty()),
            requires_api_key: config.provider.requires_api_key(),
            provider_name: format!("{:?}", config.provider),
        })
    }

    fn request_body(&self, request: &ScopeRequest) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_policy(&self.language) },
                { "role": "user", "content": user_context(request) },
            ],
            "response_format": { "type": "json_object" },
        })
    }
}

#[async_trait]
impl ScopeProvider for ChatCompletionsProvider {
    fn working_language(&self) -> &str {
        &self.language
    }

    async fn suggest(&self, request: &ScopeRequest) -> Result<Vec<ScopeCandidate>, ProviderError> {
        if self.requires_api_key && self.api_key.is_none() {
            return Err(ProviderError::MissingCredentials(self.provider_name.clone()));
        }

        let mut http = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .json(&self.request_body(request));
        if let Some(key) = &self.api_key {
            http = http.bearer_auth(key.expose_secret());
        }

        let response =
            http.send().await.map_err(|error| ProviderError::Transport(error.to_string()))?;
        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|error| ProviderError::Malformed(format!("response body: {error}")))?;
        let content = payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::Malformed("no message content".to_string()))?;

        parse_candidates(content)
    }
}

/// Parses the provider's JSON answer. Individual fields are read leniently;
/// only a missing `items` list is an error.
pub fn parse_candidates(content: &str) -> Result<Vec<ScopeCandidate>, ProviderError> {
    let document: Value = serde_json::from_str(content.trim())
        .map_err(|error| ProviderError::Malformed(format!("content is not JSON: {error}")))?;
    let items = document
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::Malformed("missing `items` list".to_string()))?;

    Ok(items
        .iter()
        .map(|item| ScopeCandidate {
            role_id: item.get("role_id").and_then(parse_role_id),
            description: item
                .get("description")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_owned),
            hours: item.get("hours").and_then(parse_decimal),
        })
        .collect())
}

fn parse_role_id(value: &Value) -> Option<RoleId> {
    match value {
        Value::Number(number) => number.as_i64().map(RoleId),
        Value::String(text) => text.trim().parse::<i64>().ok().map(RoleId),
        _ => None,
    }
}

fn parse_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text)).ok()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use secrecy::SecretString;

    use cotiza_core::config::{LlmConfig, LlmProvider};
    use cotiza_core::domain::role::RoleId;

    use super::{parse_candidates, ChatCompletionsProvider, ProviderError, ScopeProvider};
    use crate::llm::{ScopeRequest, ScopeRole};

    fn config(provider: LlmProvider, api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            provider,
            api_key: api_key.map(|key| SecretString::from(key.to_string())),
            base_url: Some("http://127.0.0.1:9/v1/".to_string()),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 1,
            language: "Spanish".to_string(),
        }
    }

    fn request() -> ScopeRequest {
        ScopeRequest {
            project_name: "CRM".to_string(),
            requirements: "contactos".to_string(),
            roles: vec![ScopeRole { id: RoleId(1), name: "Backend Developer".to_string() }],
        }
    }

    #[test]
    fn candidates_are_parsed_leniently() {
        let content = r#"{"items": [
            {"role_id": 2, "description": "Autenticación y perfiles", "hours": 24.5},
            {"role_id": "3", "description": "  ", "hours": "16"},
            {"role_id": "lead", "hours": -4},
            {"description": "Sin rol"}
        ]}"#;

        let candidates = parse_candidates(content).expect("parse");

        assert_eq!(candidates.len(), 4);
        assert_eq!(candidates[0].role_id, Some(RoleId(2)));
        assert_eq!(candidates[0].hours, Some(Decimal::new(245, 1)));
        assert_eq!(candidates[1].role_id, Some(RoleId(3)));
        assert_eq!(candidates[1].description, None);
        assert_eq!(candidates[1].hours, Some(Decimal::new(16, 0)));
        assert_eq!(candidates[2].role_id, None);
        assert_eq!(candidates[2].hours, Some(Decimal::new(-4, 0)));
        assert_eq!(candidates[3].hours, None);
    }

    #[test]
    fn non_json_or_missing_items_is_malformed() {
        assert!(matches!(parse_candidates("Claro, aquí está"), Err(ProviderError::Malformed(_))));
        assert!(matches!(parse_candidates(r#"{"tasks": []}"#), Err(ProviderError::Malformed(_))));
    }

    #[test]
    fn request_body_uses_json_mode_and_both_messages() {
        let provider =
            ChatCompletionsProvider::from_config(&config(LlmProvider::OpenAi, Some("sk-test")))
                .expect("provider");

        let body = provider.request_body(&request());

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(provider.endpoint, "http://127.0.0.1:9/v1");
    }

    #[test]
    fn working_language_comes_from_config() {
        let provider = ChatCompletionsProvider::from_config(&LlmConfig {
            language: "English".to_string(),
            ..config(LlmProvider::Ollama, None)
        })
        .expect("provider");

        assert_eq!(provider.working_language(), "English");
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let provider = ChatCompletionsProvider::from_config(&config(LlmProvider::OpenRouter, None))
            .expect("provider");

        let error = provider.suggest(&request()).await.expect_err("no key");
        assert!(matches!(error, ProviderError::MissingCredentials(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let provider = ChatCompletionsProvider::from_config(&config(LlmProvider::Ollama, None))
            .expect("provider");

        let error = provider.suggest(&request()).await.expect_err("nothing listens on port 9");
        assert!(matches!(error, ProviderError::Transport(_)));
    }
}
