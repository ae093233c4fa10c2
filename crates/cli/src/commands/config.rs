use std::env;
use std::fs;
use std::path::Path;

use cotiza_core::config::{resolve_config_path, AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

/// One inspected setting: dotted file path, env keys in precedence order, rendered value.
struct Field {
    key_path: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(fields(&config).into_iter().map(|field| {
        let source = field_source(
            field.key_path,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        render_line(field.key_path, &field.value, source)
    }));

    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let api_key = match &config.llm.api_key {
        Some(secret) => redact_token(secret.expose_secret()),
        None => "<unset>".to_string(),
    };
    let allowed_origins = if config.server.allowed_origins.is_empty() {
        "<none>".to_string()
    } else {
        config.server.allowed_origins.join(",")
    };

    vec![
        Field {
            key_path: "database.url",
            env_keys: &["COTIZA_DATABASE_URL"],
            value: config.database.url.clone(),
        },
        Field {
            key_path: "database.max_connections",
            env_keys: &["COTIZA_DATABASE_MAX_CONNECTIONS"],
            value: config.database.max_connections.to_string(),
        },
        Field {
            key_path: "database.timeout_secs",
            env_keys: &["COTIZA_DATABASE_TIMEOUT_SECS"],
            value: config.database.timeout_secs.to_string(),
        },
        Field {
            key_path: "llm.provider",
            env_keys: &["COTIZA_LLM_PROVIDER"],
            value: format!("{:?}", config.llm.provider),
        },
        Field {
            key_path: "llm.model",
            env_keys: &["COTIZA_LLM_MODEL", "OPENAI_MODEL"],
            value: config.llm.model.clone(),
        },
        Field {
            key_path: "llm.base_url",
            env_keys: &["COTIZA_LLM_BASE_URL", "OPENAI_BASE_URL"],
            value: config.llm.base_url.clone().unwrap_or_else(|| {
                format!("<unset> ({})", config.llm.provider.default_base_url())
            }),
        },
        Field {
            key_path: "llm.api_key",
            env_keys: &["COTIZA_LLM_API_KEY", "OPENAI_API_KEY"],
            value: api_key,
        },
        Field {
            key_path: "llm.timeout_secs",
            env_keys: &["COTIZA_LLM_TIMEOUT_SECS"],
            value: config.llm.timeout_secs.to_string(),
        },
        Field {
            key_path: "llm.language",
            env_keys: &["COTIZA_LLM_LANGUAGE"],
            value: config.llm.language.clone(),
        },
        Field {
            key_path: "server.bind_address",
            env_keys: &["COTIZA_SERVER_BIND_ADDRESS"],
            value: config.server.bind_address.clone(),
        },
        Field {
            key_path: "server.port",
            env_keys: &["COTIZA_SERVER_PORT"],
            value: config.server.port.to_string(),
        },
        Field {
            key_path: "server.allowed_origins",
            env_keys: &["COTIZA_SERVER_ALLOWED_ORIGINS"],
            value: allowed_origins,
        },
        Field {
            key_path: "logging.level",
            env_keys: &["COTIZA_LOGGING_LEVEL", "COTIZA_LOG_LEVEL"],
            value: config.logging.level.clone(),
        },
        Field {
            key_path: "logging.format",
            env_keys: &["COTIZA_LOGGING_FORMAT", "COTIZA_LOG_FORMAT"],
            value: format!("{:?}", config.logging.format),
        },
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
