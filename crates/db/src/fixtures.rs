use rust_decimal::Decimal;

use cotiza_core::domain::role::NewRole;
use cotiza_core::domain::setting::{Setting, DEFAULT_MARGIN_KEY, DEFAULT_RISK_KEY, DEFAULT_TAX_KEY};

use crate::repositories::{Repositories, RepositoryError};

/// Starter role catalog: name and hourly rate in whole currency units.
const SEED_ROLES: &[(&str, i64)] = &[
    ("Project Manager", 45),
    ("Backend Developer", 40),
    ("Frontend Developer", 38),
    ("QA Engineer", 30),
    ("UX/UI Designer", 35),
];

/// Default financial parameters as (key, hundredths).
const SEED_SETTINGS: &[(&str, i64)] =
    &[(DEFAULT_MARGIN_KEY, 30), (DEFAULT_RISK_KEY, 10), (DEFAULT_TAX_KEY, 16)];

/// Demo catalog and financial defaults for a fresh installation.
///
/// Loading is idempotent: roles are matched by name and existing settings are
/// left untouched, so operator edits survive a re-seed.
pub struct DemoSeed;

impl DemoSeed {
    pub async fn load(repos: &Repositories) -> Result<SeedResult, RepositoryError> {
        let mut roles_created = Vec::new();
        for (name, rate) in SEED_ROLES {
            if repos.roles.find_by_name(name).await?.is_some() {
                continue;
            }
            repos
                .roles
                .create(NewRole { name: (*name).to_string(), hourly_rate: Decimal::new(*rate, 0) })
                .await?;
            roles_created.push(*name);
        }

        let mut settings_created = Vec::new();
        for (key, hundredths) in SEED_SETTINGS {
            if repos.settings.find(key).await?.is_some() {
                continue;
            }
            repos
                .settings
                .upsert(Setting {
                    key: (*key).to_string(),
                    value_text: None,
                    value_float: Some(Decimal::new(*hundredths, 2)),
                })
                .await?;
            settings_created.push(*key);
        }

        Ok(SeedResult { roles_created, settings_created })
    }

    pub async fn verify(repos: &Repositories) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();
        for (name, _) in SEED_ROLES {
            checks.push((*name, repos.roles.find_by_name(name).await?.is_some()));
        }
        for (key, _) in SEED_SETTINGS {
            checks.push((*key, repos.settings.find(key).await?.is_some()));
        }

        let all_present = checks.iter().all(|(_, present)| *present);
        Ok(VerificationResult { all_present, checks })
    }
}

#[derive(Debug)]
pub struct SeedResult {
    pub roles_created: Vec<&'static str>,
    pub settings_created: Vec<&'static str>,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
