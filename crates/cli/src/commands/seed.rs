use cotiza_db::{DemoSeed, Repositories, SeedResult};

use crate::commands::{build_runtime, load_config, open_migrated_pool, CommandResult, StepFailure};

pub fn run() -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("seed") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_migrated_pool(&config).await?;
        let repos = Repositories::sql(pool.clone());

        let run_result = async {
            let seeded = DemoSeed::load(&repos)
                .await
                .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;
            let verification = DemoSeed::verify(&repos)
                .await
                .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

            if !verification.all_present {
                let failed_checks = verification
                    .checks
                    .iter()
                    .filter_map(|(check, passed)| (!passed).then_some(*check))
                    .collect::<Vec<_>>();
                return Err(("seed_verification", verification_message(&failed_checks), 6u8));
            }
            Ok::<SeedResult, StepFailure>(seeded)
        }
        .await;

        pool.close().await;
        run_result
    });

    match result {
        Ok(seeded) => CommandResult::success("seed", summary(&seeded)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn verification_message(failed_checks: &[&str]) -> String {
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}

fn summary(seeded: &SeedResult) -> String {
    if seeded.roles_created.is_empty() && seeded.settings_created.is_empty() {
        return "demo catalog already present; nothing to seed".to_string();
    }

    let mut lines = vec!["demo catalog seeded:".to_string()];
    lines.extend(seeded.roles_created.iter().map(|name| format!("  - role: {name}")));
    lines.extend(seeded.settings_created.iter().map(|key| format!("  - setting: {key}")));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use cotiza_db::SeedResult;

    use super::{summary, verification_message};

    #[test]
    fn verification_error_message_targets_failed_checks() {
        assert_eq!(
            verification_message(&["QA Engineer", "default_tax"]),
            "Seed verification failed for checks: QA Engineer, default_tax"
        );
        assert_eq!(verification_message(&[]), "Some seed data failed to load");
    }

    #[test]
    fn summary_lists_created_records() {
        let message = summary(&SeedResult {
            roles_created: vec!["Project Manager"],
            settings_created: vec!["default_margin"],
        });

        assert!(message.contains("  - role: Project Manager"));
        assert!(message.contains("  - setting: default_margin"));
        assert_eq!(
            summary(&SeedResult { roles_created: Vec::new(), settings_created: Vec::new() }),
            "demo catalog already present; nothing to seed"
        );
    }
}
