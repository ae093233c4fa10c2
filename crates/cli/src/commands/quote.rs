use cotiza_core::domain::quote::QuoteId;
use cotiza_core::errors::ApplicationError;
use cotiza_db::{QuoteAggregator, Repositories};

use crate::commands::{build_runtime, load_config, open_migrated_pool, CommandResult};

/// Prints the rendered quote (items, enrichment and totals) as JSON.
pub fn run(quote_id: i64) -> CommandResult {
    let config = match load_config("quote") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("quote") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_migrated_pool(&config).await?;
        let rendered = QuoteAggregator::new(Repositories::sql(pool.clone()))
            .render_quote(QuoteId(quote_id))
            .await
            .map_err(|error| match error {
                ApplicationError::NotFound { .. } => ("not_found", error.to_string(), 7u8),
                other => ("quote_render", other.to_string(), 6u8),
            });
        pool.close().await;
        rendered
    });

    match result {
        Ok(view) => match serde_json::to_string_pretty(&view) {
            Ok(output) => CommandResult { exit_code: 0, output },
            Err(error) => CommandResult::failure("quote", "serialization", error.to_string(), 8),
        },
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("quote", error_class, message, exit_code)
        }
    }
}
