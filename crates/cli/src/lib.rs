pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "cotiza",
    about = "Cotiza operator CLI",
    long_about = "Operate the Cotiza quoting store: migrations, demo catalog, config inspection, and quote rendering.",
    after_help = "Examples:\n  cotiza migrate\n  cotiza seed\n  cotiza config\n  cotiza quote 1"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo role catalog and default financial settings")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Render a quote with its line items and computed totals as JSON")]
    Quote {
        #[arg(help = "Quote identifier")]
        id: i64,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Quote { id } => commands::quote::run(id),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
