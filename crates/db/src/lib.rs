pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;
pub mod services;
pub mod views;

pub use connection::{connect, connect_with_config, connect_with_settings, DbPool};
pub use fixtures::{DemoSeed, SeedResult, VerificationResult};
pub use repositories::{Repositories, RepositoryError};
pub use services::{ProjectService, QuoteService, RoleService, SettingsService};
pub use views::{QuoteAggregator, QuoteView, QuoteViewItem};
