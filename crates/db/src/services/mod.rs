//! Application operations over the record store. Each service validates its
//! input, talks to the repositories and maps failures into `ApplicationError`.

pub mod projects;
pub mod quotes;
pub mod roles;
pub mod settings;

pub use projects::ProjectService;
pub use quotes::QuoteService;
pub use roles::RoleService;
pub use settings::SettingsService;
