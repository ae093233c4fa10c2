//! Domain model, role directory and pricing cascade for software quotes.
//!
//! Everything in this crate is synchronous and free of I/O apart from
//! configuration loading; persistence lives in `cotiza-db` and the
//! text-generation integration in `cotiza-agent`.

pub mod config;
pub mod cpq;
pub mod domain;
pub mod errors;

pub use cpq::{
    compute_totals, DeterministicPricingEngine, PricingBreakdown, PricingEngine, PricingResult,
    RoleDirectory,
};
pub use domain::line_item::{LineItem, LineItemId, LineItemInput, NewLineItem};
pub use domain::project::{NewProject, Project, ProjectId, ProjectStatus};
pub use domain::quote::{FinancialParameters, NewQuote, Quote, QuoteId};
pub use domain::role::{NewRole, Role, RoleId};
pub use domain::setting::Setting;
pub use errors::{ApplicationError, DomainError, InterfaceError};
