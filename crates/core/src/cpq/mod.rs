pub mod directory;
pub mod pricing;

pub use directory::RoleDirectory;
pub use pricing::{
    compute_totals, DeterministicPricingEngine, PricingBreakdown, PricingEngine, PricingResult,
    PricingTrace, PricingTraceStep,
};
