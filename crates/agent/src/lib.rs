//! Scope generation: turns free-text requirements into estimated line items.
//!
//! The text-generation provider is strictly a suggester. It proposes
//! groupings and hours; role membership, rates and persistence are decided
//! here, and any provider failure degrades to a deterministic baseline.
//!
//! - `llm` - provider seam and the chat-completions client
//! - `prompt` - the versioned estimation policy sent with every request
//! - `guardrails` - filtering and normalisation of provider candidates
//! - `scope` - the generator that ties them to the record store

pub mod guardrails;
pub mod llm;
pub mod prompt;
pub mod scope;

pub use llm::{ChatCompletionsProvider, ProviderError, ScopeCandidate, ScopeProvider, ScopeRequest};
pub use scope::ScopeGenerator;
