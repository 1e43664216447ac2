pub mod client;
pub mod error;
pub mod extract;
pub mod orchestrator;
pub mod parser;
pub mod price_text;
pub mod prompts;
pub mod provider;
pub mod synthesizer;

pub mod test_support;

pub use client::{ModelClient, RetryPolicy};
pub use error::{AgentError, ProviderError};
pub use orchestrator::Orchestrator;
pub use parser::{ParseIssue, ParseOutcome, ParseWarning, RecommendationParser};
pub use provider::{build_providers, build_synthesizer_provider, HttpProvider, ModelProvider};
pub use synthesizer::{SkipReason, SynthesisOutcome, SynthesisSkipped, Synthesizer};
