use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use tras_models::analysis::{AnalysisRequest, ModelResponse, SynthesizedRecommendation};

use crate::client::ModelClient;
use crate::prompts::{synthesis_prompt, SYNTHESIZER_SYSTEM_PROMPT};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No provider returned an `Ok` response.
    NoSuccessfulResponses,
    /// The synthesis call itself failed after retries.
    SynthesizerFailed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoSuccessfulResponses => f.write_str("no provider succeeded"),
            SkipReason::SynthesizerFailed => f.write_str("synthesizer call failed"),
        }
    }
}

/// Reported, non-fatal end of a run's pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SynthesisSkipped {
    pub run_id: Uuid,
    pub reason: SkipReason,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisOutcome {
    Synthesized(SynthesizedRecommendation),
    Skipped(SynthesisSkipped),
}

impl SynthesisOutcome {
    pub fn recommendation(&self) -> Option<&SynthesizedRecommendation> {
        match self {
            SynthesisOutcome::Synthesized(rec) => Some(rec),
            SynthesisOutcome::Skipped(_) => None,
        }
    }
}

/// Reconciles successful provider responses through one designated provider.
pub struct Synthesizer {
    client: ModelClient,
}

impl Synthesizer {
    pub fn new(client: ModelClient) -> Self {
        Self { client }
    }

    pub async fn synthesize(
        &self,
        request: &AnalysisRequest,
        responses: &[ModelResponse],
    ) -> SynthesisOutcome {
        let ok: Vec<&ModelResponse> = responses.iter().filter(|r| r.is_ok()).collect();
        if ok.is_empty() {
            warn!(
                run_id = %request.run_id,
                responses = responses.len(),
                "No successful responses, skipping synthesis"
            );
            return SynthesisOutcome::Skipped(SynthesisSkipped {
                run_id: request.run_id,
                reason: SkipReason::NoSuccessfulResponses,
                detail: format!("0 of {} providers succeeded", responses.len()),
            });
        }

        let sources: Vec<String> = ok.iter().map(|r| r.provider_id.clone()).collect();
        let prompt = synthesis_prompt(request, &ok);
        let result = self.client.complete(SYNTHESIZER_SYSTEM_PROMPT, &prompt).await;

        match result.text {
            Some(text) if result.is_ok() => {
                info!(
                    run_id = %request.run_id,
                    synthesizer = %result.provider_id,
                    sources = ?sources,
                    "Synthesis complete"
                );
                SynthesisOutcome::Synthesized(SynthesizedRecommendation {
                    run_id: request.run_id,
                    text,
                    sources,
                    synthesizer: result.provider_id,
                    produced_at: Utc::now(),
                })
            }
            _ => {
                let detail = result
                    .error_detail
                    .unwrap_or_else(|| "synthesizer returned no text".to_string());
                warn!(run_id = %request.run_id, error = %detail, "Synthesis failed");
                SynthesisOutcome::Skipped(SynthesisSkipped {
                    run_id: request.run_id,
                    reason: SkipReason::SynthesizerFailed,
                    detail,
                })
            }
        }
    }
}
