use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};
use tras_agents::{
    build_providers, build_synthesizer_provider, ModelClient, ModelProvider, Orchestrator,
    ParseOutcome, RecommendationParser, RetryPolicy, SynthesisOutcome, SynthesisSkipped,
    Synthesizer,
};
use tras_models::{AgentsConfig, AnalysisRequest, ModelResponse, SynthesizedRecommendation, TradeSignal};
use uuid::Uuid;

use crate::error::TrasError;
use crate::sources::DocumentSource;

/// How far one analysis cycle got. Every variant is a normal return.
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// Documents could not be fetched; no provider was called.
    SourceFailed { detail: String, retryable: bool },
    /// Providers were called but synthesis did not happen.
    Skipped {
        responses: Vec<ModelResponse>,
        skipped: SynthesisSkipped,
    },
    Completed {
        responses: Vec<ModelResponse>,
        recommendation: SynthesizedRecommendation,
        parsed: ParseOutcome,
    },
}

impl CycleOutcome {
    pub fn run_id(&self) -> Option<Uuid> {
        match self {
            CycleOutcome::SourceFailed { .. } => None,
            CycleOutcome::Skipped { skipped, .. } => Some(skipped.run_id),
            CycleOutcome::Completed { recommendation, .. } => Some(recommendation.run_id),
        }
    }

    pub fn responses(&self) -> &[ModelResponse] {
        match self {
            CycleOutcome::SourceFailed { .. } => &[],
            CycleOutcome::Skipped { responses, .. } | CycleOutcome::Completed { responses, .. } => {
                responses
            }
        }
    }

    pub fn signals(&self) -> &[TradeSignal] {
        match self {
            CycleOutcome::Completed { parsed, .. } => &parsed.signals,
            _ => &[],
        }
    }
}

/// Documents → fan-out → synthesis → parsing, for one scheduled run.
pub struct AnalysisPipeline {
    documents: Arc<dyn DocumentSource>,
    providers: Vec<Arc<dyn ModelProvider>>,
    orchestrator: Orchestrator,
    synthesizer: Synthesizer,
    parser: RecommendationParser,
}

impl AnalysisPipeline {
    pub fn new(
        documents: Arc<dyn DocumentSource>,
        providers: Vec<Arc<dyn ModelProvider>>,
        orchestrator: Orchestrator,
        synthesizer: Synthesizer,
        parser: RecommendationParser,
    ) -> Self {
        Self {
            documents,
            providers,
            orchestrator,
            synthesizer,
            parser,
        }
    }

    /// Wire HTTP providers from configuration.
    pub fn from_config(
        config: &AgentsConfig,
        documents: Arc<dyn DocumentSource>,
        http: &reqwest::Client,
    ) -> Result<Self, TrasError> {
        let policy = RetryPolicy::from_config(config);
        let synthesizer = Synthesizer::new(ModelClient::new(
            build_synthesizer_provider(config, http)?,
            policy.clone(),
        ));
        Ok(Self::new(
            documents,
            build_providers(config, http),
            Orchestrator::new(policy),
            synthesizer,
            RecommendationParser::new()?,
        ))
    }

    pub fn provider_ids(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    pub async fn run_cycle(&self, now: DateTime<Utc>) -> CycleOutcome {
        let start = Instant::now();

        let documents = match self.documents.fetch_latest().await {
            Ok(docs) if !docs.is_empty() => docs,
            Ok(_) => {
                warn!(source = self.documents.name(), "No source documents, skipping cycle");
                return CycleOutcome::SourceFailed {
                    detail: "no documents".to_string(),
                    retryable: true,
                };
            }
            Err(e) => {
                let retryable = e.is_retryable();
                error!(source = self.documents.name(), error = %e, retryable, "Document fetch failed, skipping cycle");
                return CycleOutcome::SourceFailed {
                    detail: e.to_string(),
                    retryable,
                };
            }
        };

        let request = AnalysisRequest::new(documents, now);
        info!(
            run_id = %request.run_id,
            documents = request.documents.len(),
            "Analysis cycle started"
        );

        let responses = self.orchestrator.run(&request, &self.providers).await;
        let outcome = match self.synthesizer.synthesize(&request, &responses).await {
            SynthesisOutcome::Skipped(skipped) => {
                warn!(run_id = %request.run_id, reason = %skipped.reason, detail = %skipped.detail, "Synthesis skipped");
                CycleOutcome::Skipped { responses, skipped }
            }
            SynthesisOutcome::Synthesized(recommendation) => {
                let parsed = self.parser.parse(&recommendation);
                CycleOutcome::Completed {
                    responses,
                    recommendation,
                    parsed,
                }
            }
        };

        info!(
            run_id = %request.run_id,
            signals = outcome.signals().len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Analysis cycle finished"
        );
        outcome
    }
}
