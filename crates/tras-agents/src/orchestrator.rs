use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};
use tras_models::analysis::{AnalysisRequest, ModelResponse, ResponseStatus};

use crate::client::{ModelClient, RetryPolicy};
use crate::provider::ModelProvider;

/// Fans one analysis request out to every configured provider.
pub struct Orchestrator {
    policy: RetryPolicy,
}

impl Orchestrator {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Call every provider concurrently and return one response per
    /// provider, in the order given.
    ///
    /// Each provider runs in its own task with its own retry state, so a
    /// slow or failing provider never holds up the others. This only
    /// returns once every provider has answered or given up.
    pub async fn run(
        &self,
        request: &AnalysisRequest,
        providers: &[Arc<dyn ModelProvider>],
    ) -> Vec<ModelResponse> {
        if providers.is_empty() {
            warn!(run_id = %request.run_id, "No providers configured, skipping fan-out");
            return Vec::new();
        }

        let start = Instant::now();
        info!(
            run_id = %request.run_id,
            providers = providers.len(),
            documents = request.documents.len(),
            "Starting provider fan-out"
        );

        let request = Arc::new(request.clone());
        let mut handles = Vec::with_capacity(providers.len());
        for provider in providers {
            let id = provider.id().to_string();
            let client = ModelClient::new(Arc::clone(provider), self.policy.clone());
            let request = Arc::clone(&request);
            handles.push((
                id,
                tokio::spawn(async move { client.call(&request).await }),
            ));
        }

        let mut responses = Vec::with_capacity(handles.len());
        for (id, handle) in handles {
            match handle.await {
                Ok(response) => responses.push(response),
                Err(e) => {
                    error!(provider = %id, error = %e, "Provider task panicked");
                    responses.push(ModelResponse::failed(
                        &id,
                        ResponseStatus::Failed,
                        format!("provider task aborted: {e}"),
                        start.elapsed().as_millis() as u64,
                        0,
                    ));
                }
            }
        }

        let ok = responses.iter().filter(|r| r.is_ok()).count();
        info!(
            run_id = %request.run_id,
            ok,
            failed = responses.len() - ok,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Provider fan-out complete"
        );
        responses
    }
}
