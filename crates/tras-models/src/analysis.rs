use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One piece of source commentary fed to the models.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceDocument {
    pub name: String,
    pub content: String,
}

/// Immutable snapshot of source material for one scheduled run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisRequest {
    /// Identifies the run; carried into every signal it produces.
    pub run_id: Uuid,
    pub documents: Vec<SourceDocument>,
    pub requested_at: DateTime<Utc>,
}

impl AnalysisRequest {
    pub fn new(documents: Vec<SourceDocument>, requested_at: DateTime<Utc>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            documents,
            requested_at,
        }
    }

    /// All documents joined under `=== name ===` headings.
    pub fn combined_text(&self) -> String {
        self.documents
            .iter()
            .map(|d| format!("=== {} ===\n{}\n", d.name, d.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Ok,
    Failed,
    TimedOut,
}

/// Outcome of one provider call, after retries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelResponse {
    pub provider_id: String,
    pub status: ResponseStatus,
    /// Response text when `status` is `Ok`.
    pub text: Option<String>,
    /// Last error seen when `status` is not `Ok`.
    pub error_detail: Option<String>,
    pub latency_ms: u64,
    pub attempt_count: u32,
}

impl ModelResponse {
    pub fn ok(provider_id: &str, text: String, latency_ms: u64, attempt_count: u32) -> Self {
        Self {
            provider_id: provider_id.to_string(),
            status: ResponseStatus::Ok,
            text: Some(text),
            error_detail: None,
            latency_ms,
            attempt_count,
        }
    }

    pub fn failed(
        provider_id: &str,
        status: ResponseStatus,
        error: String,
        latency_ms: u64,
        attempt_count: u32,
    ) -> Self {
        Self {
            provider_id: provider_id.to_string(),
            status,
            text: None,
            error_detail: Some(error),
            latency_ms,
            attempt_count,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ResponseStatus::Ok && self.text.is_some()
    }
}

/// The single reconciled recommendation text for a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SynthesizedRecommendation {
    pub run_id: Uuid,
    pub text: String,
    /// Providers whose `Ok` responses went into the synthesis.
    pub sources: Vec<String>,
    /// Provider that produced the synthesis itself.
    pub synthesizer: String,
    pub produced_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_text_labels_each_document() {
        let request = AnalysisRequest::new(
            vec![
                SourceDocument {
                    name: "summary_0800.json".to_string(),
                    content: "EUR/USD trending up".to_string(),
                },
                SourceDocument {
                    name: "report.txt".to_string(),
                    content: "JPY weakness".to_string(),
                },
            ],
            Utc::now(),
        );
        let text = request.combined_text();
        assert!(text.contains("=== summary_0800.json ===\nEUR/USD trending up"));
        assert!(text.contains("=== report.txt ===\nJPY weakness"));
    }

    #[test]
    fn failed_response_is_not_ok() {
        let response =
            ModelResponse::failed("claude", ResponseStatus::TimedOut, "timed out".into(), 10, 3);
        assert!(!response.is_ok());
        assert_eq!(
            serde_json::to_value(response.status).unwrap(),
            serde_json::json!("timed_out")
        );
    }
}
