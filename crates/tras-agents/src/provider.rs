use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, info, warn};
use tras_models::config::{AgentsConfig, ProviderConfig, ProviderKind};

use crate::error::{AgentError, ProviderError};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// One language-model backend. Mockable for testing.
///
/// A single call is one attempt; retry, backoff and timeout live in
/// [`crate::client::ModelClient`].
#[async_trait]
pub trait ModelProvider: Send + Sync {
    fn id(&self) -> &str;

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ProviderError>;
}

/// A provider reached over its public HTTP API.
pub struct HttpProvider {
    config: ProviderConfig,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl HttpProvider {
    /// Build from config, reading the API key from the named environment
    /// variable. A missing key does not fail construction; calls then
    /// report [`ProviderError::Disabled`].
    pub fn from_config(config: ProviderConfig, http: reqwest::Client) -> Self {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            warn!(
                provider = %config.id,
                env = %config.api_key_env,
                "API key not set, provider calls will fail"
            );
        }
        Self {
            config,
            api_key,
            http,
        }
    }

    pub fn with_api_key(config: ProviderConfig, api_key: String, http: reqwest::Client) -> Self {
        Self {
            config,
            api_key: Some(api_key),
            http,
        }
    }

    fn base_url(&self) -> &str {
        match (&self.config.base_url, self.config.kind) {
            (Some(url), _) => url.trim_end_matches('/'),
            (None, ProviderKind::OpenAi) => OPENAI_BASE_URL,
            (None, ProviderKind::Anthropic) => ANTHROPIC_BASE_URL,
            (None, ProviderKind::Gemini) => GEMINI_BASE_URL,
        }
    }

    fn request(&self, api_key: &str, system: &str, prompt: &str) -> reqwest::RequestBuilder {
        let base = self.base_url();
        match self.config.kind {
            ProviderKind::OpenAi => self
                .http
                .post(format!("{base}/chat/completions"))
                .bearer_auth(api_key)
                .json(&serde_json::json!({
                    "model": self.config.model,
                    "messages": [
                        {"role": "system", "content": system},
                        {"role": "user", "content": prompt}
                    ],
                    "max_tokens": self.config.max_tokens,
                    "temperature": 0.7
                })),
            ProviderKind::Anthropic => self
                .http
                .post(format!("{base}/messages"))
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&serde_json::json!({
                    "model": self.config.model,
                    "max_tokens": self.config.max_tokens,
                    "system": system,
                    "messages": [{"role": "user", "content": prompt}]
                })),
            ProviderKind::Gemini => self
                .http
                .post(format!(
                    "{base}/models/{}:generateContent",
                    self.config.model
                ))
                .header("x-goog-api-key", api_key)
                .json(&serde_json::json!({
                    "systemInstruction": {"parts": [{"text": system}]},
                    "contents": [{"role": "user", "parts": [{"text": prompt}]}],
                    "generationConfig": {"maxOutputTokens": self.config.max_tokens}
                })),
        }
    }
}

#[async_trait]
impl ModelProvider for HttpProvider {
    fn id(&self) -> &str {
        &self.config.id
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ProviderError::Disabled(format!("{} is not set", self.config.api_key_env))
        })?;

        debug!(provider = %self.config.id, model = %self.config.model, "Calling provider");

        let response = self
            .request(api_key, system, prompt)
            .send()
            .await
            .map_err(|e| ProviderError::Transient(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body, &self.config.model, retry_after));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Transient(format!("unreadable response body: {e}")))?;

        extract_text(self.config.kind, &json)
    }
}

/// Map a non-success HTTP status to the provider error taxonomy.
pub fn classify_status(
    status: StatusCode,
    body: &str,
    model: &str,
    retry_after_secs: Option<u64>,
) -> ProviderError {
    let detail = format!("HTTP {}: {}", status.as_u16(), truncate(body, 300));
    match status {
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited { retry_after_secs },
        StatusCode::NOT_FOUND => ProviderError::NotFound(format!("{model} ({detail})")),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Unauthorized(detail),
        StatusCode::REQUEST_TIMEOUT => ProviderError::Transient(detail),
        s if s.is_server_error() => ProviderError::Transient(detail),
        _ => ProviderError::BadRequest(detail),
    }
}

/// Pull the completion text out of a provider's JSON response.
pub fn extract_text(kind: ProviderKind, json: &serde_json::Value) -> Result<String, ProviderError> {
    let text = match kind {
        ProviderKind::OpenAi => json["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string),
        ProviderKind::Anthropic => json["content"].as_array().map(|blocks| {
            blocks
                .iter()
                .filter_map(|b| b["text"].as_str())
                .collect::<Vec<_>>()
                .join("")
        }),
        ProviderKind::Gemini => json["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("")
            }),
    };

    match text {
        Some(t) if !t.trim().is_empty() => Ok(t),
        _ => Err(ProviderError::Transient(
            "response contained no completion text".to_string(),
        )),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// Providers enabled for the fan-out, in config order.
pub fn build_providers(
    config: &AgentsConfig,
    http: &reqwest::Client,
) -> Vec<Arc<dyn ModelProvider>> {
    let providers: Vec<Arc<dyn ModelProvider>> = config
        .providers
        .iter()
        .filter(|p| p.enabled)
        .map(|p| {
            Arc::new(HttpProvider::from_config(p.clone(), http.clone())) as Arc<dyn ModelProvider>
        })
        .collect();
    info!(count = providers.len(), "Configured fan-out providers");
    providers
}

/// The provider named as synthesizer, whether or not it is in the fan-out.
pub fn build_synthesizer_provider(
    config: &AgentsConfig,
    http: &reqwest::Client,
) -> Result<Arc<dyn ModelProvider>, AgentError> {
    let provider = config.provider(&config.synthesizer).ok_or_else(|| {
        AgentError::Config(format!(
            "synthesizer '{}' is not a configured provider",
            config.synthesizer
        ))
    })?;
    Ok(Arc::new(HttpProvider::from_config(
        provider.clone(),
        http.clone(),
    )))
}
