use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which HTTP API a model provider speaks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Gemini,
}

/// Configuration for the model fan-out and synthesis layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentsConfig {
    /// Attempts per provider call, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each further retry.
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,
    /// Upper bound for a single backoff delay.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Timeout applied to each individual attempt.
    #[serde(default = "default_attempt_timeout")]
    pub attempt_timeout_seconds: u64,
    /// Provider id used for the synthesis call. May name a provider that is
    /// not enabled for the fan-out.
    pub synthesizer: String,
    pub providers: Vec<ProviderConfig>,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_backoff_ms: default_base_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            attempt_timeout_seconds: default_attempt_timeout(),
            synthesizer: "gemini".to_string(),
            providers: vec![
                ProviderConfig {
                    id: "chatgpt".to_string(),
                    kind: ProviderKind::OpenAi,
                    model: "gpt-4o-mini".to_string(),
                    api_key_env: "OPENAI_API_KEY".to_string(),
                    base_url: None,
                    max_tokens: default_max_tokens(),
                    enabled: true,
                },
                ProviderConfig {
                    id: "gemini".to_string(),
                    kind: ProviderKind::Gemini,
                    model: "gemini-2.0-flash".to_string(),
                    api_key_env: "GOOGLE_API_KEY".to_string(),
                    base_url: None,
                    max_tokens: default_max_tokens(),
                    enabled: true,
                },
                ProviderConfig {
                    id: "claude".to_string(),
                    kind: ProviderKind::Anthropic,
                    model: "claude-3-5-sonnet-latest".to_string(),
                    api_key_env: "ANTHROPIC_API_KEY".to_string(),
                    base_url: None,
                    max_tokens: default_max_tokens(),
                    enabled: true,
                },
            ],
        }
    }
}

impl AgentsConfig {
    pub fn provider(&self, id: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.id == id)
    }
}

/// Configuration for a single model provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderConfig {
    /// Stable id used in logs, provenance labels and the digest.
    pub id: String,
    pub kind: ProviderKind,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Override the provider's default API root.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Whether the provider takes part in the fan-out.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Configuration for live price monitoring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonitorConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Absolute tolerance around the entry, in pips.
    #[serde(default = "default_tolerance_pips")]
    pub tolerance_pips: Decimal,
    /// Relative tolerance around the entry, in percent of the entry price.
    #[serde(default = "default_tolerance_percent")]
    pub tolerance_percent: Decimal,
    /// How long fetched reference rates are reused.
    #[serde(default = "default_price_cache_ttl")]
    pub price_cache_ttl_seconds: u64,
    /// Attempts per notification sink before a delivery counts as failed.
    #[serde(default = "default_notify_attempts")]
    pub notify_attempts: u32,
    #[serde(default = "default_notify_backoff_ms")]
    pub notify_backoff_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval(),
            tolerance_pips: default_tolerance_pips(),
            tolerance_percent: default_tolerance_percent(),
            price_cache_ttl_seconds: default_price_cache_ttl(),
            notify_attempts: default_notify_attempts(),
            notify_backoff_ms: default_notify_backoff_ms(),
        }
    }
}

/// Wall-clock analysis schedule and loop cadence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleConfig {
    /// `HH:MM` local times, in `timezone`.
    #[serde(default = "default_analysis_times")]
    pub analysis_times: Vec<String>,
    /// IANA timezone name.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// How long after a slot it may still start.
    #[serde(default = "default_match_window")]
    pub match_window_minutes: u32,
    /// Cadence of the control loop.
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: u64,
    /// Log a status line every this many ticks.
    #[serde(default = "default_status_every")]
    pub status_every_ticks: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            analysis_times: default_analysis_times(),
            timezone: default_timezone(),
            match_window_minutes: default_match_window(),
            tick_seconds: default_tick_seconds(),
            status_every_ticks: default_status_every(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}
fn default_base_backoff_ms() -> u64 {
    2_000
}
fn default_max_backoff_ms() -> u64 {
    30_000
}
fn default_attempt_timeout() -> u64 {
    60
}
fn default_max_tokens() -> u32 {
    4_000
}
fn default_true() -> bool {
    true
}
fn default_poll_interval() -> u64 {
    60
}
fn default_tolerance_pips() -> Decimal {
    Decimal::TEN
}
fn default_tolerance_percent() -> Decimal {
    Decimal::new(1, 1)
}
fn default_price_cache_ttl() -> u64 {
    60
}
fn default_notify_attempts() -> u32 {
    3
}
fn default_notify_backoff_ms() -> u64 {
    500
}
fn default_analysis_times() -> Vec<String> {
    ["07:00", "09:00", "12:00", "16:00"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_timezone() -> String {
    "America/New_York".to_string()
}
fn default_match_window() -> u32 {
    5
}
fn default_tick_seconds() -> u64 {
    5
}
fn default_status_every() -> u64 {
    120
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn default_agents_config_has_three_providers() {
        let agents = AgentsConfig::default();
        assert_eq!(agents.providers.len(), 3);
        assert!(agents.providers.iter().all(|p| p.enabled));
        assert!(agents.provider(&agents.synthesizer).is_some());
    }

    #[test]
    fn agents_config_from_toml_applies_defaults() {
        let toml_str = r#"
synthesizer = "claude"

[[providers]]
id = "claude"
kind = "anthropic"
model = "claude-3-5-haiku-latest"
api_key_env = "ANTHROPIC_API_KEY"

[[providers]]
id = "chatgpt"
kind = "openai"
model = "gpt-4o-mini"
api_key_env = "OPENAI_API_KEY"
enabled = false
"#;
        let agents: AgentsConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(agents.max_attempts, 3);
        assert_eq!(agents.attempt_timeout_seconds, 60);
        assert_eq!(agents.providers[0].kind, ProviderKind::Anthropic);
        assert_eq!(agents.providers[0].max_tokens, 4000);
        assert!(agents.providers[0].enabled);
        assert!(!agents.providers[1].enabled);
    }

    #[test]
    fn monitor_config_defaults() {
        let monitor: MonitorConfig = toml::from_str("").unwrap();
        assert_eq!(monitor, MonitorConfig::default());
        assert_eq!(monitor.tolerance_pips, dec!(10));
        assert_eq!(monitor.tolerance_percent, dec!(0.1));
    }

    #[test]
    fn schedule_config_overrides() {
        let schedule: ScheduleConfig = toml::from_str(
            r#"
analysis_times = ["08:30"]
timezone = "Europe/London"
"#,
        )
        .unwrap();
        assert_eq!(schedule.analysis_times, vec!["08:30"]);
        assert_eq!(schedule.timezone, "Europe/London");
        assert_eq!(schedule.match_window_minutes, 5);
        assert_eq!(schedule.tick_seconds, 5);
    }
}
