use std::path::Path;

use serde::{Deserialize, Serialize};
use tras_models::{AgentsConfig, MonitorConfig, ScheduleConfig};

use crate::error::TrasError;

/// Top-level daemon configuration, read from `config/tras.toml`.
///
/// Secrets are never stored here; sections name the environment variables
/// that hold them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrasConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub agents: AgentsConfig,
    pub documents: DocumentsConfig,
    #[serde(default)]
    pub prices: PriceFeedConfig,
    #[serde(default)]
    pub pushover: Option<PushoverConfig>,
    #[serde(default)]
    pub email: Option<EmailConfig>,
}

impl TrasConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, TrasError> {
        let config: TrasConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TrasError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    /// Cross-field checks serde cannot express.
    pub fn validate(&self) -> Result<(), TrasError> {
        if self.agents.provider(&self.agents.synthesizer).is_none() {
            return Err(TrasError::Config(format!(
                "synthesizer {:?} is not a configured provider",
                self.agents.synthesizer
            )));
        }
        if self.agents.max_attempts == 0 {
            return Err(TrasError::Config("agents.max_attempts must be at least 1".into()));
        }
        if self.schedule.tick_seconds == 0 || self.monitor.poll_interval_seconds == 0 {
            return Err(TrasError::Config(
                "schedule.tick_seconds and monitor.poll_interval_seconds must be positive".into(),
            ));
        }
        let mut ids: Vec<&str> = self.agents.providers.iter().map(|p| p.id.as_str()).collect();
        ids.sort_unstable();
        if ids.windows(2).any(|w| w[0] == w[1]) {
            return Err(TrasError::Config("provider ids must be unique".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite file holding the alert history.
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sqlite_path: default_sqlite_path(),
        }
    }
}

/// Where market commentary is read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentsConfig {
    pub folder: String,
    /// Case-insensitive substring of the preferred file names.
    #[serde(default = "default_primary_pattern")]
    pub primary_pattern: String,
    /// Used when nothing matches `primary_pattern`.
    #[serde(default = "default_fallback_pattern")]
    pub fallback_pattern: String,
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    /// Text documents are cut at this many characters.
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceFeedConfig {
    #[serde(default = "default_price_url")]
    pub base_url: String,
    #[serde(default = "default_price_timeout")]
    pub timeout_seconds: u64,
}

impl Default for PriceFeedConfig {
    fn default() -> Self {
        Self {
            base_url: default_price_url(),
            timeout_seconds: default_price_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushoverConfig {
    #[serde(default = "default_pushover_url")]
    pub api_url: String,
    #[serde(default = "default_pushover_token_env")]
    pub api_token_env: String,
    #[serde(default = "default_pushover_user_env")]
    pub user_key_env: String,
    #[serde(default = "default_true")]
    pub alerts: bool,
    #[serde(default)]
    pub digests: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_smtp_server")]
    pub smtp_server: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub from: String,
    /// Defaults to `from`.
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default = "default_smtp_user_env")]
    pub username_env: String,
    #[serde(default = "default_smtp_password_env")]
    pub password_env: String,
    #[serde(default = "default_smtp_timeout")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub alerts: bool,
    #[serde(default = "default_true")]
    pub digests: bool,
}

fn default_sqlite_path() -> String {
    "data/tras_alerts.db".to_string()
}
fn default_primary_pattern() -> String {
    "summary".to_string()
}
fn default_fallback_pattern() -> String {
    "report".to_string()
}
fn default_max_files() -> usize {
    3
}
fn default_max_chars() -> usize {
    5000
}
fn default_price_url() -> String {
    "https://api.frankfurter.app/latest".to_string()
}
fn default_price_timeout() -> u64 {
    5
}
fn default_pushover_url() -> String {
    "https://api.pushover.net/1/messages.json".to_string()
}
fn default_pushover_token_env() -> String {
    "PUSHOVER_API_TOKEN".to_string()
}
fn default_pushover_user_env() -> String {
    "PUSHOVER_USER_KEY".to_string()
}
fn default_smtp_server() -> String {
    "smtp.gmail.com".to_string()
}
fn default_smtp_port() -> u16 {
    587
}
fn default_smtp_user_env() -> String {
    "SENDER_EMAIL".to_string()
}
fn default_smtp_password_env() -> String {
    "SENDER_PASSWORD".to_string()
}
fn default_smtp_timeout() -> u64 {
    15
}
fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tras_models::ProviderKind;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = TrasConfig::from_toml_str(
            r#"
[documents]
folder = "/data/fx"
"#,
        )
        .unwrap();
        assert_eq!(config.store.sqlite_path, "data/tras_alerts.db");
        assert_eq!(config.schedule.analysis_times, vec!["07:00", "09:00", "12:00", "16:00"]);
        assert_eq!(config.schedule.timezone, "America/New_York");
        assert_eq!(config.monitor.poll_interval_seconds, 60);
        assert_eq!(config.monitor.tolerance_pips, dec!(10));
        assert_eq!(config.agents.providers.len(), 3);
        assert_eq!(config.agents.synthesizer, "gemini");
        assert_eq!(config.documents.max_files, 3);
        assert_eq!(config.documents.max_chars, 5000);
        assert!(config.pushover.is_none());
        assert!(config.email.is_none());
    }

    #[test]
    fn full_config() {
        let config = TrasConfig::from_toml_str(
            r#"
[store]
sqlite_path = "/var/lib/tras/alerts.db"

[schedule]
analysis_times = ["08:30"]
timezone = "Europe/London"

[monitor]
poll_interval_seconds = 30
tolerance_pips = 5

[agents]
synthesizer = "claude"
max_attempts = 2

[[agents.providers]]
id = "claude"
kind = "anthropic"
model = "claude-3-5-sonnet-latest"
api_key_env = "ANTHROPIC_API_KEY"

[documents]
folder = "/data/fx"
primary_pattern = "digest"

[pushover]

[email]
from = "me@example.com"
"#,
        )
        .unwrap();
        assert_eq!(config.schedule.analysis_times, vec!["08:30"]);
        assert_eq!(config.schedule.match_window_minutes, 5);
        assert_eq!(config.monitor.tolerance_pips, dec!(5));
        assert_eq!(config.monitor.tolerance_percent, dec!(0.1));
        assert_eq!(config.agents.providers[0].kind, ProviderKind::Anthropic);
        assert_eq!(config.agents.base_backoff_ms, 2000);
        assert_eq!(config.documents.fallback_pattern, "report");

        let pushover = config.pushover.unwrap();
        assert!(pushover.alerts && !pushover.digests);
        assert_eq!(pushover.user_key_env, "PUSHOVER_USER_KEY");
        let email = config.email.unwrap();
        assert!(email.digests && !email.alerts);
        assert_eq!(email.smtp_port, 587);
    }

    #[test]
    fn unknown_synthesizer_is_rejected() {
        let err = TrasConfig::from_toml_str(
            r#"
[agents]
synthesizer = "llama"
providers = []

[documents]
folder = "/data"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("llama"));
    }

    #[test]
    fn sample_config_parses() {
        let sample = include_str!("../../../config/tras.toml");
        let config = TrasConfig::from_toml_str(sample).unwrap();
        assert!(config.agents.provider(&config.agents.synthesizer).is_some());
    }
}
