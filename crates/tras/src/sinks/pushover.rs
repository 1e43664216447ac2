use async_trait::async_trait;
use tracing::debug;
use tras_monitor::{Notification, NotificationKind, NotificationSink, NotifyError, Priority};

use crate::config::PushoverConfig;

const MAX_TITLE_CHARS: usize = 250;
const MAX_MESSAGE_CHARS: usize = 1024;

/// Push notifications through the Pushover messages API.
pub struct PushoverSink {
    client: reqwest::Client,
    api_url: String,
    token: String,
    user: String,
    alerts: bool,
    digests: bool,
}

impl PushoverSink {
    /// Reads the API token and user key from the configured environment
    /// variables.
    pub fn from_env(config: &PushoverConfig, client: reqwest::Client) -> Result<Self, NotifyError> {
        let read = |var: &str| {
            std::env::var(var)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| NotifyError::NotConfigured(format!("pushover: {var} is not set")))
        };
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            token: read(&config.api_token_env)?,
            user: read(&config.user_key_env)?,
            alerts: config.alerts,
            digests: config.digests,
        })
    }
}

fn clip(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

fn priority_code(priority: Priority) -> &'static str {
    match priority {
        Priority::Normal => "0",
        Priority::High => "1",
    }
}

#[async_trait]
impl NotificationSink for PushoverSink {
    fn name(&self) -> &str {
        "pushover"
    }

    fn accepts(&self, kind: NotificationKind) -> bool {
        match kind {
            NotificationKind::EntryAlert => self.alerts,
            NotificationKind::Digest => self.digests,
        }
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let title = clip(&notification.title, MAX_TITLE_CHARS);
        let message = clip(&notification.body, MAX_MESSAGE_CHARS);
        let form = [
            ("token", self.token.as_str()),
            ("user", self.user.as_str()),
            ("title", title.as_str()),
            ("message", message.as_str()),
            ("priority", priority_code(notification.priority)),
        ];

        let response = self
            .client
            .post(&self.api_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(title = %title, "Pushover accepted message");
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Err(NotifyError::Transport(format!("HTTP {status}: {body}")))
        } else {
            Err(NotifyError::Rejected(format!("HTTP {status}: {body}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credentials_are_not_configured() {
        let config = PushoverConfig {
            api_url: "http://localhost".into(),
            api_token_env: "TRAS_TEST_PUSHOVER_TOKEN_UNSET".into(),
            user_key_env: "TRAS_TEST_PUSHOVER_USER_UNSET".into(),
            alerts: true,
            digests: false,
        };
        let err = PushoverSink::from_env(&config, reqwest::Client::new())
            .err()
            .unwrap();
        assert!(matches!(err, NotifyError::NotConfigured(_)));
        assert!(err.to_string().contains("TRAS_TEST_PUSHOVER_TOKEN_UNSET"));
    }

    #[test]
    fn long_messages_are_clipped() {
        assert_eq!(clip(&"é".repeat(2000), MAX_MESSAGE_CHARS).chars().count(), 1024);
        assert_eq!(priority_code(Priority::High), "1");
    }
}
