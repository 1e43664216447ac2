use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{header, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tras_monitor::{Notification, NotificationKind, NotificationSink, NotifyError};

use crate::config::EmailConfig;

/// SMTP delivery with STARTTLS. Sending runs on the blocking pool.
pub struct EmailSink {
    server: String,
    port: u16,
    from: String,
    to: String,
    username: String,
    password: String,
    timeout: Duration,
    alerts: bool,
    digests: bool,
}

impl EmailSink {
    pub fn from_env(config: &EmailConfig) -> Result<Self, NotifyError> {
        let read = |var: &str| {
            std::env::var(var)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| NotifyError::NotConfigured(format!("email: {var} is not set")))
        };
        Ok(Self {
            server: config.smtp_server.clone(),
            port: config.smtp_port,
            from: config.from.clone(),
            to: config.to.clone().unwrap_or_else(|| config.from.clone()),
            username: read(&config.username_env)?,
            password: read(&config.password_env)?,
            timeout: Duration::from_secs(config.timeout_seconds),
            alerts: config.alerts,
            digests: config.digests,
        })
    }

    fn message(&self, notification: &Notification) -> Result<Message, NotifyError> {
        let address = |s: &str| -> Result<Mailbox, NotifyError> {
            s.parse()
                .map_err(|e| NotifyError::NotConfigured(format!("email address {s:?}: {e}")))
        };
        Message::builder()
            .from(address(&self.from)?)
            .to(address(&self.to)?)
            .subject(notification.title.clone())
            .header(header::ContentType::TEXT_PLAIN)
            .body(notification.body.clone())
            .map_err(|e| NotifyError::Rejected(e.to_string()))
    }
}

#[async_trait]
impl NotificationSink for EmailSink {
    fn name(&self) -> &str {
        "email"
    }

    fn accepts(&self, kind: NotificationKind) -> bool {
        match kind {
            NotificationKind::EntryAlert => self.alerts,
            NotificationKind::Digest => self.digests,
        }
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let email = self.message(notification)?;
        let mailer = SmtpTransport::starttls_relay(&self.server)
            .map_err(|e| NotifyError::NotConfigured(format!("smtp relay {}: {e}", self.server)))?
            .port(self.port)
            .credentials(Credentials::new(self.username.clone(), self.password.clone()))
            .timeout(Some(self.timeout))
            .build();

        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| NotifyError::Transport(format!("email task aborted: {e}")))?
            .map(|_| ())
            .map_err(|e| {
                if e.is_permanent() {
                    NotifyError::Rejected(e.to_string())
                } else {
                    NotifyError::Transport(e.to_string())
                }
            })
    }
}
