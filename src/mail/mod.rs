use async_trait::async_trait;
use tracing::info;

mod smtp;

pub use smtp::SmtpMailer;

/// Outbound mail delivery. The auth flows only ever send the
/// password-reset message through this.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

/// Fallback mailer for deployments without SMTP configured: logs the
/// delivery instead of sending it. Never logs the body (it carries the
/// reset token).
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> anyhow::Result<()> {
        info!(to = %to, subject = %subject, "mail delivery skipped (no SMTP configured)");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    pub struct SentMail {
        pub to: String,
        pub subject: String,
        pub body: String,
    }

    /// Captures outbound mail so tests can pull the reset link out of it.
    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<SentMail>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
            self.sent.lock().expect("mailer lock poisoned").push(SentMail {
                to: to.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            });
            Ok(())
        }
    }
}
