use std::sync::Arc;

use crate::config::{AppConfig, StoreBackend};
use crate::mail::{LogMailer, Mailer, SmtpMailer};
use crate::store::{MemoryStore, PostgresStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub mailer: Arc<dyn Mailer>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store: Arc<dyn UserStore> = match config.store_backend {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for the postgres store"))?;
                Arc::new(PostgresStore::connect(url).await?)
            }
            StoreBackend::Memory => {
                tracing::warn!("using the in-memory credential store; users do not survive restarts");
                Arc::new(MemoryStore::new())
            }
        };

        let mailer: Arc<dyn Mailer> = match &config.mail {
            Some(mail) => Arc::new(SmtpMailer::new(
                &mail.smtp_host,
                &mail.smtp_username,
                &mail.smtp_password,
                &mail.from,
            )?),
            None => Arc::new(LogMailer),
        };

        Ok(Self {
            store,
            mailer,
            config,
        })
    }

    pub fn from_parts(
        store: Arc<dyn UserStore>,
        mailer: Arc<dyn Mailer>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            store,
            mailer,
            config,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::from_parts(
            Arc::new(MemoryStore::new()),
            Arc::new(LogMailer),
            Arc::new(Self::fake_config()),
        )
    }

    #[cfg(test)]
    pub fn fake_config() -> AppConfig {
        AppConfig {
            store_backend: StoreBackend::Memory,
            database_url: None,
            public_base_url: "http://localhost:8080".into(),
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                session_ttl_minutes: 5,
                reset_ttl_minutes: 15,
            },
            mail: None,
        }
    }
}
