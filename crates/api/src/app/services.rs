//! Service wiring: signing codec, session manager and collaborators.

use std::sync::Arc;

use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};

use elearn_auth::{
    AccountRepository, Clock, CredentialCodec, IssuedSession, SessionManager, SessionStore, SessionStoreError,
    SystemClock,
};
use elearn_infra::{
    AppConfig, CourseCatalog, InMemoryAccountRepository, InMemoryCourseCatalog, InMemorySessionStore, LogMailer,
    Mailer, RedisSessionStore,
};

use crate::cookies;

/// Everything a handler needs, shared behind `Extension<Arc<AppServices>>`.
pub struct AppServices {
    pub config: AppConfig,
    pub codec: Arc<CredentialCodec>,
    pub sessions: Arc<SessionManager>,
    pub accounts: Arc<dyn AccountRepository>,
    pub mailer: Arc<dyn Mailer>,
    pub courses: Arc<dyn CourseCatalog>,
}

impl AppServices {
    pub fn new(
        config: AppConfig,
        clock: Arc<dyn Clock>,
        store: Arc<dyn SessionStore>,
        accounts: Arc<dyn AccountRepository>,
        mailer: Arc<dyn Mailer>,
        courses: Arc<dyn CourseCatalog>,
    ) -> Self {
        let codec = Arc::new(CredentialCodec::new(
            config.activation_secret.as_bytes(),
            config.session_secret.as_bytes(),
            clock,
        ));
        let sessions = Arc::new(SessionManager::new(
            codec.clone(),
            store,
            accounts.clone(),
            config.session_policy(),
        ));

        Self {
            config,
            codec,
            sessions,
            accounts,
            mailer,
            courses,
        }
    }

    /// Production wiring: Redis session store when `REDIS_URL` is set,
    /// in-memory otherwise.
    pub async fn from_config(config: AppConfig) -> Result<Self, SessionStoreError> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let store: Arc<dyn SessionStore> = match config.redis_url.as_deref() {
            Some(url) => {
                let store = RedisSessionStore::connect(url).await?;
                tracing::info!("using redis session store");
                Arc::new(store)
            }
            None => {
                tracing::warn!("REDIS_URL not set; sessions are kept in process memory");
                Arc::new(InMemorySessionStore::new(clock.clone()))
            }
        };

        Ok(Self::new(
            config,
            clock,
            store,
            Arc::new(InMemoryAccountRepository::new()),
            Arc::new(LogMailer),
            Arc::new(InMemoryCourseCatalog::new()),
        ))
    }

    /// Current time from the injected clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.codec.clock().now()
    }

    pub fn set_session_cookies(&self, jar: CookieJar, issued: &IssuedSession) -> CookieJar {
        cookies::set_session_cookies(jar, issued, self.config.cookie_secure)
    }
}
