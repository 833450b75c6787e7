use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::app::error::{QuireError, Result};
use crate::auth::{PasswordHasher, TokenManager};
use crate::config::Config;
use crate::domain::{NewUser, User};
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::ingest::Ingestor;
use crate::normalizer::Normalizer;
use crate::store::{SqliteStore, Store};

/// Everything the request handlers and the scheduler share. Cloning is
/// cheap; all heavy members sit behind `Arc`.
#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<dyn Store + Send + Sync>,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub normalizer: Normalizer,
    pub tokens: Arc<TokenManager>,
    pub hasher: PasswordHasher,
    pub config: Arc<Config>,
}

impl AppContext {
    /// Opens (and migrates) the configured database.
    pub fn new(config: Config) -> Result<Self> {
        let path = &config.database.path;
        Self::ensure_parent_dir(path)?;
        tracing::debug!("Opening database at {}", path.display());

        let store: Arc<dyn Store + Send + Sync> = Arc::new(SqliteStore::new(path)?);
        Self::with_store(config, store)
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        Self::with_store(config, Arc::new(SqliteStore::in_memory()?))
    }

    pub fn with_store(config: Config, store: Arc<dyn Store + Send + Sync>) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new(
            Duration::from_secs(config.ingest.fetch_timeout_secs),
        )?);
        let ttl = chrono::Duration::try_seconds(config.auth.token_ttl_secs)
            .filter(|ttl| *ttl > chrono::Duration::zero())
            .ok_or_else(|| {
                QuireError::Config(format!(
                    "token ttl out of range: {}",
                    config.auth.token_ttl_secs
                ))
            })?;
        let tokens = Arc::new(TokenManager::new(config.auth.jwt_secret.as_bytes(), ttl));
        let hasher = PasswordHasher::with_iterations(config.auth.password_iterations);

        Ok(Self {
            store,
            fetcher,
            normalizer: Normalizer::new(),
            tokens,
            hasher,
            config: Arc::new(config),
        })
    }

    pub fn ingestor(&self) -> Ingestor {
        Ingestor::new(
            self.store.clone(),
            self.fetcher.clone(),
            self.normalizer.clone(),
        )
    }

    /// Creates the configured administrator when no admin account exists.
    /// Returns the new user, or `None` when an admin was already present.
    pub fn ensure_default_admin(&self) -> Result<Option<User>> {
        if self.store.count_admins()? > 0 {
            return Ok(None);
        }

        let auth = &self.config.auth;
        if auth.default_admin_email.is_empty() || auth.default_admin_password.is_empty() {
            return Err(QuireError::Config(
                "missing default admin credentials".to_string(),
            ));
        }

        let user = self.register_user(&auth.default_admin_email, &auth.default_admin_password, true)?;
        tracing::info!("Created default administrator {}", user.email);
        Ok(Some(user))
    }

    /// Hashes the password and stores a new account.
    pub fn register_user(&self, email: &str, password: &str, is_admin: bool) -> Result<User> {
        let password_hash = self.hasher.hash(password)?;
        self.store.add_user(&NewUser {
            email: email.to_string(),
            password_hash,
            is_admin,
        })
    }

    /// Exchanges credentials for a session token.
    ///
    /// Unknown emails and wrong passwords both fail with
    /// `InvalidCredentials`.
    pub fn login(&self, email: &str, password: &str) -> Result<String> {
        if email.is_empty() || password.is_empty() {
            return Err(QuireError::Validation(
                "email and password are required".to_string(),
            ));
        }

        // Unknown emails pay the same hashing cost as wrong passwords.
        let Some(user) = self.store.get_user_by_email(email)? else {
            self.hasher.verify_missing(password);
            return Err(QuireError::InvalidCredentials);
        };
        if !self.hasher.verify(&user.password_hash, password) {
            return Err(QuireError::InvalidCredentials);
        }

        tracing::info!(user_id = user.id, "Login succeeded");
        self.tokens.issue(user.id, user.is_admin)
    }

    fn ensure_parent_dir(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}
