// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # User Repository
//!
//! Accounts, credentials and the login flow. Reads follow the same tiered
//! chain as bikes, but the error posture is stricter: a broken remote
//! payload on the profile path and a rejected login both surface as errors
//! instead of degrading to `None`; silently "succeeding" with partial
//! authentication state would corrupt the session.
//!
//! A successful login is the only writer of the session token. The
//! plaintext password never leaves this module unhashed: it travels to the
//! backend inside the login request and is bcrypt-hashed before the account
//! record touches the store.

use super::InFlight;
use crate::constants::accounts;
use crate::database::Database;
use crate::errors::{DataError, DataResult};
use crate::gateway::{ApiClient, UserApiModel};
use crate::logging::DataLogger;
use crate::models::User;
use crate::seed::SeedStore;
use crate::session::{ConnectivityProbe, Session};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

/// Repository for [`User`] records and the authentication flow
pub struct UserRepository {
    database: Arc<Database>,
    seed: Arc<SeedStore>,
    gateway: Arc<ApiClient>,
    session: Arc<Session>,
    probe: Arc<dyn ConnectivityProbe>,
    bcrypt_cost: u32,
    fetch_locks: InFlight,
    sync_lock: Mutex<()>,
}

impl UserRepository {
    pub fn new(
        database: Arc<Database>,
        seed: Arc<SeedStore>,
        gateway: Arc<ApiClient>,
        session: Arc<Session>,
        probe: Arc<dyn ConnectivityProbe>,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            database,
            seed,
            gateway,
            session,
            probe,
            bcrypt_cost,
            fetch_locks: InFlight::new(),
            sync_lock: Mutex::new(()),
        }
    }

    async fn can_reach_backend(&self) -> bool {
        self.probe.is_online().await && self.session.has_token().await
    }

    async fn write_back(&self, user: &User) {
        if let Err(err) = self.database.save_user(user).await {
            DataLogger::log_store_fault("user", &user.uuid.to_string(), &err.to_string());
        }
    }

    /// Get an account by email (trimmed and lowercased before matching)
    ///
    /// Store -> seed -> remote profile fetch. Unlike the bike paths, a
    /// reachable backend answering with an email-less payload is an error:
    /// the caller asked for a specific account and got something unusable.
    pub async fn get_by_email(&self, email: &str) -> DataResult<Option<User>> {
        if let Some(user) = self.database.get_user_by_email(email).await? {
            debug!("User {} served from store", user.uuid);
            return Ok(Some(user));
        }

        if let Some(user) = self.seed.get_user_by_email(email).await {
            DataLogger::log_cache_promotion("user", email, "seed");
            self.write_back(&user).await;
            return Ok(Some(user));
        }

        if !self.can_reach_backend().await {
            debug!("No network or session token, user lookup unavailable");
            return Ok(None);
        }

        let _guard = self
            .fetch_locks
            .acquire(&email.trim().to_lowercase())
            .await;
        if let Some(user) = self.database.get_user_by_email(email).await? {
            return Ok(Some(user));
        }

        let model = self.gateway.current_user().await?;
        match model.email.as_deref() {
            Some(remote_email) if !remote_email.is_empty() => {
                let user = model.to_user("");
                DataLogger::log_cache_promotion("user", email, "backend");
                self.write_back(&user).await;
                Ok(Some(user))
            }
            _ => Err(DataError::InvalidPayload(
                "user payload carried no email".to_string(),
            )),
        }
    }

    /// Authenticate and materialize the account locally
    ///
    /// On success the access token is stored into the session (memory and
    /// durable settings), the login-response token fields are merged with a
    /// best-effort profile fetch, the plaintext password is bcrypt-hashed,
    /// and the resulting record lands in the store with fresh timestamps
    /// and the login group tag.
    pub async fn login(&self, email: &str, password: &str, origin: &str) -> DataResult<User> {
        let response = match self.gateway.login(email, password, origin).await {
            Ok(response) => response,
            Err(err) => {
                DataLogger::log_auth_event(email, "login", false, Some(&err.to_string()));
                return Err(err);
            }
        };
        let access = response.token.access.clone();
        if access.is_empty() {
            DataLogger::log_auth_event(email, "login", false, Some("empty access token"));
            return Err(DataError::LoginRejected(
                "response carried no access token".to_string(),
            ));
        }

        self.session.set_token(&access).await;
        DataLogger::log_auth_event(email, "login", true, None);

        let from_login = UserApiModel::from_login(email, &response.token);
        let profile = match self.gateway.current_user().await {
            Ok(fetched) if fetched.email.as_deref().is_some_and(|e| !e.is_empty()) => {
                from_login.merge(&fetched)
            }
            Ok(_) => {
                debug!("Profile endpoint answered without an email, keeping login record");
                from_login
            }
            Err(err) => {
                warn!("Profile fetch after login failed: {}", err);
                from_login
            }
        };

        let hashed = bcrypt::hash(password, self.bcrypt_cost)?;
        let now = Utc::now();
        let mut user = profile.to_user(&hashed);
        user.created_at = now;
        user.last_connection = now;
        user.group = accounts::LOGIN_GROUP.to_string();

        self.database.save_user(&user).await?;
        Ok(user)
    }

    /// Every known account
    ///
    /// Serves the store when it holds anything; an empty store triggers one
    /// single-flighted backend sync. A failed sync is logged and yields
    /// whatever the store holds.
    pub async fn get_all(&self) -> DataResult<Vec<User>> {
        let stored = self.database.get_users().await?;
        if !stored.is_empty() {
            debug!("Serving {} users from store", stored.len());
            return Ok(stored);
        }

        if !self.can_reach_backend().await {
            debug!("No network or session token, serving empty user list");
            return Ok(Vec::new());
        }

        let _guard = self.sync_lock.lock().await;
        let stored = self.database.get_users().await?;
        if !stored.is_empty() {
            return Ok(stored);
        }

        match self.gateway.all_users().await {
            Ok(models) => {
                DataLogger::log_sync_event("user", models.len(), true);
                for model in &models {
                    self.write_back(&model.to_user("")).await;
                }
            }
            Err(err) => {
                warn!("User sync failed: {}", err);
                DataLogger::log_sync_event("user", 0, false);
            }
        }
        self.database.get_users().await
    }

    /// The single active account, if one exists locally
    pub async fn current(&self) -> DataResult<Option<User>> {
        if let Some(user) = self.database.first_user().await? {
            return Ok(Some(user));
        }
        Ok(self.seed.first_user().await)
    }

    /// Check a plaintext password against the stored account's hash
    ///
    /// `Ok(false)` both for a wrong password and for an unknown account.
    pub async fn verify_password(&self, email: &str, password: &str) -> DataResult<bool> {
        match self.database.get_user_by_email(email).await? {
            Some(user) => Ok(bcrypt::verify(password, &user.hashed_password)?),
            None => Ok(false),
        }
    }

    /// Upsert an account into the store
    pub async fn save(&self, user: &User) -> DataResult<()> {
        self.database.save_user(user).await
    }

    /// Rewrite an existing record; `false` when the id is unknown
    pub async fn update(&self, user: &User) -> DataResult<bool> {
        self.database.update_user(user).await
    }

    /// Remove the addressed record, returning it
    pub async fn delete(&self, user_id: Uuid) -> DataResult<Option<User>> {
        self.database.delete_user(user_id).await
    }
}
