// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Session State
//!
//! Process-wide authentication and connectivity state. [`Session`] holds the
//! current bearer token in memory, mirrors it to a small TOML settings
//! document so it survives restarts, and is handed to the gateway and
//! repositories as an `Arc`; there are no ambient globals. The token is
//! replaced wholesale on write; nothing in this layer reads-modifies-writes
//! it, and expiry is not enforced here.
//!
//! [`ConnectivityProbe`] is the seam through which repositories ask "is the
//! network there?" before attempting a remote fetch. [`NetworkMonitor`] is
//! the stock implementation: a shared flag the host flips from its platform
//! connectivity callbacks.

use crate::logging::DataLogger;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::warn;

/// Durable shape of the settings document
#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionSettings {
    token: Option<String>,
}

/// Holder of the current bearer token
///
/// Written only by a successful login (or [`Session::clear`]); read by the
/// gateway on every call. Construction restores any previously persisted
/// token, so a relaunched app resumes its session without logging in again.
pub struct Session {
    token: RwLock<Option<String>>,
    settings_path: PathBuf,
}

impl Session {
    /// Create a session, restoring a persisted token from `settings_path`
    /// if one exists
    ///
    /// A missing or unreadable settings document is a normal first-launch
    /// state and yields an anonymous session.
    pub fn restore(settings_path: PathBuf) -> Self {
        let token = match fs::read_to_string(&settings_path) {
            Ok(content) => match toml::from_str::<SessionSettings>(&content) {
                Ok(settings) => settings.token,
                Err(err) => {
                    warn!("Ignoring corrupt session settings: {}", err);
                    None
                }
            },
            Err(_) => None,
        };

        Self {
            token: RwLock::new(token),
            settings_path,
        }
    }

    /// Current token, if a login has produced one
    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// True when a non-empty token is held
    pub async fn has_token(&self) -> bool {
        self.token
            .read()
            .await
            .as_deref()
            .is_some_and(|t| !t.is_empty())
    }

    /// Replace the token (memory and durable settings)
    ///
    /// Persistence is best-effort: if the settings document cannot be
    /// written the in-memory session stays valid and the failure is logged.
    pub async fn set_token(&self, token: &str) {
        *self.token.write().await = Some(token.to_string());
        self.persist(Some(token.to_string()));
    }

    /// Drop the token (logout), clearing the durable settings too
    pub async fn clear(&self) {
        *self.token.write().await = None;
        self.persist(None);
    }

    fn persist(&self, token: Option<String>) {
        let settings = SessionSettings { token };
        let result = toml::to_string_pretty(&settings)
            .map_err(|err| err.to_string())
            .and_then(|content| {
                if let Some(parent) = self.settings_path.parent() {
                    fs::create_dir_all(parent).map_err(|err| err.to_string())?;
                }
                fs::write(&self.settings_path, content).map_err(|err| err.to_string())
            });
        if let Err(err) = result {
            warn!("Failed to persist session settings: {}", err);
        }
    }
}

/// Answers whether the device currently has network access
///
/// Repositories consult this before every remote fetch; when it reports
/// offline they serve whatever the local tiers hold. Hosts wire their
/// platform's connectivity callbacks to an implementation of this trait.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn is_online(&self) -> bool;
}

/// Shared online/offline flag, the stock [`ConnectivityProbe`]
///
/// Starts online; the host flips it as the platform reports changes.
pub struct NetworkMonitor {
    online: AtomicBool,
}

impl NetworkMonitor {
    pub fn new() -> Self {
        Self {
            online: AtomicBool::new(true),
        }
    }

    /// Record a connectivity change reported by the host platform
    ///
    /// Repeated reports of the same state are absorbed silently; only real
    /// transitions are logged.
    pub fn set_online(&self, online: bool) {
        let was_online = self.online.swap(online, Ordering::Relaxed);
        if was_online != online {
            DataLogger::log_network_transition(online);
        }
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectivityProbe for NetworkMonitor {
    async fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }
}
