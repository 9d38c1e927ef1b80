// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Configuration management for the Patinfly data layer

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{api, env_config};

/// Runtime configuration for the data layer
///
/// Hosts typically call [`DataConfig::from_env`] once at startup and hand
/// the value to `DataServices::connect`. A TOML file can override the
/// environment via [`DataConfig::load`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataConfig {
    /// Base URL of the backend API
    pub api_base_url: String,
    /// sqlx database URL for the entity store
    pub database_url: String,
    /// Path of the durable settings document holding the session token
    pub settings_path: PathBuf,
    /// bcrypt work factor for password hashing
    pub bcrypt_cost: u32,
    /// Transport connect timeout, seconds
    pub connect_timeout_secs: u64,
    /// Full-request timeout, seconds
    pub request_timeout_secs: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            api_base_url: api::BASE_URL.to_string(),
            database_url: "sqlite:./data/patinfly.db".to_string(),
            settings_path: env_config::settings_path(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            connect_timeout_secs: api::CONNECT_TIMEOUT_SECS,
            request_timeout_secs: api::REQUEST_TIMEOUT_SECS,
        }
    }
}

impl DataConfig {
    /// Build a configuration from environment variables (with `.env` support)
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self {
            api_base_url: env_config::api_base_url(),
            database_url: env_config::database_url(),
            settings_path: env_config::settings_path(),
            bcrypt_cost: env_config::bcrypt_cost(),
            connect_timeout_secs: api::CONNECT_TIMEOUT_SECS,
            request_timeout_secs: api::REQUEST_TIMEOUT_SECS,
        }
    }

    /// Load from a TOML file, falling back to the environment when the file
    /// does not exist
    pub fn load(path: Option<String>) -> Result<Self> {
        let config_path = path.unwrap_or_else(|| {
            dirs::config_dir()
                .map(|p| p.join("patinfly/config.toml"))
                .unwrap_or_else(|| "config.toml".into())
                .to_string_lossy()
                .to_string()
        });

        if Path::new(&config_path).exists() {
            let content =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::from_env())
        }
    }

    /// Persist this configuration as pretty TOML, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path.parent().context("Invalid config path")?;
        fs::create_dir_all(parent)?;

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;

        Ok(())
    }
}
