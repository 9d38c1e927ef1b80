// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Constants Module
//!
//! Application constants and environment-based configuration values.
//! This module provides both hardcoded constants and environment variable configuration.

use std::env;

/// Backend API endpoints and wire-level defaults
pub mod api {
    /// Base URL of the Patinfly backend
    pub const BASE_URL: &str = "https://api.patinfly.dev";

    /// Endpoint paths, relative to the base URL
    pub const LOGIN_PATH: &str = "api/login";
    pub const USER_PATH: &str = "api/user";
    pub const VEHICLE_PATH: &str = "api/vehicle";
    pub const STATUS_PATH: &str = "api/status";

    /// Transport timeouts (connect and full request), in seconds
    pub const CONNECT_TIMEOUT_SECS: u64 = 30;
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// Bearer token sent when no session token is present. The backend
    /// accepts anonymous status/vehicle reads, so this may stay empty.
    pub const STATIC_FALLBACK_TOKEN: &str = "";

    /// Origin header value the backend's CORS filter expects. Sent on every
    /// request; login replaces it with whatever the host application passes.
    pub const DEFAULT_ORIGIN: &str = "";
}

/// Environment-based configuration
pub mod env_config {
    use super::env;
    use std::path::PathBuf;

    /// Get database URL from environment or default
    pub fn database_url() -> String {
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./data/patinfly.db".to_string())
    }

    /// Get API base URL from environment or default
    pub fn api_base_url() -> String {
        env::var("PATINFLY_API_URL").unwrap_or_else(|_| super::api::BASE_URL.to_string())
    }

    /// Get the durable settings path from environment or the platform default
    pub fn settings_path() -> PathBuf {
        if let Ok(path) = env::var("PATINFLY_SETTINGS_PATH") {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("patinfly")
            .join(super::session::SETTINGS_FILE)
    }

    /// Get bcrypt work factor from environment or default
    pub fn bcrypt_cost() -> u32 {
        env::var("PATINFLY_BCRYPT_COST")
            .unwrap_or_else(|_| bcrypt::DEFAULT_COST.to_string())
            .parse()
            .unwrap_or(bcrypt::DEFAULT_COST)
    }

    /// Get log level from environment or default
    pub fn log_level() -> String {
        env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
    }
}

/// Session persistence
pub mod session {
    /// File name of the durable settings document holding the token
    pub const SETTINGS_FILE: &str = "session.toml";
}

/// Account defaults applied when the backend omits a field
pub mod accounts {
    /// Group tag stamped onto users created by login
    pub const LOGIN_GROUP: &str = "patinfly";

    /// Group tag for users materialized from the wire without one
    pub const DEFAULT_GROUP: &str = "default";
}

/// Battery and telemetry bounds
pub mod limits {
    /// Battery charge range reported by vehicles
    pub const BATTERY_MIN: i32 = 0;
    pub const BATTERY_MAX: i32 = 100;
}
