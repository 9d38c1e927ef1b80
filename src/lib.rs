// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Patinfly Core
//!
//! The offline-first data layer of the Patinfly bike rental platform.
//! It keeps a local fleet and account cache in SQLite, falls back to bundled
//! seed fixtures on a fresh install, and synchronizes with the Patinfly
//! backend whenever the device is online and a session is held.
//!
//! ## Features
//!
//! - **Offline-first reads**: every lookup resolves store, then seed, then
//!   backend, so the app keeps working without a network
//! - **Write-back caching**: records promoted from seed or backend land in
//!   the local store and are served locally from then on
//! - **Session management**: bearer tokens survive restarts through a small
//!   durable settings document
//! - **Credential hashing**: passwords are bcrypt-hashed before an account
//!   record ever touches the store
//! - **Deduplicated fetches**: concurrent misses for the same record share
//!   one backend request
//!
//! ## Architecture
//!
//! The crate follows a layered architecture:
//! - **Repositories**: tiered read/write logic per resource (bikes, users,
//!   pricing)
//! - **Database**: SQLite entity store over `sqlx`
//! - **Seed**: embedded JSON fixtures for first-run content
//! - **Gateway**: HTTP client for the Patinfly backend API
//! - **Session**: token holder and connectivity state
//! - **Config**: configuration management and persistence
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use patinfly_core::config::DataConfig;
//! use patinfly_core::repository::DataServices;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     patinfly_core::logging::init_from_env()?;
//!
//!     // Wire the store, seed fixtures, gateway and session together
//!     let config = DataConfig::from_env();
//!     let services = DataServices::connect(&config).await?;
//!
//!     // Authenticate and persist the session token
//!     let user = services
//!         .users
//!         .login("rider@patinfly.dev", "secret", "app")
//!         .await?;
//!     println!("Logged in as {}", user.name);
//!
//!     // Rentable fleet, served offline once cached
//!     for bike in services.bikes.get_all().await? {
//!         println!("{} ({})", bike.name, bike.bike_type_name);
//!     }
//!
//!     Ok(())
//! }
//! ```

/// Configuration management and persistence
pub mod config;

/// Application constants and configuration values
pub mod constants;

/// SQLite entity store
pub mod database;

/// Error types shared across the data layer
pub mod errors;

/// HTTP gateway to the Patinfly backend
pub mod gateway;

/// Production logging and structured output
pub mod logging;

/// Common data models for the platform
pub mod models;

/// Tiered repositories over store, seed and gateway
pub mod repository;

/// Embedded seed fixtures
pub mod seed;

/// Session token and connectivity state
pub mod session;
