// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Repository Layer
//!
//! Orchestration of the three data tiers. Each repository serves reads
//! through the chain Entity Store -> Seed Loader -> Remote Gateway, writing a
//! lower-tier hit back into the store so the next read is local. Remote
//! fetches are gated on connectivity and an authenticated session, and are
//! single-flighted per key so concurrent cache misses share one backend
//! call.
//!
//! Repositories are plain constructed values: every collaborator (store,
//! seed, gateway, session, connectivity probe) is injected, nothing is
//! process-global. [`DataServices::connect`] wires the whole stack from a
//! [`DataConfig`] for hosts that want the default composition.

use crate::config::DataConfig;
use crate::database::Database;
use crate::errors::DataResult;
use crate::gateway::ApiClient;
use crate::seed::SeedStore;
use crate::session::{ConnectivityProbe, NetworkMonitor, Session};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::info;

pub mod bike;
pub mod pricing;
pub mod user;

pub use bike::BikeRepository;
pub use pricing::PricingRepository;
pub use user::UserRepository;

/// Per-key in-flight request map
///
/// A cache misser acquires the key's lock before going remote and re-checks
/// the store once it holds it, so N concurrent missers produce one backend
/// call and N-1 store hits.
pub(crate) struct InFlight {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl InFlight {
    pub(crate) fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    pub(crate) async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}

/// The fully wired data layer
///
/// One instance per process root; hand clones of the `Arc` fields to
/// whichever screens need them. The [`NetworkMonitor`] is exposed so the
/// host can feed its platform connectivity callbacks into the gating logic.
pub struct DataServices {
    pub bikes: BikeRepository,
    pub users: UserRepository,
    pub pricing: PricingRepository,
    pub session: Arc<Session>,
    pub network: Arc<NetworkMonitor>,
}

impl DataServices {
    /// Connect the default stack: SQLite store, bundled seed fixtures,
    /// Patinfly backend gateway
    pub async fn connect(config: &DataConfig) -> DataResult<Self> {
        Self::connect_with_seed(config, SeedStore::bundled()).await
    }

    /// Connect over an explicit seed store
    ///
    /// Used by hosts that ship their own fixtures and by tests.
    pub async fn connect_with_seed(config: &DataConfig, seed: SeedStore) -> DataResult<Self> {
        let session = Arc::new(Session::restore(config.settings_path.clone()));
        let network = Arc::new(NetworkMonitor::new());
        let probe: Arc<dyn ConnectivityProbe> = network.clone();

        let database = Arc::new(Database::new(&config.database_url).await?);
        let seed = Arc::new(seed);
        let gateway = Arc::new(ApiClient::new(config, Arc::clone(&session))?);

        info!(
            "Data layer connected: store={} api={}",
            config.database_url, config.api_base_url
        );

        Ok(Self {
            bikes: BikeRepository::new(
                Arc::clone(&database),
                Arc::clone(&seed),
                Arc::clone(&gateway),
                Arc::clone(&session),
                Arc::clone(&probe),
            ),
            users: UserRepository::new(
                Arc::clone(&database),
                Arc::clone(&seed),
                Arc::clone(&gateway),
                Arc::clone(&session),
                Arc::clone(&probe),
                config.bcrypt_cost,
            ),
            pricing: PricingRepository::new(database, seed),
            session,
            network,
        })
    }
}
