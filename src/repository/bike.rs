// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Bike Repository
//!
//! Read-through cache over the fleet. Reads resolve Entity Store -> Seed
//! Loader -> Remote Gateway with write-back at each promotion; the remote
//! tier is only consulted when the device is online and a session token is
//! held, so every read path works offline. Maintenance vehicles never leave
//! this layer through the renter-facing listings.

use super::InFlight;
use crate::database::Database;
use crate::errors::DataResult;
use crate::gateway::ApiClient;
use crate::logging::DataLogger;
use crate::models::{Bike, ServerStatus};
use crate::seed::SeedStore;
use crate::session::{ConnectivityProbe, Session};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Repository for [`Bike`] records
pub struct BikeRepository {
    database: Arc<Database>,
    seed: Arc<SeedStore>,
    gateway: Arc<ApiClient>,
    session: Arc<Session>,
    probe: Arc<dyn ConnectivityProbe>,
    fetch_locks: InFlight,
    sync_lock: Mutex<()>,
}

impl BikeRepository {
    pub fn new(
        database: Arc<Database>,
        seed: Arc<SeedStore>,
        gateway: Arc<ApiClient>,
        session: Arc<Session>,
        probe: Arc<dyn ConnectivityProbe>,
    ) -> Self {
        Self {
            database,
            seed,
            gateway,
            session,
            probe,
            fetch_locks: InFlight::new(),
            sync_lock: Mutex::new(()),
        }
    }

    async fn can_reach_backend(&self) -> bool {
        self.probe.is_online().await && self.session.has_token().await
    }

    /// Cache a fetched record; the fetched value survives a store fault
    async fn write_back(&self, bike: &Bike) {
        if let Err(err) = self.database.save_bike(bike).await {
            DataLogger::log_store_fault("bike", &bike.uuid, &err.to_string());
        }
    }

    fn rentable(bikes: Vec<Bike>) -> Vec<Bike> {
        bikes.into_iter().filter(|bike| !bike.in_maintenance).collect()
    }

    /// Get one bike by uuid
    ///
    /// Strict read-through: a store hit never touches the network. On a
    /// full miss the remote fetch is gated on connectivity and session
    /// token, and single-flighted per uuid.
    pub async fn get(&self, uuid: &str) -> DataResult<Option<Bike>> {
        if let Some(bike) = self.database.get_bike(uuid).await? {
            debug!("Bike {} served from store", uuid);
            return Ok(Some(bike));
        }

        if let Some(bike) = self.seed.get_bike(uuid).await {
            DataLogger::log_cache_promotion("bike", uuid, "seed");
            self.write_back(&bike).await;
            return Ok(Some(bike));
        }

        if !self.can_reach_backend().await {
            debug!("No network or session token, bike {} unavailable", uuid);
            return Ok(None);
        }

        let _guard = self.fetch_locks.acquire(uuid).await;
        // another caller may have landed the record while we waited
        if let Some(bike) = self.database.get_bike(uuid).await? {
            return Ok(Some(bike));
        }

        match self.gateway.bike_by_id(uuid).await {
            Some(bike) => {
                DataLogger::log_cache_promotion("bike", uuid, "backend");
                self.write_back(&bike).await;
                Ok(Some(bike))
            }
            None => Ok(None),
        }
    }

    /// Get the rentable fleet (maintenance vehicles excluded)
    ///
    /// Serves the store when it holds anything; an empty store falls back
    /// to seed, then to one single-flighted backend sync. Once populated,
    /// the store is never re-synced by this call.
    pub async fn get_all(&self) -> DataResult<Vec<Bike>> {
        let stored = self.database.get_bikes().await?;
        if !stored.is_empty() {
            debug!("Serving {} bikes from store", stored.len());
            return Ok(Self::rentable(stored));
        }

        let seeded = self.seed.get_bikes().await;
        if !seeded.is_empty() {
            debug!("Serving {} bikes from seed", seeded.len());
            for bike in &seeded {
                self.write_back(bike).await;
            }
            return Ok(Self::rentable(seeded));
        }

        if !self.can_reach_backend().await {
            debug!("No network or session token, serving empty bike list");
            return Ok(Vec::new());
        }

        let _guard = self.sync_lock.lock().await;
        let stored = self.database.get_bikes().await?;
        if !stored.is_empty() {
            return Ok(Self::rentable(stored));
        }

        let fetched = self.gateway.bikes().await;
        DataLogger::log_sync_event("bike", fetched.len(), true);
        for bike in &fetched {
            self.write_back(bike).await;
        }
        Ok(Self::rentable(fetched))
    }

    /// Stored bikes whose type name matches `category`, case-insensitively
    pub async fn get_by_category(&self, category: &str) -> DataResult<Vec<Bike>> {
        let bikes = self.database.get_bikes().await?;
        Ok(bikes
            .into_iter()
            .filter(|bike| bike.bike_type_name.eq_ignore_ascii_case(category))
            .filter(|bike| !bike.in_maintenance)
            .collect())
    }

    /// Upsert a bike into the store
    pub async fn save(&self, bike: &Bike) -> DataResult<()> {
        self.database.save_bike(bike).await
    }

    /// Rewrite an existing record; `false` when the uuid is unknown
    pub async fn update(&self, bike: &Bike) -> DataResult<bool> {
        self.database.update_bike(bike).await
    }

    /// Remove the addressed record, returning it
    pub async fn delete(&self, uuid: &str) -> DataResult<Option<Bike>> {
        self.database.delete_bike(uuid).await
    }

    /// Toggle the bookable flag without rewriting the record
    pub async fn update_status(&self, uuid: &str, is_active: bool) -> DataResult<bool> {
        debug!("Updating bike {} active={}", uuid, is_active);
        self.database.set_bike_active(uuid, is_active).await
    }

    /// Toggle the rented flag without rewriting the record
    pub async fn update_rent_status(&self, uuid: &str, is_rented: bool) -> DataResult<bool> {
        debug!("Updating bike {} rented={}", uuid, is_rented);
        self.database.set_bike_rented(uuid, is_rented).await
    }

    /// All stored bikes currently switched on
    pub async fn active_bikes(&self) -> DataResult<Vec<Bike>> {
        let bikes = self.database.get_bikes().await?;
        Ok(bikes.into_iter().filter(|bike| bike.is_active).collect())
    }

    /// First active bike in the rentable fleet, if any
    ///
    /// Unlike [`Self::active_bikes`] this runs the full `get_all` chain, so
    /// maintenance vehicles are excluded and a cold store is populated from
    /// seed or backend first.
    pub async fn first_active(&self) -> DataResult<Option<Bike>> {
        let bikes = self.get_all().await?;
        Ok(bikes.into_iter().find(|bike| bike.is_active))
    }

    /// Backend health, always remote; unreachable backends yield the sentinel
    pub async fn status(&self) -> ServerStatus {
        self.gateway.server_status().await
    }
}
