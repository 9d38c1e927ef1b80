// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Pricing Repository
//!
//! Versioned pricing snapshots. This entity kind has no remote tier: the
//! chain is Entity Store -> Seed Loader, with seed hits written back so
//! subsequent reads are store hits. Snapshots are replace-only, individual
//! plans inside one are never patched.

use crate::database::Database;
use crate::errors::DataResult;
use crate::logging::DataLogger;
use crate::models::SystemPricingPlan;
use crate::seed::SeedStore;
use std::sync::Arc;
use tracing::debug;

/// Repository for [`SystemPricingPlan`] snapshots
pub struct PricingRepository {
    database: Arc<Database>,
    seed: Arc<SeedStore>,
}

impl PricingRepository {
    pub fn new(database: Arc<Database>, seed: Arc<SeedStore>) -> Self {
        Self { database, seed }
    }

    async fn write_back(&self, plan: &SystemPricingPlan) {
        if let Err(err) = self.database.save_plan(plan).await {
            DataLogger::log_store_fault("pricing", &plan.version, &err.to_string());
        }
    }

    /// The current snapshot, whatever its version
    pub async fn get(&self) -> DataResult<Option<SystemPricingPlan>> {
        if let Some(plan) = self.database.first_plan().await? {
            debug!("Pricing snapshot {} served from store", plan.version);
            return Ok(Some(plan));
        }
        match self.seed.first_plan().await {
            Some(plan) => {
                DataLogger::log_cache_promotion("pricing", &plan.version, "seed");
                self.write_back(&plan).await;
                Ok(Some(plan))
            }
            None => Ok(None),
        }
    }

    /// Get a snapshot by version
    pub async fn get_by_version(&self, version: &str) -> DataResult<Option<SystemPricingPlan>> {
        if let Some(plan) = self.database.get_plan_by_version(version).await? {
            return Ok(Some(plan));
        }
        match self.seed.get_plan_by_version(version).await {
            Some(plan) => {
                DataLogger::log_cache_promotion("pricing", version, "seed");
                self.write_back(&plan).await;
                Ok(Some(plan))
            }
            None => Ok(None),
        }
    }

    /// Upsert a snapshot into the store
    pub async fn save(&self, plan: &SystemPricingPlan) -> DataResult<()> {
        self.database.save_plan(plan).await
    }

    /// Rewrite an existing snapshot; `false` when the version is unknown
    pub async fn update(&self, plan: &SystemPricingPlan) -> DataResult<bool> {
        self.database.update_plan(plan).await
    }

    /// Remove the addressed snapshot, returning it
    pub async fn delete(&self, version: &str) -> DataResult<Option<SystemPricingPlan>> {
        self.database.delete_plan(version).await
    }
}
