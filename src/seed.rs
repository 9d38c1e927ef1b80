// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Seed Loader
//!
//! In-memory fallback tier fed from static JSON fixtures bundled into the
//! binary (`seed/` directory). Each fixture is parsed lazily on first access
//! and exactly once per process; afterwards the indexes are read-mostly maps
//! behind an `RwLock` so the insert/upsert mutations are race-free. The
//! underlying assets are never written.
//!
//! Missing or malformed fixtures yield an empty index; "no seed data" is a
//! normal state, not an error. Fixture shapes: `bikes.json` is
//! `{"bike": [...]}`, `users.json` is `{"user": [...]}`, and
//! `system_pricing_plans.json` is a single snapshot document
//! `{last_updated, ttl, version, data: {plans: [...]}}` keyed by its
//! version. Timestamps in fixtures are RFC 3339.

use crate::models::{Bike, SystemPricingPlan, User};
use rust_embed::Embed;
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Embed)]
#[folder = "seed/"]
struct SeedAssets;

const BIKES_FIXTURE: &str = "bikes.json";
const USERS_FIXTURE: &str = "users.json";
const PLANS_FIXTURE: &str = "system_pricing_plans.json";

#[derive(Debug, Deserialize)]
struct BikeSeedDocument {
    #[serde(default)]
    bike: Vec<Bike>,
}

#[derive(Debug, Deserialize)]
struct UserSeedDocument {
    #[serde(default)]
    user: Vec<User>,
}

/// Users are reachable by id and by normalized email
#[derive(Default)]
struct UserIndex {
    by_id: HashMap<Uuid, User>,
    by_email: HashMap<String, Uuid>,
}

impl UserIndex {
    fn insert(&mut self, user: User) {
        self.by_email
            .insert(normalize_email(&user.email), user.uuid);
        self.by_id.insert(user.uuid, user);
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

enum SeedSource {
    /// Fixtures embedded from the crate's `seed/` directory
    Bundled,
    /// Literal JSON documents, used by tests and by hosts that ship their own
    Inline {
        bikes: Option<String>,
        users: Option<String>,
        plans: Option<String>,
    },
}

/// The seed tier: fixture-backed, in-memory, initialized once
pub struct SeedStore {
    source: SeedSource,
    bikes: OnceCell<RwLock<HashMap<String, Bike>>>,
    users: OnceCell<RwLock<UserIndex>>,
    plans: OnceCell<RwLock<HashMap<String, SystemPricingPlan>>>,
}

impl SeedStore {
    /// Seed store over the fixtures bundled into the binary
    pub fn bundled() -> Self {
        Self::with_source(SeedSource::Bundled)
    }

    /// Seed store over literal JSON documents (any of them may be absent)
    pub fn from_json(
        bikes: Option<String>,
        users: Option<String>,
        plans: Option<String>,
    ) -> Self {
        Self::with_source(SeedSource::Inline {
            bikes,
            users,
            plans,
        })
    }

    fn with_source(source: SeedSource) -> Self {
        Self {
            source,
            bikes: OnceCell::new(),
            users: OnceCell::new(),
            plans: OnceCell::new(),
        }
    }

    fn raw_fixture(&self, name: &str) -> Option<String> {
        match &self.source {
            SeedSource::Bundled => SeedAssets::get(name)
                .map(|file| String::from_utf8_lossy(file.data.as_ref()).into_owned()),
            SeedSource::Inline {
                bikes,
                users,
                plans,
            } => match name {
                BIKES_FIXTURE => bikes.clone(),
                USERS_FIXTURE => users.clone(),
                PLANS_FIXTURE => plans.clone(),
                _ => None,
            },
        }
    }

    // ----- bikes -----

    async fn bike_index(&self) -> &RwLock<HashMap<String, Bike>> {
        self.bikes
            .get_or_init(|| async {
                let mut index = HashMap::new();
                if let Some(raw) = self.raw_fixture(BIKES_FIXTURE) {
                    match serde_json::from_str::<BikeSeedDocument>(&raw) {
                        Ok(document) => {
                            for bike in document.bike {
                                index.insert(bike.uuid.clone(), bike);
                            }
                            debug!("Loaded {} bikes from seed fixture", index.len());
                        }
                        Err(err) => warn!("Ignoring malformed bike seed fixture: {}", err),
                    }
                }
                RwLock::new(index)
            })
            .await
    }

    /// Get seed bike by uuid
    pub async fn get_bike(&self, uuid: &str) -> Option<Bike> {
        self.bike_index().await.read().await.get(uuid).cloned()
    }

    /// Get all seed bikes
    pub async fn get_bikes(&self) -> Vec<Bike> {
        self.bike_index().await.read().await.values().cloned().collect()
    }

    /// Get one arbitrary seed bike
    pub async fn first_bike(&self) -> Option<Bike> {
        self.bike_index().await.read().await.values().next().cloned()
    }

    /// Add a bike unless that uuid is already present
    pub async fn insert_bike(&self, bike: Bike) -> bool {
        let index = self.bike_index().await;
        let mut guard = index.write().await;
        if guard.contains_key(&bike.uuid) {
            return false;
        }
        guard.insert(bike.uuid.clone(), bike);
        true
    }

    /// Add or replace a bike
    pub async fn upsert_bike(&self, bike: Bike) {
        let index = self.bike_index().await;
        index.write().await.insert(bike.uuid.clone(), bike);
    }

    // ----- users -----

    async fn user_index(&self) -> &RwLock<UserIndex> {
        self.users
            .get_or_init(|| async {
                let mut index = UserIndex::default();
                if let Some(raw) = self.raw_fixture(USERS_FIXTURE) {
                    match serde_json::from_str::<UserSeedDocument>(&raw) {
                        Ok(document) => {
                            for user in document.user {
                                index.insert(user);
                            }
                            debug!("Loaded {} users from seed fixture", index.by_id.len());
                        }
                        Err(err) => warn!("Ignoring malformed user seed fixture: {}", err),
                    }
                }
                RwLock::new(index)
            })
            .await
    }

    /// Get seed user by id
    pub async fn get_user(&self, uuid: Uuid) -> Option<User> {
        self.user_index().await.read().await.by_id.get(&uuid).cloned()
    }

    /// Get seed user by email (trimmed, lowercased before matching)
    pub async fn get_user_by_email(&self, email: &str) -> Option<User> {
        let index = self.user_index().await;
        let guard = index.read().await;
        let id = guard.by_email.get(&normalize_email(email))?;
        guard.by_id.get(id).cloned()
    }

    /// Get all seed users
    pub async fn get_users(&self) -> Vec<User> {
        self.user_index()
            .await
            .read()
            .await
            .by_id
            .values()
            .cloned()
            .collect()
    }

    /// Get one arbitrary seed user
    pub async fn first_user(&self) -> Option<User> {
        self.user_index()
            .await
            .read()
            .await
            .by_id
            .values()
            .next()
            .cloned()
    }

    /// Add a user unless that id is already present
    pub async fn insert_user(&self, user: User) -> bool {
        let index = self.user_index().await;
        let mut guard = index.write().await;
        if guard.by_id.contains_key(&user.uuid) {
            return false;
        }
        guard.insert(user);
        true
    }

    /// Add or replace a user
    pub async fn upsert_user(&self, user: User) {
        let index = self.user_index().await;
        index.write().await.insert(user);
    }

    // ----- pricing plans -----

    async fn plan_index(&self) -> &RwLock<HashMap<String, SystemPricingPlan>> {
        self.plans
            .get_or_init(|| async {
                let mut index = HashMap::new();
                if let Some(raw) = self.raw_fixture(PLANS_FIXTURE) {
                    match serde_json::from_str::<SystemPricingPlan>(&raw) {
                        Ok(snapshot) => {
                            debug!(
                                "Loaded pricing snapshot {} from seed fixture",
                                snapshot.version
                            );
                            index.insert(snapshot.version.clone(), snapshot);
                        }
                        Err(err) => warn!("Ignoring malformed pricing seed fixture: {}", err),
                    }
                }
                RwLock::new(index)
            })
            .await
    }

    /// Get seed pricing snapshot by version
    pub async fn get_plan_by_version(&self, version: &str) -> Option<SystemPricingPlan> {
        self.plan_index().await.read().await.get(version).cloned()
    }

    /// Get all seed pricing snapshots
    pub async fn get_plans(&self) -> Vec<SystemPricingPlan> {
        self.plan_index().await.read().await.values().cloned().collect()
    }

    /// Get one arbitrary seed pricing snapshot
    pub async fn first_plan(&self) -> Option<SystemPricingPlan> {
        self.plan_index().await.read().await.values().next().cloned()
    }

    /// Add a snapshot unless that version is already present
    pub async fn insert_plan(&self, plan: SystemPricingPlan) -> bool {
        let index = self.plan_index().await;
        let mut guard = index.write().await;
        if guard.contains_key(&plan.version) {
            return false;
        }
        guard.insert(plan.version.clone(), plan);
        true
    }

    /// Add or replace a snapshot
    pub async fn upsert_plan(&self, plan: SystemPricingPlan) {
        let index = self.plan_index().await;
        index.write().await.insert(plan.version.clone(), plan);
    }
}
