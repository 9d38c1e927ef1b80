// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Data Models
//!
//! This module contains the domain entities handled by the Patinfly data
//! layer. The same types flow through all three data tiers: they are stored
//! in the entity store, parsed out of the bundled seed fixtures, and
//! produced by the remote gateway's wire-model conversions.
//!
//! ## Design Principles
//!
//! - **Tier Agnostic**: one representation regardless of where a record came from
//! - **Serializable**: all models round-trip through JSON (seed fixtures and
//!   the store's JSON columns rely on this)
//! - **No Hidden State**: records carry everything the host needs; nothing is
//!   synthesized on access
//!
//! ## Core Models
//!
//! - [`Bike`]: a rentable vehicle with its availability flags
//! - [`User`]: an account with credentials and session token material
//! - [`SystemPricingPlan`]: a versioned snapshot of the service's pricing plans
//! - [`ServerStatus`]: backend health/version info with an error sentinel

use crate::constants::accounts;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a single rentable bike
///
/// A bike carries identity, classification, telemetry and the availability
/// flags the rental flows toggle. `is_active` and `is_rented` are independent
/// booleans; the data model does not force them to be mutually exclusive.
///
/// # Examples
///
/// ```rust
/// use patinfly_core::models::{Bike, BikeType};
/// use chrono::Utc;
///
/// let bike = Bike {
///     uuid: "a1b2c3d4".to_string(),
///     name: "Campus 7".to_string(),
///     bike_type: BikeType::from_type_id("EB-01"),
///     bike_type_name: "Electric".to_string(),
///     creation_date: Utc::now(),
///     last_maintenance_date: None,
///     in_maintenance: false,
///     is_active: true,
///     is_deleted: false,
///     battery_level: 87,
///     meters: 1200,
///     is_rented: false,
///     lat: Some(41.3874),
///     lon: Some(2.1686),
///     is_reserved: false,
///     rental_uris: String::new(),
///     group_course: None,
/// };
/// assert!(!bike.in_maintenance);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bike {
    /// Unique identifier, primary key across every tier
    pub uuid: String,
    /// Human-readable vehicle name
    pub name: String,
    /// Classification of the vehicle (electric, urban, ...)
    pub bike_type: BikeType,
    /// Flattened copy of the type name, used for category filtering
    pub bike_type_name: String,
    /// When this record first entered the system (UTC)
    pub creation_date: DateTime<Utc>,
    /// Last recorded maintenance visit, if any
    #[serde(default)]
    pub last_maintenance_date: Option<DateTime<Utc>>,
    /// Bike is in the workshop; never surfaced to renters
    pub in_maintenance: bool,
    /// Bike is switched on and bookable
    pub is_active: bool,
    /// Soft-delete marker from the backend
    pub is_deleted: bool,
    /// Battery charge, 0-100
    pub battery_level: i32,
    /// Odometer since last charge, in meters
    pub meters: i32,
    /// Currently rented out
    pub is_rented: bool,
    /// Last known latitude, if the vehicle reported one
    #[serde(default)]
    pub lat: Option<f64>,
    /// Last known longitude, if the vehicle reported one
    #[serde(default)]
    pub lon: Option<f64>,
    /// Held by a reservation
    #[serde(default)]
    pub is_reserved: bool,
    /// Deep links for starting a rental from a phone
    #[serde(default)]
    pub rental_uris: String,
    /// Course/fleet grouping tag assigned by the backend
    #[serde(default)]
    pub group_course: Option<String>,
}

/// Classification of a bike, derived from the backend's vehicle type id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BikeType {
    /// Identifier of the type (the backend's vehicle_type_id)
    pub uuid: String,
    /// Human-readable type name ("Electric", "Urban", "Gas", "Unknown")
    pub name: String,
    /// Raw type tag as sent on the wire
    #[serde(rename = "type")]
    pub type_id: String,
}

impl BikeType {
    /// Derive a bike type from a backend vehicle type id
    ///
    /// The backend encodes the vehicle family in the id prefix: `EB` for
    /// electric bikes, `RB` for urban road bikes, `SCOOTER` for gas scooters.
    /// Anything else maps to "Unknown".
    pub fn from_type_id(type_id: &str) -> Self {
        let name = if type_id.starts_with("EB") {
            "Electric"
        } else if type_id.starts_with("RB") {
            "Urban"
        } else if type_id.starts_with("SCOOTER") {
            "Gas"
        } else {
            "Unknown"
        };
        Self {
            uuid: type_id.to_string(),
            name: name.to_string(),
            type_id: type_id.to_string(),
        }
    }
}

/// Represents a registered user of the service
///
/// Besides profile data the record carries the token material returned by
/// login. The expiry fields are opaque server-issued strings; this layer
/// stores them but never enforces expiry.
///
/// # Examples
///
/// ```rust
/// use patinfly_core::models::User;
///
/// let user = User::new(
///     "rider@patinfly.dev",
///     "$2b$12$abcdefghijklmnopqrstuv",
///     Some("Rider".to_string()),
/// );
/// assert_eq!(user.email, "rider@patinfly.dev");
/// assert_eq!(user.group, "default");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Primary key, stable across remote fetches of the same account
    pub uuid: Uuid,
    /// Display name
    pub name: String,
    /// Secondary unique key; lookups trim and lowercase before matching
    pub email: String,
    /// bcrypt hash of the account password
    pub hashed_password: String,
    /// When the account was registered (UTC)
    pub created_at: DateTime<Utc>,
    /// Last successful login (UTC)
    pub last_connection: DateTime<Utc>,
    /// Installation identifier of the device the account last used
    #[serde(default)]
    pub device_id: String,
    /// Bearer token issued by the backend
    #[serde(default)]
    pub access_token: String,
    /// Refresh token issued by the backend
    #[serde(default)]
    pub refresh_token: String,
    /// Expiry of the access token, opaque and unenforced
    #[serde(default)]
    pub token_expires: String,
    /// Expiry of the refresh token, opaque and unenforced
    #[serde(default)]
    pub refresh_expires: String,
    /// Group/fleet tag the account belongs to
    #[serde(default)]
    pub group: String,
}

impl User {
    /// Create a user with fresh timestamps and no token material
    pub fn new(email: &str, hashed_password: &str, name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            uuid: Uuid::new_v4(),
            name: name.unwrap_or_default(),
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            created_at: now,
            last_connection: now,
            device_id: String::new(),
            access_token: String::new(),
            refresh_token: String::new(),
            token_expires: String::new(),
            refresh_expires: String::new(),
            group: accounts::DEFAULT_GROUP.to_string(),
        }
    }
}

/// A versioned snapshot of the service's pricing plans
///
/// Snapshots are replace-only: a new version overwrites the old record
/// wholesale, individual plans inside `data` are never patched.
///
/// # Examples
///
/// ```rust
/// use patinfly_core::models::{SystemPricingPlan, PlanData, Plan, LocalizedText};
/// use chrono::Utc;
///
/// let snapshot = SystemPricingPlan {
///     version: "2.3".to_string(),
///     last_updated: Utc::now(),
///     ttl: 0,
///     data: PlanData {
///         plans: vec![Plan {
///             plan_id: "basic".to_string(),
///             name: vec![LocalizedText {
///                 text: "Basic".to_string(),
///                 language: "en".to_string(),
///             }],
///             currency: "EUR".to_string(),
///             price: 1.5,
///             is_taxable: false,
///             description: vec![],
///             per_km_pricing: vec![],
///             per_min_pricing: vec![],
///         }],
///     },
/// };
/// assert_eq!(snapshot.data.plans.len(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemPricingPlan {
    /// Snapshot version, primary key
    pub version: String,
    /// When the backend last regenerated this snapshot (UTC)
    pub last_updated: DateTime<Utc>,
    /// Seconds the snapshot may be cached before it should be refreshed
    pub ttl: i64,
    /// The plans themselves
    pub data: PlanData,
}

/// Container for the plan list inside a pricing snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanData {
    /// All plans offered in this snapshot; `plan_id` is unique within the list
    pub plans: Vec<Plan>,
}

/// A single pricing plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Identifier of the plan, unique within a snapshot
    pub plan_id: String,
    /// Localized plan names
    pub name: Vec<LocalizedText>,
    /// ISO 4217 currency code
    pub currency: String,
    /// Base price to start a rental
    pub price: f64,
    /// Whether tax applies on top of the listed price
    pub is_taxable: bool,
    /// Localized plan descriptions
    #[serde(default)]
    pub description: Vec<LocalizedText>,
    /// Distance-based rate segments
    #[serde(default)]
    pub per_km_pricing: Vec<PricingRate>,
    /// Time-based rate segments
    #[serde(default)]
    pub per_min_pricing: Vec<PricingRate>,
}

/// A translated string with its language tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub text: String,
    pub language: String,
}

/// One segment of a distance- or time-based pricing curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRate {
    /// Unit offset at which this rate starts applying
    pub start: f64,
    /// Price charged per unit within this segment
    pub rate: f64,
    /// Unit width of each billing step
    pub interval: i64,
}

/// Backend health and version information
///
/// The status call never fails from the host's point of view: when the
/// backend is unreachable the gateway substitutes [`ServerStatus::unavailable`]
/// so screens can always render something.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
    /// Backend semantic version
    pub version: String,
    /// Build identifier
    pub build: String,
    /// Date of the last backend deployment
    pub update: String,
    /// Service name as reported by the backend
    pub name: String,
}

impl ServerStatus {
    /// Sentinel returned when the status endpoint cannot be reached
    pub fn unavailable() -> Self {
        Self {
            version: "0.0".to_string(),
            build: "0".to_string(),
            update: String::new(),
            name: "error".to_string(),
        }
    }

    /// True if this value is the unreachable-backend sentinel
    pub fn is_unavailable(&self) -> bool {
        self.name == "error" && self.version == "0.0"
    }
}
