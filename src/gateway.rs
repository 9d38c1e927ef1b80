// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Remote Gateway
//!
//! HTTP client for the Patinfly backend. [`ApiClient`] owns the shared
//! `reqwest` client (30s connect and request timeouts), resolves the bearer
//! token from the injected [`Session`] on every call, and maps wire payloads
//! into the domain models.
//!
//! Error policy differs per endpoint, mirroring what the callers can do
//! about a failure:
//! - `login`, `current_user` and `all_users` surface [`DataError`]: the
//!   user flows must distinguish a rejected login or broken fetch from
//!   "no data".
//! - `bikes` and `bike_by_id` absorb any failure into an empty result so
//!   bike screens keep working from local tiers while offline.
//! - `server_status` substitutes the [`ServerStatus::unavailable`] sentinel,
//!   status display must never block on the backend.

use crate::config::DataConfig;
use crate::constants::{accounts, api, limits};
use crate::errors::{DataError, DataResult};
use crate::models::{Bike, BikeType, ServerStatus, User};
use crate::session::Session;
use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

/// Authenticated client for the Patinfly REST API
pub struct ApiClient {
    client: reqwest::Client,
    session: Arc<Session>,
    login_url: Url,
    user_url: Url,
    vehicle_url: Url,
    status_url: Url,
}

impl ApiClient {
    /// Build a client from the runtime configuration
    ///
    /// The session is consulted for the bearer token on every request; when
    /// it holds none, [`api::STATIC_FALLBACK_TOKEN`] is sent instead. Every
    /// request also carries the fixed `Origin` header the backend's CORS
    /// filter expects.
    pub fn new(config: &DataConfig, session: Arc<Session>) -> DataResult<Self> {
        let mut base = config.api_base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|err| DataError::InvalidPayload(format!("invalid API base URL: {err}")))?;
        let endpoint = |path: &str| {
            base_url
                .join(path)
                .map_err(|err| DataError::InvalidPayload(format!("invalid endpoint path: {err}")))
        };

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            session,
            login_url: endpoint(api::LOGIN_PATH)?,
            user_url: endpoint(api::USER_PATH)?,
            vehicle_url: endpoint(api::VEHICLE_PATH)?,
            status_url: endpoint(api::STATUS_PATH)?,
        })
    }

    async fn bearer_token(&self) -> String {
        match self.session.token().await {
            Some(token) if !token.is_empty() => token,
            _ => api::STATIC_FALLBACK_TOKEN.to_string(),
        }
    }

    /// Authenticate against `POST /api/login`
    ///
    /// Credentials travel in the `Email`/`Password`/`Origin` headers. A
    /// non-2xx answer becomes [`DataError::LoginRejected`] carrying the
    /// status and response body; transport faults propagate as
    /// [`DataError::Transport`].
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        origin: &str,
    ) -> DataResult<LoginResponse> {
        debug!("Requesting login for {}", email);
        let response = self
            .client
            .post(self.login_url.clone())
            .header("Email", email)
            .header("Password", password)
            .header("Origin", origin)
            .bearer_auth(self.bearer_token().await)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Login rejected for {}: status {}", email, status);
            return Err(DataError::LoginRejected(format!("status {status}: {body}")));
        }

        Ok(response.json().await?)
    }

    /// Fetch the authenticated user's profile from `GET /api/user`
    pub async fn current_user(&self) -> DataResult<UserApiModel> {
        let model: UserApiModel = self
            .client
            .get(self.user_url.clone())
            .bearer_auth(self.bearer_token().await)
            .header("Origin", api::DEFAULT_ORIGIN)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(model)
    }

    /// Fetch every account known to the backend (list variant of `/api/user`)
    pub async fn all_users(&self) -> DataResult<Vec<UserApiModel>> {
        let models: Vec<UserApiModel> = self
            .client
            .get(self.user_url.clone())
            .bearer_auth(self.bearer_token().await)
            .header("Origin", api::DEFAULT_ORIGIN)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(models)
    }

    /// Fetch the whole fleet from `GET /api/vehicle`
    ///
    /// Any failure yields an empty list, callers fall back to local tiers.
    pub async fn bikes(&self) -> Vec<Bike> {
        match self.fetch_vehicles().await {
            Ok(models) => {
                debug!("Backend returned {} vehicles", models.len());
                models.iter().map(BikeApiModel::to_bike).collect()
            }
            Err(err) => {
                warn!("Vehicle list unavailable: {}", err);
                Vec::new()
            }
        }
    }

    async fn fetch_vehicles(&self) -> DataResult<Vec<BikeApiModel>> {
        let response: VehiclesResponse = self
            .client
            .get(self.vehicle_url.clone())
            .bearer_auth(self.bearer_token().await)
            .header("Origin", api::DEFAULT_ORIGIN)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.vehicles)
    }

    /// Fetch one vehicle from `GET /api/vehicle/{id}`
    ///
    /// Both "unknown id" and "backend unreachable" come back as `None`.
    pub async fn bike_by_id(&self, id: &str) -> Option<Bike> {
        match self.fetch_vehicle(id).await {
            Ok(model) => Some(model.to_bike()),
            Err(err) => {
                warn!("Vehicle {} unavailable: {}", id, err);
                None
            }
        }
    }

    async fn fetch_vehicle(&self, id: &str) -> DataResult<BikeApiModel> {
        let model: BikeApiModel = self
            .client
            .get(format!("{}/{}", self.vehicle_url, id))
            .bearer_auth(self.bearer_token().await)
            .header("Origin", api::DEFAULT_ORIGIN)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(model)
    }

    /// Fetch backend health from `GET /api/status`
    ///
    /// Never fails: an unreachable backend yields the error sentinel.
    pub async fn server_status(&self) -> ServerStatus {
        match self.fetch_status().await {
            Ok(status) => {
                debug!(
                    "Server status: version={} name={}",
                    status.version, status.name
                );
                status
            }
            Err(err) => {
                warn!("Status endpoint unreachable: {}", err);
                ServerStatus::unavailable()
            }
        }
    }

    async fn fetch_status(&self) -> DataResult<ServerStatus> {
        let status: ServerStatus = self
            .client
            .get(self.status_url.clone())
            .bearer_auth(self.bearer_token().await)
            .header("Origin", api::DEFAULT_ORIGIN)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(status)
    }
}

/// Successful body of `POST /api/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: TokenData,
    pub version: String,
}

/// Token material inside a login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenData {
    pub id: i64,
    pub email: String,
    pub access: String,
    pub expires: String,
    pub refresh: String,
    #[serde(rename = "expires_refresh")]
    pub expires_refresh: String,
}

/// Wire shape of `GET /api/vehicle`
#[derive(Debug, Deserialize)]
struct VehiclesResponse {
    vehicles: Vec<BikeApiModel>,
}

/// A vehicle as the backend serializes it
///
/// Optional telemetry the backend omits stays at its plain default; nothing
/// is synthesized client-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BikeApiModel {
    #[serde(rename = "vehicle_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "vehicle_type_id")]
    pub bike_type_id: String,
    #[serde(rename = "group_course")]
    pub group_course: Option<String>,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub meters: i32,
    #[serde(rename = "lastMaintenanceDate", default)]
    pub last_maintenance_date: Option<String>,
    #[serde(rename = "batteryLevel", default)]
    pub battery_level: i32,
    #[serde(rename = "isDeleted", default)]
    pub is_deleted: bool,
    #[serde(rename = "is_activated", default)]
    pub is_active: bool,
    #[serde(rename = "is_disabled")]
    pub is_disabled: bool,
    #[serde(rename = "is_reserved")]
    pub is_reserved: bool,
    #[serde(rename = "is_rented")]
    pub is_rented: bool,
    #[serde(rename = "rental_uris", default)]
    pub rental_uris: Option<RentalUris>,
    #[serde(rename = "last_reported")]
    pub last_reported: Option<String>,
}

/// Store deep links attached to a vehicle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentalUris {
    pub android: String,
    pub ios: String,
}

impl BikeApiModel {
    /// Convert into the domain [`Bike`]
    ///
    /// The backend flags a workshop vehicle as `is_disabled`; domain-side
    /// that is `in_maintenance`. `creation_date` records when this record
    /// was materialized, the backend does not report one.
    pub fn to_bike(&self) -> Bike {
        let bike_type = BikeType::from_type_id(&self.bike_type_id);
        let bike_type_name = bike_type.name.clone();
        Bike {
            uuid: self.id.clone(),
            name: self.name.clone(),
            bike_type,
            bike_type_name,
            creation_date: Utc::now(),
            last_maintenance_date: parse_maintenance_date(self.last_maintenance_date.as_deref()),
            in_maintenance: self.is_disabled,
            is_active: self.is_active,
            is_deleted: self.is_deleted,
            battery_level: self.battery_level.clamp(limits::BATTERY_MIN, limits::BATTERY_MAX),
            meters: self.meters,
            is_rented: self.is_rented,
            lat: Some(self.lat),
            lon: Some(self.lon),
            is_reserved: self.is_reserved,
            rental_uris: self
                .rental_uris
                .as_ref()
                .map(|uris| format!("Android: {}, iOS: {}", uris.android, uris.ios))
                .unwrap_or_default(),
            group_course: self.group_course.clone(),
        }
    }
}

/// Maintenance dates arrive either as full RFC 3339 timestamps or bare dates
fn parse_maintenance_date(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// An account as the backend serializes it
///
/// Every field is optional on the wire; [`UserApiModel::to_user`] fills the
/// gaps with domain defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserApiModel {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "registeredAt", default)]
    pub registered_at: Option<String>,
    #[serde(rename = "first_name", default)]
    pub first_name: Option<String>,
    #[serde(rename = "last_name", default)]
    pub last_name: Option<String>,
    #[serde(rename = "access_token", default)]
    pub access_token: Option<String>,
    #[serde(rename = "expiration_token", default)]
    pub expiration_token: Option<String>,
    #[serde(rename = "refresh_token", default)]
    pub refresh_token: Option<String>,
    #[serde(rename = "expires_refresh", default)]
    pub expires_refresh: Option<String>,
    #[serde(rename = "server_utc_time", default)]
    pub server_utc_time: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl UserApiModel {
    /// Partial account assembled from a login response
    pub fn from_login(email: &str, token: &TokenData) -> Self {
        Self {
            id: Some(token.id),
            email: Some(email.to_string()),
            access_token: Some(token.access.clone()),
            expiration_token: Some(token.expires.clone()),
            refresh_token: Some(token.refresh.clone()),
            expires_refresh: Some(token.expires_refresh.clone()),
            ..Self::default()
        }
    }

    /// Merge a freshly fetched profile into this login-derived record
    ///
    /// Profile fields prefer `other` when it carries a value. The token
    /// quartet always stays from `self`: the login response is the source
    /// of truth for credentials, whatever the profile endpoint echoes back.
    pub fn merge(&self, other: &UserApiModel) -> UserApiModel {
        UserApiModel {
            id: other.id.or(self.id),
            name: other.name.clone().or_else(|| self.name.clone()),
            registered_at: other
                .registered_at
                .clone()
                .or_else(|| self.registered_at.clone()),
            first_name: other.first_name.clone().or_else(|| self.first_name.clone()),
            last_name: other.last_name.clone().or_else(|| self.last_name.clone()),
            access_token: self.access_token.clone(),
            expiration_token: self.expiration_token.clone(),
            refresh_token: self.refresh_token.clone(),
            expires_refresh: self.expires_refresh.clone(),
            server_utc_time: other
                .server_utc_time
                .clone()
                .or_else(|| self.server_utc_time.clone()),
            group: other.group.clone().or_else(|| self.group.clone()),
            email: other.email.clone().or_else(|| self.email.clone()),
        }
    }

    /// Convert into the domain [`User`]
    ///
    /// The uuid is derived from the backend's numeric id (or, failing that,
    /// the email) so repeated fetches of the same account resolve to the
    /// same primary key instead of accumulating duplicates.
    pub fn to_user(&self, hashed_password: &str) -> User {
        let uuid = match (self.id, self.email.as_deref()) {
            (Some(id), _) => Uuid::new_v5(&Uuid::NAMESPACE_OID, id.to_string().as_bytes()),
            (None, Some(email)) if !email.is_empty() => {
                Uuid::new_v5(&Uuid::NAMESPACE_OID, email.as_bytes())
            }
            _ => Uuid::new_v4(),
        };

        let full_name = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        );
        let full_name = full_name.trim();
        let name = if !full_name.is_empty() {
            full_name.to_string()
        } else if let Some(name) = &self.name {
            name.clone()
        } else {
            // Last resort: the mailbox part of the email, up to the first dot
            self.email
                .as_deref()
                .and_then(|email| email.split('@').next())
                .and_then(|mailbox| mailbox.split('.').next())
                .map(str::to_string)
                .unwrap_or_default()
        };

        User {
            uuid,
            name,
            email: self.email.clone().unwrap_or_default(),
            hashed_password: hashed_password.to_string(),
            created_at: parse_wire_timestamp(self.registered_at.as_deref()),
            last_connection: parse_wire_timestamp(self.server_utc_time.as_deref()),
            device_id: generate_device_id(),
            access_token: self.access_token.clone().unwrap_or_default(),
            refresh_token: self.refresh_token.clone().unwrap_or_default(),
            token_expires: self.expiration_token.clone().unwrap_or_default(),
            refresh_expires: self.expires_refresh.clone().unwrap_or_default(),
            group: self
                .group
                .clone()
                .unwrap_or_else(|| accounts::DEFAULT_GROUP.to_string()),
        }
    }
}

/// Absent wire timestamps default to the moment the record materialized
fn parse_wire_timestamp(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(|value| DateTime::parse_from_rfc3339(value).ok())
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}

/// Installation identifier in the backend's AAA999AAA999 shape
fn generate_device_id() -> String {
    let mut rng = rand::thread_rng();
    let mut id = String::with_capacity(12);
    for block in 0..4 {
        for _ in 0..3 {
            if block % 2 == 0 {
                id.push(rng.gen_range(b'A'..=b'Z') as char);
            } else {
                id.push(rng.gen_range(b'0'..=b'9') as char);
            }
        }
    }
    id
}
