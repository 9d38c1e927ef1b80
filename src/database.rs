// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Entity Store
//!
//! Durable on-device storage for the three entity kinds, backed by SQLite.
//! This is the authoritative cache tier: once a record lands here, reads are
//! served locally and never re-fetch from the network. Saves are upserts
//! (replace-on-conflict), deletes address an explicit primary key, and Bike
//! additionally supports single-field flag updates so rental toggles don't
//! rewrite whole rows.
//!
//! Timestamps are stored as RFC 3339 TEXT; the nested structures (bike type,
//! plan data) are stored as JSON TEXT columns. A lookup miss is `Ok(None)`;
//! only a real storage fault becomes `DataError::Storage`.

use crate::errors::DataResult;
use crate::models::{Bike, BikeType, PlanData, SystemPricingPlan, User};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// Database manager for bike, user and pricing-plan storage
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection and run migrations
    pub async fn new(database_url: &str) -> DataResult<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let in_memory = database_url.contains(":memory:");
        let connection_options = if database_url.starts_with("sqlite:") && !in_memory {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_string()
        };

        let options = SqliteConnectOptions::from_str(&connection_options)?
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        // Every connection to a `:memory:` URL is its own empty database,
        // so an in-memory pool must stay on a single connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Run database migrations
    pub async fn migrate(&self) -> DataResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS bikes (
                uuid TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                bike_type TEXT NOT NULL,
                bike_type_name TEXT NOT NULL,
                creation_date TEXT NOT NULL,
                last_maintenance_date TEXT,
                in_maintenance BOOLEAN NOT NULL DEFAULT 0,
                is_active BOOLEAN NOT NULL DEFAULT 0,
                is_deleted BOOLEAN NOT NULL DEFAULT 0,
                battery_level INTEGER NOT NULL DEFAULT 0,
                meters INTEGER NOT NULL DEFAULT 0,
                is_rented BOOLEAN NOT NULL DEFAULT 0,
                lat REAL,
                lon REAL,
                is_reserved BOOLEAN NOT NULL DEFAULT 0,
                rental_uris TEXT NOT NULL DEFAULT '',
                group_course TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL DEFAULT '',
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL,
                last_connection TEXT NOT NULL,
                device_id TEXT NOT NULL DEFAULT '',
                access_token TEXT NOT NULL DEFAULT '',
                refresh_token TEXT NOT NULL DEFAULT '',
                token_expires TEXT NOT NULL DEFAULT '',
                refresh_expires TEXT NOT NULL DEFAULT '',
                user_group TEXT NOT NULL DEFAULT ''
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Create index on email for fast lookups
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pricing_plans (
                version TEXT PRIMARY KEY,
                last_updated TEXT NOT NULL,
                ttl INTEGER NOT NULL DEFAULT 0,
                data TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ----- bikes -----

    /// Upsert a bike (replace-on-conflict by uuid)
    pub async fn save_bike(&self, bike: &Bike) -> DataResult<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO bikes (
                uuid, name, bike_type, bike_type_name, creation_date,
                last_maintenance_date, in_maintenance, is_active, is_deleted,
                battery_level, meters, is_rented, lat, lon, is_reserved,
                rental_uris, group_course
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            "#,
        )
        .bind(&bike.uuid)
        .bind(&bike.name)
        .bind(serde_json::to_string(&bike.bike_type)?)
        .bind(&bike.bike_type_name)
        .bind(bike.creation_date.to_rfc3339())
        .bind(bike.last_maintenance_date.map(|d| d.to_rfc3339()))
        .bind(bike.in_maintenance)
        .bind(bike.is_active)
        .bind(bike.is_deleted)
        .bind(bike.battery_level)
        .bind(bike.meters)
        .bind(bike.is_rented)
        .bind(bike.lat)
        .bind(bike.lon)
        .bind(bike.is_reserved)
        .bind(&bike.rental_uris)
        .bind(&bike.group_course)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get bike by uuid
    pub async fn get_bike(&self, uuid: &str) -> DataResult<Option<Bike>> {
        let row = sqlx::query("SELECT * FROM bikes WHERE uuid = ?1")
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.row_to_bike(row)?)),
            None => Ok(None),
        }
    }

    /// Get all bikes
    pub async fn get_bikes(&self) -> DataResult<Vec<Bike>> {
        let rows = sqlx::query("SELECT * FROM bikes")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(|row| self.row_to_bike(row)).collect()
    }

    /// Get one arbitrary bike (call sites that assume a single record)
    pub async fn first_bike(&self) -> DataResult<Option<Bike>> {
        let row = sqlx::query("SELECT * FROM bikes LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.row_to_bike(row)?)),
            None => Ok(None),
        }
    }

    /// Update an existing bike row; false when the uuid is absent
    pub async fn update_bike(&self, bike: &Bike) -> DataResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bikes
            SET name = ?1, bike_type = ?2, bike_type_name = ?3, creation_date = ?4,
                last_maintenance_date = ?5, in_maintenance = ?6, is_active = ?7,
                is_deleted = ?8, battery_level = ?9, meters = ?10, is_rented = ?11,
                lat = ?12, lon = ?13, is_reserved = ?14, rental_uris = ?15,
                group_course = ?16
            WHERE uuid = ?17
            "#,
        )
        .bind(&bike.name)
        .bind(serde_json::to_string(&bike.bike_type)?)
        .bind(&bike.bike_type_name)
        .bind(bike.creation_date.to_rfc3339())
        .bind(bike.last_maintenance_date.map(|d| d.to_rfc3339()))
        .bind(bike.in_maintenance)
        .bind(bike.is_active)
        .bind(bike.is_deleted)
        .bind(bike.battery_level)
        .bind(bike.meters)
        .bind(bike.is_rented)
        .bind(bike.lat)
        .bind(bike.lon)
        .bind(bike.is_reserved)
        .bind(&bike.rental_uris)
        .bind(&bike.group_course)
        .bind(&bike.uuid)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Flip only the is_active flag
    pub async fn set_bike_active(&self, uuid: &str, is_active: bool) -> DataResult<bool> {
        let result = sqlx::query("UPDATE bikes SET is_active = ?1 WHERE uuid = ?2")
            .bind(is_active)
            .bind(uuid)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Flip only the is_rented flag
    pub async fn set_bike_rented(&self, uuid: &str, is_rented: bool) -> DataResult<bool> {
        let result = sqlx::query("UPDATE bikes SET is_rented = ?1 WHERE uuid = ?2")
            .bind(is_rented)
            .bind(uuid)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a bike by uuid, returning the removed record
    pub async fn delete_bike(&self, uuid: &str) -> DataResult<Option<Bike>> {
        let existing = self.get_bike(uuid).await?;
        if existing.is_some() {
            sqlx::query("DELETE FROM bikes WHERE uuid = ?1")
                .bind(uuid)
                .execute(&self.pool)
                .await?;
        }
        Ok(existing)
    }

    // ----- users -----

    /// Upsert a user (replace-on-conflict by id or unique email)
    pub async fn save_user(&self, user: &User) -> DataResult<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO users (
                id, name, email, password_hash, created_at, last_connection,
                device_id, access_token, refresh_token, token_expires,
                refresh_expires, user_group
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(user.uuid.to_string())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.hashed_password)
        .bind(user.created_at.to_rfc3339())
        .bind(user.last_connection.to_rfc3339())
        .bind(&user.device_id)
        .bind(&user.access_token)
        .bind(&user.refresh_token)
        .bind(&user.token_expires)
        .bind(&user.refresh_expires)
        .bind(&user.group)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get user by ID
    pub async fn get_user(&self, user_id: Uuid) -> DataResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?1")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.row_to_user(row)?)),
            None => Ok(None),
        }
    }

    /// Get user by email; both sides of the match are trimmed and lowercased
    pub async fn get_user_by_email(&self, email: &str) -> DataResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE LOWER(TRIM(email)) = ?1")
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.row_to_user(row)?)),
            None => Ok(None),
        }
    }

    /// Get all users
    pub async fn get_users(&self) -> DataResult<Vec<User>> {
        let rows = sqlx::query("SELECT * FROM users")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(|row| self.row_to_user(row)).collect()
    }

    /// Get one arbitrary user (the single active account in practice)
    pub async fn first_user(&self) -> DataResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.row_to_user(row)?)),
            None => Ok(None),
        }
    }

    /// Update an existing user row; false when the id is absent
    pub async fn update_user(&self, user: &User) -> DataResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = ?1, email = ?2, password_hash = ?3, created_at = ?4,
                last_connection = ?5, device_id = ?6, access_token = ?7,
                refresh_token = ?8, token_expires = ?9, refresh_expires = ?10,
                user_group = ?11
            WHERE id = ?12
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.hashed_password)
        .bind(user.created_at.to_rfc3339())
        .bind(user.last_connection.to_rfc3339())
        .bind(&user.device_id)
        .bind(&user.access_token)
        .bind(&user.refresh_token)
        .bind(&user.token_expires)
        .bind(&user.refresh_expires)
        .bind(&user.group)
        .bind(user.uuid.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a user by id, returning the removed record
    pub async fn delete_user(&self, user_id: Uuid) -> DataResult<Option<User>> {
        let existing = self.get_user(user_id).await?;
        if existing.is_some() {
            sqlx::query("DELETE FROM users WHERE id = ?1")
                .bind(user_id.to_string())
                .execute(&self.pool)
                .await?;
        }
        Ok(existing)
    }

    // ----- pricing plans -----

    /// Upsert a pricing snapshot (replace-on-conflict by version)
    pub async fn save_plan(&self, plan: &SystemPricingPlan) -> DataResult<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO pricing_plans (version, last_updated, ttl, data)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&plan.version)
        .bind(plan.last_updated.to_rfc3339())
        .bind(plan.ttl)
        .bind(serde_json::to_string(&plan.data)?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a pricing snapshot by version
    pub async fn get_plan_by_version(
        &self,
        version: &str,
    ) -> DataResult<Option<SystemPricingPlan>> {
        let row = sqlx::query("SELECT * FROM pricing_plans WHERE version = ?1")
            .bind(version)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.row_to_plan(row)?)),
            None => Ok(None),
        }
    }

    /// Get all pricing snapshots
    pub async fn get_plans(&self) -> DataResult<Vec<SystemPricingPlan>> {
        let rows = sqlx::query("SELECT * FROM pricing_plans")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(|row| self.row_to_plan(row)).collect()
    }

    /// Get one arbitrary pricing snapshot
    pub async fn first_plan(&self) -> DataResult<Option<SystemPricingPlan>> {
        let row = sqlx::query("SELECT * FROM pricing_plans LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.row_to_plan(row)?)),
            None => Ok(None),
        }
    }

    /// Update an existing pricing snapshot; false when the version is absent
    pub async fn update_plan(&self, plan: &SystemPricingPlan) -> DataResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE pricing_plans
            SET last_updated = ?1, ttl = ?2, data = ?3
            WHERE version = ?4
            "#,
        )
        .bind(plan.last_updated.to_rfc3339())
        .bind(plan.ttl)
        .bind(serde_json::to_string(&plan.data)?)
        .bind(&plan.version)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a pricing snapshot by version, returning the removed record
    pub async fn delete_plan(&self, version: &str) -> DataResult<Option<SystemPricingPlan>> {
        let existing = self.get_plan_by_version(version).await?;
        if existing.is_some() {
            sqlx::query("DELETE FROM pricing_plans WHERE version = ?1")
                .bind(version)
                .execute(&self.pool)
                .await?;
        }
        Ok(existing)
    }

    // ----- row mappers -----

    /// Convert database row to Bike model
    fn row_to_bike(&self, row: sqlx::sqlite::SqliteRow) -> DataResult<Bike> {
        let bike_type_json: String = row.try_get("bike_type")?;
        let bike_type: BikeType = serde_json::from_str(&bike_type_json)?;

        let creation_date_str: String = row.try_get("creation_date")?;
        let creation_date = DateTime::parse_from_rfc3339(&creation_date_str)?.with_timezone(&Utc);

        let last_maintenance_str: Option<String> = row.try_get("last_maintenance_date")?;
        let last_maintenance_date = match last_maintenance_str {
            Some(s) => Some(DateTime::parse_from_rfc3339(&s)?.with_timezone(&Utc)),
            None => None,
        };

        Ok(Bike {
            uuid: row.try_get("uuid")?,
            name: row.try_get("name")?,
            bike_type,
            bike_type_name: row.try_get("bike_type_name")?,
            creation_date,
            last_maintenance_date,
            in_maintenance: row.try_get("in_maintenance")?,
            is_active: row.try_get("is_active")?,
            is_deleted: row.try_get("is_deleted")?,
            battery_level: row.try_get("battery_level")?,
            meters: row.try_get("meters")?,
            is_rented: row.try_get("is_rented")?,
            lat: row.try_get("lat")?,
            lon: row.try_get("lon")?,
            is_reserved: row.try_get("is_reserved")?,
            rental_uris: row.try_get("rental_uris")?,
            group_course: row.try_get("group_course")?,
        })
    }

    /// Convert database row to User model
    fn row_to_user(&self, row: sqlx::sqlite::SqliteRow) -> DataResult<User> {
        let id_str: String = row.try_get("id")?;
        let uuid = Uuid::parse_str(&id_str)?;

        let created_at_str: String = row.try_get("created_at")?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)?.with_timezone(&Utc);

        let last_connection_str: String = row.try_get("last_connection")?;
        let last_connection =
            DateTime::parse_from_rfc3339(&last_connection_str)?.with_timezone(&Utc);

        Ok(User {
            uuid,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            hashed_password: row.try_get("password_hash")?,
            created_at,
            last_connection,
            device_id: row.try_get("device_id")?,
            access_token: row.try_get("access_token")?,
            refresh_token: row.try_get("refresh_token")?,
            token_expires: row.try_get("token_expires")?,
            refresh_expires: row.try_get("refresh_expires")?,
            group: row.try_get("user_group")?,
        })
    }

    /// Convert database row to SystemPricingPlan model
    fn row_to_plan(&self, row: sqlx::sqlite::SqliteRow) -> DataResult<SystemPricingPlan> {
        let data_json: String = row.try_get("data")?;
        let data: PlanData = serde_json::from_str(&data_json)?;

        let last_updated_str: String = row.try_get("last_updated")?;
        let last_updated = DateTime::parse_from_rfc3339(&last_updated_str)?.with_timezone(&Utc);

        Ok(SystemPricingPlan {
            version: row.try_get("version")?,
            last_updated,
            ttl: row.try_get("ttl")?,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LocalizedText, Plan};

    async fn create_test_db() -> Database {
        Database::new("sqlite::memory:").await.unwrap()
    }

    fn create_sample_bike(uuid: &str) -> Bike {
        Bike {
            uuid: uuid.to_string(),
            name: "Campus 7".to_string(),
            bike_type: BikeType::from_type_id("EB-01"),
            bike_type_name: "Electric".to_string(),
            creation_date: Utc::now(),
            last_maintenance_date: None,
            in_maintenance: false,
            is_active: true,
            is_deleted: false,
            battery_level: 87,
            meters: 1200,
            is_rented: false,
            lat: Some(41.3874),
            lon: Some(2.1686),
            is_reserved: false,
            rental_uris: String::new(),
            group_course: None,
        }
    }

    fn create_sample_plan(version: &str) -> SystemPricingPlan {
        SystemPricingPlan {
            version: version.to_string(),
            last_updated: Utc::now(),
            ttl: 0,
            data: PlanData {
                plans: vec![Plan {
                    plan_id: "plan-basic".to_string(),
                    name: vec![LocalizedText {
                        text: "Basic".to_string(),
                        language: "en".to_string(),
                    }],
                    currency: "EUR".to_string(),
                    price: 1.5,
                    is_taxable: false,
                    description: vec![],
                    per_km_pricing: vec![],
                    per_min_pricing: vec![],
                }],
            },
        }
    }

    #[tokio::test]
    async fn test_save_and_get_bike() {
        let db = create_test_db().await;
        let bike = create_sample_bike("bike-001");

        db.save_bike(&bike).await.unwrap();

        let retrieved = db.get_bike("bike-001").await.unwrap().unwrap();
        assert_eq!(retrieved.name, "Campus 7");
        assert_eq!(retrieved.bike_type, bike.bike_type);
        assert_eq!(retrieved.battery_level, 87);
        assert_eq!(retrieved.lat, Some(41.3874));
        assert!(retrieved.last_maintenance_date.is_none());
    }

    #[tokio::test]
    async fn test_save_bike_is_replace() {
        let db = create_test_db().await;
        let mut bike = create_sample_bike("bike-001");

        db.save_bike(&bike).await.unwrap();
        bike.battery_level = 12;
        db.save_bike(&bike).await.unwrap();

        let all = db.get_bikes().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].battery_level, 12);
    }

    #[tokio::test]
    async fn test_bike_flag_updates() {
        let db = create_test_db().await;
        db.save_bike(&create_sample_bike("bike-001")).await.unwrap();

        assert!(db.set_bike_rented("bike-001", true).await.unwrap());
        assert!(db.set_bike_active("bike-001", false).await.unwrap());

        let bike = db.get_bike("bike-001").await.unwrap().unwrap();
        assert!(bike.is_rented);
        assert!(!bike.is_active);

        // Untouched fields survive the single-field updates
        assert_eq!(bike.battery_level, 87);
        assert_eq!(bike.name, "Campus 7");

        assert!(!db.set_bike_rented("missing", true).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_bike_returns_record() {
        let db = create_test_db().await;
        db.save_bike(&create_sample_bike("bike-001")).await.unwrap();
        assert_eq!(
            db.first_bike().await.unwrap().map(|b| b.uuid),
            Some("bike-001".to_string())
        );

        let removed = db.delete_bike("bike-001").await.unwrap().unwrap();
        assert_eq!(removed.uuid, "bike-001");
        assert!(db.get_bike("bike-001").await.unwrap().is_none());
        assert!(db.first_bike().await.unwrap().is_none());
        assert!(db.delete_bike("bike-001").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_bike_requires_existing_row() {
        let db = create_test_db().await;
        let bike = create_sample_bike("bike-001");

        assert!(!db.update_bike(&bike).await.unwrap());

        db.save_bike(&bike).await.unwrap();
        let mut changed = bike.clone();
        changed.meters = 9000;
        assert!(db.update_bike(&changed).await.unwrap());
        assert_eq!(
            db.get_bike("bike-001").await.unwrap().unwrap().meters,
            9000
        );
    }

    #[tokio::test]
    async fn test_save_and_get_user_by_email_normalized() {
        let db = create_test_db().await;
        let user = User::new("rider@patinfly.dev", "$2b$04$hash", Some("Rider".to_string()));

        db.save_user(&user).await.unwrap();

        let retrieved = db
            .get_user_by_email("  RIDER@Patinfly.DEV ")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(retrieved.uuid, user.uuid);
        assert_eq!(retrieved.email, "rider@patinfly.dev");

        assert!(db
            .get_user_by_email("nobody@patinfly.dev")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_user_round_trip_keeps_token_fields() {
        let db = create_test_db().await;
        let mut user = User::new("rider@patinfly.dev", "$2b$04$hash", None);
        user.access_token = "tok-abc".to_string();
        user.refresh_token = "ref-def".to_string();
        user.token_expires = "2026-01-01T00:00:00Z".to_string();
        user.group = "patinfly".to_string();

        db.save_user(&user).await.unwrap();

        let retrieved = db.get_user(user.uuid).await.unwrap().unwrap();
        assert_eq!(retrieved.access_token, "tok-abc");
        assert_eq!(retrieved.refresh_token, "ref-def");
        assert_eq!(retrieved.token_expires, "2026-01-01T00:00:00Z");
        assert_eq!(retrieved.group, "patinfly");
    }

    #[tokio::test]
    async fn test_first_and_delete_user() {
        let db = create_test_db().await;
        assert!(db.first_user().await.unwrap().is_none());

        let user = User::new("rider@patinfly.dev", "$2b$04$hash", None);
        db.save_user(&user).await.unwrap();

        let first = db.first_user().await.unwrap().unwrap();
        assert_eq!(first.uuid, user.uuid);

        let removed = db.delete_user(user.uuid).await.unwrap().unwrap();
        assert_eq!(removed.uuid, user.uuid);
        assert!(db.get_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_plan_version_lookup_and_data_column() {
        let db = create_test_db().await;
        let plan = create_sample_plan("2.3");

        db.save_plan(&plan).await.unwrap();

        let retrieved = db.get_plan_by_version("2.3").await.unwrap().unwrap();
        assert_eq!(retrieved.version, "2.3");
        assert_eq!(retrieved.data.plans.len(), 1);
        assert_eq!(retrieved.data.plans[0].plan_id, "plan-basic");

        assert!(db.get_plan_by_version("9.9").await.unwrap().is_none());
        assert_eq!(db.first_plan().await.unwrap().unwrap().version, "2.3");
    }

    #[tokio::test]
    async fn test_plan_update_and_delete() {
        let db = create_test_db().await;
        let mut plan = create_sample_plan("2.3");

        assert!(!db.update_plan(&plan).await.unwrap());

        db.save_plan(&plan).await.unwrap();
        plan.ttl = 3600;
        assert!(db.update_plan(&plan).await.unwrap());
        assert_eq!(db.get_plan_by_version("2.3").await.unwrap().unwrap().ttl, 3600);

        let removed = db.delete_plan("2.3").await.unwrap().unwrap();
        assert_eq!(removed.version, "2.3");
        assert!(db.get_plans().await.unwrap().is_empty());
    }
}
