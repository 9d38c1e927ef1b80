// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! End-to-end integration tests
//!
//! These tests verify complete workflows from configuration loading
//! through login and fleet browsing to offline operation and restart.

use anyhow::Result;
use chrono::Utc;
use mockito::Server;
use patinfly_core::config::DataConfig;
use patinfly_core::errors::DataError;
use patinfly_core::models::{Bike, BikeType};
use patinfly_core::repository::DataServices;
use patinfly_core::seed::SeedStore;
use serde_json::json;
use tempfile::TempDir;

fn wire_vehicle(id: &str) -> serde_json::Value {
    json!({
        "vehicle_id": id,
        "name": format!("Vehicle {id}"),
        "vehicle_type_id": "EB-01",
        "group_course": null,
        "lat": 41.3874,
        "lon": 2.1686,
        "meters": 1200,
        "batteryLevel": 87,
        "isDeleted": false,
        "is_activated": true,
        "is_disabled": false,
        "is_reserved": false,
        "is_rented": false,
        "last_reported": "2024-05-01T10:00:00Z"
    })
}

fn seed_bike(uuid: &str) -> Bike {
    let bike_type = BikeType::from_type_id("RB-01");
    let bike_type_name = bike_type.name.clone();
    Bike {
        uuid: uuid.to_string(),
        name: format!("Bike {uuid}"),
        bike_type,
        bike_type_name,
        creation_date: Utc::now(),
        last_maintenance_date: None,
        in_maintenance: false,
        is_active: true,
        is_deleted: false,
        battery_level: 64,
        meters: 900,
        is_rented: false,
        lat: None,
        lon: None,
        is_reserved: false,
        rental_uris: String::new(),
        group_course: None,
    }
}

/// Integration test that verifies the complete rider workflow across a
/// login, a fleet sync, an offline stretch and an app restart
#[tokio::test]
async fn test_complete_rider_workflow() -> Result<()> {
    let mut server = Server::new_async().await;
    let login_mock = server
        .mock("POST", "/api/login")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "success": true,
                "token": {
                    "id": 42,
                    "email": "rider@patinfly.dev",
                    "access": "access-abc",
                    "expires": "2025-06-01T00:00:00Z",
                    "refresh": "refresh-xyz",
                    "expires_refresh": "2025-07-01T00:00:00Z"
                },
                "version": "1.4.2"
            })
            .to_string(),
        )
        .create_async()
        .await;
    let profile_mock = server
        .mock("GET", "/api/user")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": 42,
                "email": "rider@patinfly.dev",
                "first_name": "Ada",
                "last_name": "Riera"
            })
            .to_string(),
        )
        .create_async()
        .await;
    let vehicle_mock = server
        .mock("GET", "/api/vehicle")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"vehicles": [wire_vehicle("bike-1"), wire_vehicle("bike-2")]}).to_string())
        .expect(1)
        .create_async()
        .await;

    // 1. Persist the configuration the way a host app would
    let data_dir = TempDir::new()?;
    let config_path = data_dir.path().join("config.toml");
    let config = DataConfig {
        api_base_url: server.url(),
        database_url: format!("sqlite:{}", data_dir.path().join("patinfly.db").display()),
        settings_path: data_dir.path().join("session.toml"),
        bcrypt_cost: 4,
        connect_timeout_secs: 5,
        request_timeout_secs: 5,
    };
    config.save(&config_path)?;

    // 2. Load it back and connect the data layer
    let config = DataConfig::load(Some(config_path.to_string_lossy().to_string()))?;
    let services =
        DataServices::connect_with_seed(&config, SeedStore::from_json(None, None, None)).await?;

    // 3. Authenticate
    let user = services
        .users
        .login("rider@patinfly.dev", "s3cret", "app")
        .await?;
    assert_eq!(user.name, "Ada Riera");
    assert!(services.session.has_token().await);

    // 4. Browse the fleet; the empty store triggers one backend sync
    let fleet = services.bikes.get_all().await?;
    assert_eq!(fleet.len(), 2);

    // 5. Rent a vehicle
    assert!(services.bikes.update_rent_status("bike-1", true).await?);
    let rented = services.bikes.get("bike-1").await?.expect("bike vanished");
    assert!(rented.is_rented);

    // 6. Connectivity drops; everything keeps working from the store
    services.network.set_online(false);
    let fleet = services.bikes.get_all().await?;
    assert_eq!(fleet.len(), 2);
    assert!(services.bikes.get("ghost").await?.is_none());
    assert!(services.bikes.status().await.is_unavailable());

    // 7. The app restarts: session, fleet and rental state survive
    drop(services);
    let services =
        DataServices::connect_with_seed(&config, SeedStore::from_json(None, None, None)).await?;
    assert!(services.session.has_token().await);
    let fleet = services.bikes.get_all().await?;
    assert_eq!(fleet.len(), 2);
    let rented = services.bikes.get("bike-1").await?.expect("bike vanished");
    assert!(rented.is_rented);
    let account = services.users.current().await?.expect("account vanished");
    assert_eq!(account.email, "rider@patinfly.dev");

    login_mock.assert_async().await;
    profile_mock.assert_async().await;
    vehicle_mock.assert_async().await;

    Ok(())
}

/// Integration test for a first launch with no network at all: the bundled
/// fixtures carry the experience until a login becomes possible
#[tokio::test]
async fn test_first_launch_offline_workflow() -> Result<()> {
    // 1. Fixtures shipped with the app
    let bikes_doc = json!({
        "bike": [
            serde_json::to_value(seed_bike("seed-1"))?,
            serde_json::to_value(seed_bike("seed-2"))?
        ]
    })
    .to_string();
    let plans_doc = json!({
        "last_updated": "2023-07-17T13:01:21+02:00",
        "ttl": 0,
        "version": "2.3",
        "data": {
            "plans": [{
                "plan_id": "plan-basic",
                "name": [{"text": "Basic", "language": "en"}],
                "currency": "EUR",
                "price": 1.25,
                "is_taxable": false,
                "description": [],
                "per_km_pricing": [],
                "per_min_pricing": [{"start": 0.0, "rate": 0.35, "interval": 1}]
            }]
        }
    })
    .to_string();

    // 2. Connect against an unreachable backend, offline from the start
    let data_dir = TempDir::new()?;
    let config = DataConfig {
        api_base_url: "http://127.0.0.1:9".to_string(),
        database_url: "sqlite::memory:".to_string(),
        settings_path: data_dir.path().join("session.toml"),
        bcrypt_cost: 4,
        connect_timeout_secs: 1,
        request_timeout_secs: 1,
    };
    let seed = SeedStore::from_json(Some(bikes_doc), None, Some(plans_doc));
    let services = DataServices::connect_with_seed(&config, seed).await?;
    services.network.set_online(false);

    // 3. Fleet and pricing are served from the fixtures
    let fleet = services.bikes.get_all().await?;
    assert_eq!(fleet.len(), 2);
    let pricing = services.pricing.get().await?.expect("no pricing snapshot");
    assert_eq!(pricing.data.plans[0].currency, "EUR");

    // 4. Promoted records are live store rows, flag updates stick
    assert!(services.bikes.update_status("seed-1", false).await?);
    let parked = services.bikes.get("seed-1").await?.expect("bike vanished");
    assert!(!parked.is_active);

    // 5. Login still needs the network and says so
    let attempt = services
        .users
        .login("rider@patinfly.dev", "s3cret", "app")
        .await;
    assert!(matches!(attempt, Err(DataError::Transport(_))));
    assert!(!services.session.has_token().await);

    Ok(())
}
