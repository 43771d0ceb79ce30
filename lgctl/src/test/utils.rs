//! Helpers shared by the handler and end-to-end tests.

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    api::models::users::CurrentUser,
    config::{Config, DatabaseConfig},
    db::{
        handlers::UserRoles,
        models::{
            driver_surveys::DriverSurveyCreateDBRequest,
            users::{AccountRoles, AccountUpsertDBRequest},
        },
    },
    store::InMemoryStore,
    types::UserId,
};

/// Default identity header, as set in [`create_test_config`]
pub const PROXY_HEADER: &str = "x-lgctl-user";

pub fn create_test_config() -> Config {
    Config {
        database: DatabaseConfig::Memory,
        ..Default::default()
    }
}

/// Application over a fresh in-memory store. The store is returned so tests can seed accounts
/// and inject failures.
pub fn create_test_app() -> (TestServer, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let app = crate::Application::new_with_store(create_test_config(), store.clone()).expect("Failed to create application");
    (app.into_test_server(), store)
}

pub fn test_email(user: &CurrentUser) -> String {
    format!("{}@example.com", user.id)
}

fn register(store: &InMemoryStore, roles: AccountRoles) -> CurrentUser {
    let user = CurrentUser::from_roles(Uuid::new_v4(), roles);
    store.register_account(user.id, test_email(&user), roles);
    user
}

pub fn create_test_user(store: &InMemoryStore) -> CurrentUser {
    register(store, AccountRoles::default())
}

pub fn create_test_admin(store: &InMemoryStore) -> CurrentUser {
    register(
        store,
        AccountRoles {
            is_admin: true,
            is_office_staff: false,
        },
    )
}

pub fn create_test_office_staff(store: &InMemoryStore) -> CurrentUser {
    register(
        store,
        AccountRoles {
            is_admin: false,
            is_office_staff: true,
        },
    )
}

/// Mirror a fresh account into a test database
pub async fn create_db_account(pool: &PgPool, is_admin: bool) -> UserId {
    let user_id = Uuid::new_v4();
    let mut conn = pool.acquire().await.unwrap();
    UserRoles::new(&mut conn)
        .upsert_account(&AccountUpsertDBRequest {
            user_id,
            email: format!("{user_id}@example.com"),
            is_admin,
        })
        .await
        .unwrap();
    user_id
}

pub fn survey_create_request(user_id: UserId, full_name: &str) -> DriverSurveyCreateDBRequest {
    DriverSurveyCreateDBRequest {
        user_id,
        full_name: full_name.to_string(),
        tribe: "Al Example".to_string(),
        age: 25,
        car_type: "Pickup".to_string(),
        civil_id: "290010112345".to_string(),
        phone_number: "+96550000000".to_string(),
    }
}

/// A complete application form; `age` is sent as given so tests can use numbers or strings
pub fn survey_form_json(full_name: &str, age: serde_json::Value) -> serde_json::Value {
    json!({
        "full_name": full_name,
        "tribe": "Al Example",
        "age": age,
        "car_type": "Pickup",
        "civil_id": "290010112345",
        "phone_number": "+96550000000"
    })
}
