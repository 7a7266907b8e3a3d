#![allow(dead_code)]

use std::sync::Arc;

use hrpanel::auth::{jwt::generate_access_token, password::hash_password};
use hrpanel::config::Config;
use hrpanel::query::Clock;
use hrpanel::state::AppState;
use hrpanel::store::{Document, DocumentStore, MemoryStore};
use serde_json::{Value, json};

pub const SECRET: &str = "integration-secret";

pub fn config() -> Config {
    Config {
        server_addr: "127.0.0.1:0".into(),
        database_url: None,
        jwt_secret: SECRET.into(),
        access_token_ttl: 3600,
        auth_scheme: "Token".into(),
        rate_login_per_min: 0,
        rate_protected_per_min: 0,
        log_dir: "logs".into(),
        log_level: tracing::Level::DEBUG,
        version: Some("1.4.0".into()),
    }
}

pub fn state(clock: Clock) -> (Arc<MemoryStore>, AppState) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(store.clone(), config()).with_clock(clock);
    (store, state)
}

pub fn doc(value: Value) -> Document {
    value.as_object().cloned().unwrap_or_default()
}

/// Stores a user with a hashed password and returns it with an
/// `Authorization` header value.
pub async fn seed_user(store: &MemoryStore, email: &str, password: &str) -> (Document, String) {
    let id = uuid::Uuid::new_v4().to_string();
    let user = store
        .insert(
            "user",
            doc(json!({
                "id": id,
                "email": email,
                "name": "Oyunaa",
                "role": "admin",
                "password": hash_password(password).unwrap(),
            })),
        )
        .await
        .unwrap();
    let token = generate_access_token(&id, SECRET, 3600).unwrap();
    (user, format!("Token {token}"))
}

/// Builds the full route table over `$state` and initialises it.
macro_rules! app {
    ($state:expr) => {{
        let state = $state.clone();
        actix_web::test::init_service(
            actix_web::App::new().configure(move |cfg| hrpanel::routes::configure(cfg, &state)),
        )
        .await
    }};
}
