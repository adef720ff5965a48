// app/tests/common/mod.rs
#![allow(dead_code, unused_macros)]

use once_cell::sync::Lazy;
use std::collections::HashMap;
use stockroom::config::AppConfig;
use stockroom::state::AppState;
use tracing::Level;

pub const ADMIN_EMAIL: &str = "admin@email.com";
pub const MODERATOR_EMAIL: &str = "moderator@email.com";
pub const SEED_PASSWORD: &str = "seed-password";

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

/// Configuration for a seeded, private in-memory database.
///
/// `overrides` replace or add variables; the chat provider has no key unless one is given.
pub fn test_config(overrides: &[(&str, &str)]) -> AppConfig {
  let mut vars: HashMap<String, String> = [
    ("DATABASE_URL", "sqlite::memory:"),
    ("DATABASE_MAX_CONNECTIONS", "1"),
    ("SEED_DB", "true"),
    ("SEED_ADMIN_PASSWORD", SEED_PASSWORD),
    ("GEMINI_BASE_URL", "http://127.0.0.1:1"),
    ("GEMINI_MAX_RETRIES", "0"),
    ("GEMINI_RETRY_DELAY_MS", "1"),
    ("GEMINI_TIMEOUT_SECS", "2"),
  ]
  .iter()
  .map(|(k, v)| (k.to_string(), v.to_string()))
  .collect();
  for (k, v) in overrides {
    vars.insert(k.to_string(), v.to_string());
  }
  AppConfig::from_lookup(|name| vars.get(name).cloned()).expect("test configuration is valid")
}

pub async fn test_state(overrides: &[(&str, &str)]) -> AppState {
  setup_tracing();
  stockroom::build_state(test_config(overrides))
    .await
    .expect("application state builds")
}

pub async fn product_id(state: &AppState, name: &str) -> i64 {
  sqlx::query_scalar("SELECT id FROM products WHERE name = ?")
    .bind(name)
    .fetch_one(&state.db_pool)
    .await
    .expect("seeded product exists")
}

/// Builds the service under test from an `AppState`.
macro_rules! init_app {
  ($state:expr) => {
    actix_web::test::init_service(
      actix_web::App::new()
        .app_data(actix_web::web::Data::new($state.clone()))
        .configure(stockroom::web::configure_app_routes),
    )
    .await
  };
}

/// Logs in and evaluates to the bearer token.
macro_rules! login {
  ($app:expr, $email:expr, $password:expr) => {{
    let req = actix_web::test::TestRequest::post()
      .uri("/api/auth/login")
      .set_json(serde_json::json!({ "email": $email, "password": $password }))
      .to_request();
    let body: serde_json::Value = actix_web::test::call_and_read_body_json(&$app, req).await;
    body["data"]["token"]
      .as_str()
      .expect("login returns a token")
      .to_string()
  }};
}

/// Sends `$req` with the bearer token and evaluates to `(StatusCode, serde_json::Value)`.
macro_rules! call_json {
  ($app:expr, $req:expr, $token:expr) => {{
    let req = $req
      .insert_header(("Authorization", format!("Bearer {}", $token)))
      .to_request();
    let resp = actix_web::test::call_service(&$app, req).await;
    let status = resp.status();
    let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
    (status, body)
  }};
  ($app:expr, $req:expr) => {{
    let resp = actix_web::test::call_service(&$app, $req.to_request()).await;
    let status = resp.status();
    let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
    (status, body)
  }};
}

pub(crate) use {call_json, init_app, login};
