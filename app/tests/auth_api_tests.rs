// app/tests/auth_api_tests.rs
mod common;
use common::*;

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use serde_json::json;

#[actix_web::test]
async fn health_needs_no_token() {
  let state = test_state(&[]).await;
  let app = init_app!(state);

  let (status, body) = call_json!(app, TestRequest::get().uri("/api/health"));
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["success"], true);
  assert_eq!(body["data"]["status"], "ok");
}

#[actix_web::test]
async fn protected_routes_reject_missing_or_unknown_tokens() {
  let state = test_state(&[]).await;
  let app = init_app!(state);

  let (status, body) = call_json!(app, TestRequest::get().uri("/api/products"));
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["success"], false);
  assert_eq!(body["message"], "Unauthenticated");

  let (status, _) = call_json!(app, TestRequest::get().uri("/api/auth/profile"), "not-a-real-token");
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn register_creates_a_moderator_and_rejects_taken_emails() {
  let state = test_state(&[]).await;
  let app = init_app!(state);
  let payload = json!({
    "name": "Grace Hopper",
    "email": "Grace@Example.com",
    "password": "compilers1",
    "password_confirmation": "compilers1",
  });

  let (status, body) = call_json!(app, TestRequest::post().uri("/api/auth/register").set_json(&payload));
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["data"]["user"]["email"], "grace@example.com");
  assert_eq!(body["data"]["user"]["role"], "moderator");
  assert!(body["data"]["user"].get("password_hash").is_none());

  let (status, body) = call_json!(app, TestRequest::post().uri("/api/auth/register").set_json(&payload));
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["data"]["errors"]["email"][0], "The email has already been taken.");

  let token = login!(app, "grace@example.com", "compilers1");
  let (status, body) = call_json!(app, TestRequest::get().uri("/api/auth/profile"), token);
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["permissions"]["can_delete"], false);
  assert_eq!(body["data"]["permissions"]["role"], "Moderator");
}

#[actix_web::test]
async fn register_reports_field_errors() {
  let state = test_state(&[]).await;
  let app = init_app!(state);

  let (status, body) = call_json!(
    app,
    TestRequest::post().uri("/api/auth/register").set_json(json!({
      "email": "not-an-email",
      "password": "short",
      "password_confirmation": "short",
    }))
  );
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  let errors = &body["data"]["errors"];
  assert!(errors["name"].is_array());
  assert!(errors["email"].is_array());
  assert!(errors["password"].is_array());
}

#[actix_web::test]
async fn login_rejects_bad_credentials_uniformly() {
  let state = test_state(&[]).await;
  let app = init_app!(state);

  for (email, password) in [(ADMIN_EMAIL, "wrong-password"), ("nobody@email.com", SEED_PASSWORD)] {
    let (status, body) = call_json!(
      app,
      TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": email, "password": password }))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");
  }
}

#[actix_web::test]
async fn login_returns_bearer_token_and_admin_profile() {
  let state = test_state(&[]).await;
  let app = init_app!(state);

  let (status, body) = call_json!(
    app,
    TestRequest::post()
      .uri("/api/auth/login")
      .set_json(json!({ "email": ADMIN_EMAIL, "password": SEED_PASSWORD }))
  );
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["token_type"], "bearer");
  assert_eq!(body["data"]["expires_in"], 3600);
  assert_eq!(body["data"]["user"]["id"], 1);

  let token = body["data"]["token"].as_str().unwrap().to_string();
  let (status, body) = call_json!(app, TestRequest::get().uri("/api/auth/profile"), token);
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["user"]["role"], "admin");
  assert_eq!(body["data"]["permissions"]["is_admin"], true);
  assert_eq!(body["data"]["permissions"]["role"], "Admin");
}

#[actix_web::test]
async fn logout_revokes_the_presented_token() {
  let state = test_state(&[]).await;
  let app = init_app!(state);
  let token = login!(app, MODERATOR_EMAIL, SEED_PASSWORD);

  let (status, _) = call_json!(app, TestRequest::post().uri("/api/auth/logout"), token);
  assert_eq!(status, StatusCode::OK);

  let (status, _) = call_json!(app, TestRequest::get().uri("/api/auth/profile"), token);
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn refresh_swaps_the_token() {
  let state = test_state(&[]).await;
  let app = init_app!(state);
  let old_token = login!(app, MODERATOR_EMAIL, SEED_PASSWORD);

  let (status, body) = call_json!(app, TestRequest::post().uri("/api/auth/refresh"), old_token);
  assert_eq!(status, StatusCode::OK);
  let new_token = body["data"]["token"].as_str().unwrap().to_string();
  assert_ne!(new_token, old_token);

  let (status, _) = call_json!(app, TestRequest::get().uri("/api/auth/profile"), old_token);
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  let (status, _) = call_json!(app, TestRequest::get().uri("/api/auth/profile"), new_token);
  assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn malformed_json_is_a_bad_request() {
  let state = test_state(&[]).await;
  let app = init_app!(state);

  let (status, body) = call_json!(
    app,
    TestRequest::post()
      .uri("/api/auth/login")
      .insert_header(("Content-Type", "application/json"))
      .set_payload("{ not json")
  );
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["success"], false);
}
