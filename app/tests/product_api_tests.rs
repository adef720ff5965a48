// app/tests/product_api_tests.rs
mod common;
use common::*;

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use serde_json::json;

#[actix_web::test]
async fn list_filters_by_status_and_reports_effective_filters() {
  let state = test_state(&[]).await;
  let app = init_app!(state);
  let token = login!(app, MODERATOR_EMAIL, SEED_PASSWORD);

  let (status, body) = call_json!(
    app,
    TestRequest::get().uri("/api/products?status=low_stock&min_price=0"),
    token
  );
  assert_eq!(status, StatusCode::OK);
  let products = body["data"]["products"].as_array().unwrap();
  assert_eq!(products.len(), 5);
  assert!(products.iter().all(|p| p["status"] == "low_stock"));

  let filters = &body["data"]["filters_applied"];
  assert_eq!(filters["status"], "low_stock");
  assert_eq!(filters["sort_by"], "created_at");
  assert!(filters.get("min_price").is_none());

  assert_eq!(body["data"]["user_permissions"]["can_delete"], false);
  assert_eq!(body["data"]["user_permissions"]["role"], "Moderator");
}

#[actix_web::test]
async fn list_paginates_and_sorts() {
  let state = test_state(&[]).await;
  let app = init_app!(state);
  let token = login!(app, MODERATOR_EMAIL, SEED_PASSWORD);

  let (status, body) = call_json!(
    app,
    TestRequest::get().uri("/api/products?per_page=5&page=2&sort_by=price&sort_order=asc"),
    token
  );
  assert_eq!(status, StatusCode::OK);
  let pagination = &body["data"]["pagination"];
  assert_eq!(pagination["total"], 24);
  assert_eq!(pagination["last_page"], 5);
  assert_eq!(pagination["from"], 6);
  assert_eq!(pagination["to"], 10);

  let prices: Vec<f64> = body["data"]["products"]
    .as_array()
    .unwrap()
    .iter()
    .map(|p| p["price"].as_str().unwrap().parse().unwrap())
    .collect();
  assert_eq!(prices.len(), 5);
  assert!(prices.windows(2).all(|w| w[0] <= w[1]));
}

#[actix_web::test]
async fn list_searches_name_and_description() {
  let state = test_state(&[]).await;
  let app = init_app!(state);
  let token = login!(app, MODERATOR_EMAIL, SEED_PASSWORD);

  let (_, body) = call_json!(app, TestRequest::get().uri("/api/products?search=lumbar"), token);
  let products = body["data"]["products"].as_array().unwrap();
  assert_eq!(products.len(), 1);
  assert_eq!(products[0]["name"], "Professional Office Chair");

  let (_, body) = call_json!(app, TestRequest::get().uri("/api/products?search=100%25"), token);
  assert_eq!(body["data"]["pagination"]["total"], 0);
}

#[actix_web::test]
async fn list_rejects_invalid_parameters() {
  let state = test_state(&[]).await;
  let app = init_app!(state);
  let token = login!(app, MODERATOR_EMAIL, SEED_PASSWORD);

  let (status, body) = call_json!(
    app,
    TestRequest::get().uri("/api/products?per_page=500&sort_by=password"),
    token
  );
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["data"]["errors"]["per_page"][0], "Items per page cannot exceed 100");
  assert!(body["data"]["errors"]["sort_by"].is_array());
}

#[actix_web::test]
async fn create_validates_and_defaults() {
  let state = test_state(&[]).await;
  let app = init_app!(state);
  let token = login!(app, MODERATOR_EMAIL, SEED_PASSWORD);

  let (status, body) = call_json!(
    app,
    TestRequest::post()
      .uri("/api/products")
      .set_json(json!({ "name": "Bad Lamp", "quantity": 2, "price": -5 })),
    token
  );
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["data"]["errors"]["price"][0], "Price cannot be negative");

  let (status, body) = call_json!(
    app,
    TestRequest::post()
      .uri("/api/products")
      .set_json(json!({ "name": "  Reading Lamp ", "quantity": 3, "price": 19.5 })),
    token
  );
  assert_eq!(status, StatusCode::CREATED);
  let product = &body["data"]["product"];
  assert_eq!(product["name"], "Reading Lamp");
  assert_eq!(product["price"], "19.50");
  assert_eq!(product["category"], "General");
  assert_eq!(product["status"], "low_stock");

  let (status, body) = call_json!(
    app,
    TestRequest::post()
      .uri("/api/products")
      .set_json(json!({ "name": "Reading Lamp", "quantity": 30, "price": "4" })),
    token
  );
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["data"]["errors"]["name"][0], "A product with this name already exists");
}

#[actix_web::test]
async fn show_returns_404_for_unknown_ids() {
  let state = test_state(&[]).await;
  let app = init_app!(state);
  let token = login!(app, MODERATOR_EMAIL, SEED_PASSWORD);
  let id = product_id(&state, "Yoga Mat").await;

  let (status, body) = call_json!(app, TestRequest::get().uri(&format!("/api/products/{}", id)), token);
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["product"]["name"], "Yoga Mat");

  let (status, body) = call_json!(app, TestRequest::get().uri("/api/products/99999"), token);
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["message"], "Product not found");
}

#[actix_web::test]
async fn statistics_low_stock_and_categories() {
  let state = test_state(&[]).await;
  let app = init_app!(state);
  let token = login!(app, MODERATOR_EMAIL, SEED_PASSWORD);

  let (status, body) = call_json!(app, TestRequest::get().uri("/api/products/statistics"), token);
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["total_products"], 24);
  assert_eq!(body["data"]["low_stock"], 5);
  assert_eq!(body["data"]["ordered"], 2);
  assert_eq!(body["data"]["discontinued"], 1);
  assert_eq!(body["data"]["in_stock"], 16);

  let (_, body) = call_json!(app, TestRequest::get().uri("/api/products/low-stock"), token);
  assert_eq!(body["data"]["threshold"], 10);
  assert_eq!(body["data"]["count"], 9);

  let (_, body) = call_json!(app, TestRequest::get().uri("/api/products/low-stock?threshold=0"), token);
  assert_eq!(body["data"]["count"], 3);

  let (_, body) = call_json!(app, TestRequest::get().uri("/api/products/suggested-categories"), token);
  let categories = body["data"]["categories"].as_array().unwrap();
  assert_eq!(categories.len(), 9);
  assert_eq!(categories[0], "Books");
}

#[actix_web::test]
async fn check_name_reports_availability() {
  let state = test_state(&[]).await;
  let app = init_app!(state);
  let token = login!(app, MODERATOR_EMAIL, SEED_PASSWORD);
  let yoga_id = product_id(&state, "Yoga Mat").await;

  let (_, body) = call_json!(
    app,
    TestRequest::post().uri("/api/products/check-name").set_json(json!({ "name": " Yoga Mat " })),
    token
  );
  assert_eq!(body["data"]["name"], "Yoga Mat");
  assert_eq!(body["data"]["available"], false);

  let (_, body) = call_json!(
    app,
    TestRequest::post()
      .uri("/api/products/check-name")
      .set_json(json!({ "name": "Yoga Mat", "exclude_id": yoga_id })),
    token
  );
  assert_eq!(body["data"]["available"], true);

  let (status, _) = call_json!(
    app,
    TestRequest::post()
      .uri("/api/products/check-name")
      .set_json(json!({ "name": "Yoga Mat", "exclude_id": 99999 })),
    token
  );
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn deletes_require_admin() {
  let state = test_state(&[]).await;
  let app = init_app!(state);
  let token = login!(app, MODERATOR_EMAIL, SEED_PASSWORD);
  let id = product_id(&state, "Cotton T-Shirt").await;

  let (status, body) = call_json!(app, TestRequest::delete().uri(&format!("/api/products/{}", id)), token);
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["message"], "Access denied. Admin privileges required.");
  assert_eq!(body["data"]["user_role"], "Moderator");
  assert_eq!(body["data"]["required_role"], "Admin");

  let (status, _) = call_json!(
    app,
    TestRequest::delete().uri("/api/products/bulk").set_json(json!({ "ids": [id] })),
    token
  );
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn admin_deletes_a_single_product() {
  let state = test_state(&[]).await;
  let app = init_app!(state);
  let token = login!(app, ADMIN_EMAIL, SEED_PASSWORD);
  let id = product_id(&state, "Cotton T-Shirt").await;

  let (status, body) = call_json!(app, TestRequest::delete().uri(&format!("/api/products/{}", id)), token);
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["deleted_product_id"], id);

  let (status, _) = call_json!(app, TestRequest::delete().uri(&format!("/api/products/{}", id)), token);
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn constraint_check_lists_blocked_products() {
  let state = test_state(&[]).await;
  let app = init_app!(state);
  let token = login!(app, MODERATOR_EMAIL, SEED_PASSWORD);
  let macbook = product_id(&state, "MacBook Pro 16\" M2").await;
  let blocks = product_id(&state, "Building Blocks Kit").await;
  let shirt = product_id(&state, "Cotton T-Shirt").await;

  let (status, body) = call_json!(
    app,
    TestRequest::post()
      .uri("/api/products/check-deletion-constraints")
      .set_json(json!({ "ids": [macbook, blocks, shirt] })),
    token
  );
  assert_eq!(status, StatusCode::OK);
  let data = &body["data"];
  assert_eq!(data["can_delete_all"], false);
  assert_eq!(data["constrained_count"], 2);
  assert_eq!(data["total_checked"], 3);
  assert_eq!(
    data["constraints"][macbook.to_string()]["constraints"][0],
    "High-value product (total value > $10,000)"
  );
  assert_eq!(
    data["constraints"][blocks.to_string()]["constraints"][0],
    "Last product in category \"Toys\""
  );
  assert!(data["constraints"].get(shirt.to_string()).is_none());

  let macbook_entry = &data["constraints"][macbook.to_string()];
  assert_eq!(macbook_entry["product_name"], "MacBook Pro 16\" M2");
  assert!(macbook_entry.get("error").is_none());
}

#[actix_web::test]
async fn bulk_delete_is_blocked_by_constraints_unless_forced() {
  let state = test_state(&[]).await;
  let app = init_app!(state);
  let token = login!(app, ADMIN_EMAIL, SEED_PASSWORD);
  let macbook = product_id(&state, "MacBook Pro 16\" M2").await;
  let shirt = product_id(&state, "Cotton T-Shirt").await;

  let (status, body) = call_json!(
    app,
    TestRequest::delete()
      .uri("/api/products/bulk")
      .set_json(json!({ "ids": [macbook, shirt] })),
    token
  );
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["message"], "Some products cannot be deleted due to constraints");
  assert_eq!(body["data"]["message"], "Use force=true to override constraints");
  assert!(body["data"]["constraints"].get(macbook.to_string()).is_some());

  let (status, body) = call_json!(
    app,
    TestRequest::delete()
      .uri("/api/products/bulk")
      .set_json(json!({ "ids": [macbook, shirt], "force": true })),
    token
  );
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["message"], "Deletion completed: 2 deleted, 0 failed, 0 not found");
  assert_eq!(body["data"]["summary"]["deleted_count"], 2);
  assert_eq!(body["data"]["summary"]["total_requested"], 2);
  assert_eq!(body["data"]["results"]["deleted"][0]["id"], macbook);
}

#[actix_web::test]
async fn bulk_delete_validates_ids() {
  let state = test_state(&[]).await;
  let app = init_app!(state);
  let token = login!(app, ADMIN_EMAIL, SEED_PASSWORD);
  let shirt = product_id(&state, "Cotton T-Shirt").await;

  let (status, body) = call_json!(
    app,
    TestRequest::delete().uri("/api/products/bulk").set_json(json!({ "ids": [shirt, shirt] })),
    token
  );
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["data"]["errors"]["ids"][0], "Duplicate product IDs are not allowed");

  let (status, body) = call_json!(
    app,
    TestRequest::delete().uri("/api/products/bulk").set_json(json!({ "ids": [shirt, 99999] })),
    token
  );
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["data"]["errors"]["ids.1"][0], "One or more products do not exist");

  // Nothing was deleted by the rejected requests.
  let (status, _) = call_json!(app, TestRequest::get().uri(&format!("/api/products/{}", shirt)), token);
  assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn list_handles_page_bounds() {
  let state = test_state(&[]).await;
  let app = init_app!(state);
  let token = login!(app, ADMIN_EMAIL, SEED_PASSWORD);

  let (status, body) = call_json!(
    app,
    TestRequest::get().uri("/api/products?page=9223372036854775807&per_page=100"),
    token
  );
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["products"].as_array().unwrap().len(), 0);
  let pagination = &body["data"]["pagination"];
  assert_eq!(pagination["current_page"], i64::MAX);
  assert_eq!(pagination["total"], 24);
  assert!(pagination["from"].is_null());
  assert!(pagination["to"].is_null());

  let (status, body) = call_json!(app, TestRequest::get().uri("/api/products?page=3&per_page=10"), token);
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["products"].as_array().unwrap().len(), 4);
  assert_eq!(body["data"]["pagination"]["from"], 21);
  assert_eq!(body["data"]["pagination"]["to"], 24);

  let (status, body) = call_json!(app, TestRequest::get().uri("/api/products?page=0&per_page=0"), token);
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert!(body["data"]["errors"]["page"].is_array());
  assert!(body["data"]["errors"]["per_page"].is_array());
}

#[actix_web::test]
async fn statistics_total_value_survives_large_stock() {
  let state = test_state(&[]).await;
  let app = init_app!(state);
  let token = login!(app, MODERATOR_EMAIL, SEED_PASSWORD);

  let (_, body) = call_json!(app, TestRequest::get().uri("/api/products/statistics"), token);
  let before: rust_decimal::Decimal = body["data"]["total_value"].as_str().unwrap().parse().unwrap();

  let (status, body) = call_json!(
    app,
    TestRequest::post()
      .uri("/api/products")
      .set_json(json!({ "name": "Pallet Of Gold", "quantity": 2147483648u64, "price": "99999999.99" })),
    token
  );
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["data"]["errors"]["quantity"][0], "Quantity cannot exceed 2147483647");

  let (status, _) = call_json!(
    app,
    TestRequest::post()
      .uri("/api/products")
      .set_json(json!({ "name": "Pallet Of Gold", "quantity": 1000000000, "price": "99999999.99" })),
    token
  );
  assert_eq!(status, StatusCode::CREATED);

  let (status, body) = call_json!(app, TestRequest::get().uri("/api/products/statistics"), token);
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["total_products"], 25);
  let after: rust_decimal::Decimal = body["data"]["total_value"].as_str().unwrap().parse().unwrap();
  let added: rust_decimal::Decimal = "99999999990000000.00".parse().unwrap();
  assert_eq!(after - before, added);
}

#[actix_web::test]
async fn non_numeric_ids_get_the_json_envelope() {
  let state = test_state(&[]).await;
  let app = init_app!(state);
  let token = login!(app, ADMIN_EMAIL, SEED_PASSWORD);

  let (status, body) = call_json!(app, TestRequest::get().uri("/api/products/abc"), token);
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["success"], false);
  assert_eq!(body["message"], "Product not found");

  let (status, body) = call_json!(app, TestRequest::delete().uri("/api/products/12x"), token);
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["message"], "Product not found");
}
