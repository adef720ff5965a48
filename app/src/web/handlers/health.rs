// app/src/web/handlers/health.rs

use actix_web::HttpResponse;
use serde_json::json;

use crate::web::response;

pub async fn health_check() -> HttpResponse {
  response::ok("Service is healthy", json!({ "status": "ok" }))
}
