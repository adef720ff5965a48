// app/src/web/handlers/chatbot_handlers.rs

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::requests::ChatMessagePayload;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;
use crate::web::response::{self, ApiResponse};

#[instrument(name = "handler::send_message", skip_all, fields(user_id = auth.user.id), err(Display))]
pub async fn send_message(
  auth: AuthenticatedUser,
  state: web::Data<AppState>,
  payload: web::Json<ChatMessagePayload>,
) -> Result<HttpResponse, AppError> {
  let message = payload.validate()?;
  let reply = state.chatbot.send_message(&message).await;
  info!(from_model = reply.from_model, "Chatbot replied.");

  Ok(response::ok(
    "Chatbot replied successfully",
    json!({
      "message": reply.text,
      "user_message": message,
      "timestamp": Utc::now(),
    }),
  ))
}

/// 200 when the model answered, 500 otherwise; the report is returned either way.
pub async fn test_chatbot(_auth: AuthenticatedUser, state: web::Data<AppState>) -> HttpResponse {
  let report = state.chatbot.test_connection().await;
  if report.success {
    response::ok("Chatbot connection test passed", report)
  } else {
    warn!(api_key_configured = report.api_key_configured, "Chatbot connection test failed.");
    ApiResponse::failure("Chatbot connection test failed".to_string(), Some(report))
      .respond(StatusCode::INTERNAL_SERVER_ERROR)
  }
}

pub async fn simple_test(_auth: AuthenticatedUser, state: web::Data<AppState>) -> HttpResponse {
  let reply = state.chatbot.simple_test().await;
  response::ok(
    "Simple test completed",
    json!({ "response": reply, "timestamp": Utc::now() }),
  )
}
