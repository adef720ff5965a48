// app/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use stockflow::FlowError;
use thiserror::Error;

use crate::services::product_service::DeletionConstraints;
use crate::validation::ValidationErrors;
use crate::web::response::ApiResponse;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("{}", .0.first_message())]
  Validation(ValidationErrors),

  #[error("{0}")]
  BadRequest(String),

  #[error("Unauthenticated")]
  Unauthenticated,

  #[error("Invalid credentials")]
  InvalidCredentials,

  #[error("Access denied. Admin privileges required.")]
  Forbidden { user_role: &'static str, user_id: i64 },

  #[error("{0}")]
  NotFound(String),

  #[error("Some products cannot be deleted due to constraints")]
  DeletionBlocked(DeletionConstraints),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Migration Error: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),

  #[error("Flow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  /// Shorthand for a single-field validation failure.
  pub fn invalid(field: &str, message: impl Into<String>) -> Self {
    let mut errors = ValidationErrors::new();
    errors.add(field, message);
    AppError::Validation(errors)
  }

  fn envelope(&self) -> ApiResponse<serde_json::Value> {
    match self {
      AppError::Validation(errors) => ApiResponse::failure(self.to_string(), Some(json!({ "errors": errors }))),
      AppError::Forbidden { user_role, user_id } => ApiResponse::failure(
        self.to_string(),
        Some(json!({
          "user_role": user_role,
          "required_role": "Admin",
          "user_id": user_id,
        })),
      ),
      AppError::DeletionBlocked(constraints) => ApiResponse::failure(
        self.to_string(),
        Some(json!({
          "constraints": constraints,
          "message": "Use force=true to override constraints",
        })),
      ),
      // Do not leak driver or flow internals to clients.
      AppError::Sqlx(_) | AppError::Migrate(_) => ApiResponse::failure("Database operation failed".to_string(), None),
      AppError::Workflow { .. } => ApiResponse::failure("Request processing failed".to_string(), None),
      AppError::Config(_) => ApiResponse::failure("Configuration issue".to_string(), None),
      _ => ApiResponse::failure(self.to_string(), None),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) | AppError::DeletionBlocked(_) => StatusCode::UNPROCESSABLE_ENTITY,
      AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
      AppError::Unauthenticated | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
      AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Config(_)
      | AppError::Sqlx(_)
      | AppError::Migrate(_)
      | AppError::Workflow { .. }
      | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with server error");
    } else {
      tracing::debug!(application_error = %self, status = status.as_u16(), "Responding with client error");
    }
    HttpResponse::build(status).json(self.envelope())
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::body::to_bytes;

  async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.error_response();
    let status = response.status();
    let bytes = to_bytes(response.into_body()).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  #[actix_web::test]
  async fn validation_errors_render_as_422_with_field_map() {
    let (status, body) = body_json(AppError::invalid("price", "Price cannot be negative")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Price cannot be negative");
    assert_eq!(body["data"]["errors"]["price"][0], "Price cannot be negative");
  }

  #[actix_web::test]
  async fn forbidden_reports_role_and_user() {
    let (status, body) = body_json(AppError::Forbidden {
      user_role: "Moderator",
      user_id: 7,
    })
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["data"]["user_role"], "Moderator");
    assert_eq!(body["data"]["required_role"], "Admin");
    assert_eq!(body["data"]["user_id"], 7);
  }

  #[actix_web::test]
  async fn database_errors_are_not_leaked() {
    let (status, body) = body_json(AppError::Sqlx(sqlx::Error::RowNotFound)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Database operation failed");
    assert!(body["data"].is_null());
  }
}
