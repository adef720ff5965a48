// app/src/web/response.rs

//! The `{success, message, data}` envelope every endpoint answers with.

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
  pub success: bool,
  pub message: String,
  pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
  pub fn success(message: impl Into<String>, data: T) -> Self {
    Self {
      success: true,
      message: message.into(),
      data: Some(data),
    }
  }

  pub fn failure(message: String, data: Option<T>) -> Self {
    Self {
      success: false,
      message,
      data,
    }
  }

  pub fn respond(self, status: StatusCode) -> HttpResponse {
    HttpResponse::build(status).json(self)
  }
}

/// 200 with `data`.
pub fn ok<T: Serialize>(message: impl Into<String>, data: T) -> HttpResponse {
  ApiResponse::success(message, data).respond(StatusCode::OK)
}

/// 201 with `data`.
pub fn created<T: Serialize>(message: impl Into<String>, data: T) -> HttpResponse {
  ApiResponse::success(message, data).respond(StatusCode::CREATED)
}
