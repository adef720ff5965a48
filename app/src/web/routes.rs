// app/src/web/routes.rs

use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::{web, HttpRequest};
use tracing::debug;

use crate::errors::AppError;
use crate::web::handlers::{auth_handlers, chatbot_handlers, health, product_handlers};

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
  debug!(error = %err, "Rejected malformed JSON body.");
  AppError::BadRequest(format!("Malformed JSON body: {}", err)).into()
}

fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
  debug!(error = %err, "Rejected malformed query string.");
  AppError::BadRequest(format!("Malformed query string: {}", err)).into()
}

/// The only path parameters are product ids, so one that does not parse names no product.
fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
  debug!(error = %err, "Rejected unparseable path parameter.");
  AppError::NotFound("Product not found".to_string()).into()
}

/// Mounts every route under `/api`.
///
/// Fixed product paths are registered before `/{id}` so they are not captured by it.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(web::JsonConfig::default().error_handler(json_error_handler))
    .app_data(web::QueryConfig::default().error_handler(query_error_handler))
    .app_data(web::PathConfig::default().error_handler(path_error_handler))
    .service(
      web::scope("/api")
        .route("/health", web::get().to(health::health_check))
        .service(
          web::scope("/auth")
            .route("/register", web::post().to(auth_handlers::register))
            .route("/login", web::post().to(auth_handlers::login))
            .route("/logout", web::post().to(auth_handlers::logout))
            .route("/refresh", web::post().to(auth_handlers::refresh))
            .route("/profile", web::get().to(auth_handlers::profile)),
        )
        .route("/sendMessage", web::post().to(chatbot_handlers::send_message))
        .route("/test-chatbot", web::get().to(chatbot_handlers::test_chatbot))
        .route("/simple-test", web::get().to(chatbot_handlers::simple_test))
        .service(
          web::scope("/products")
            .route("", web::get().to(product_handlers::list))
            .route("", web::post().to(product_handlers::create))
            .route("/bulk", web::delete().to(product_handlers::bulk_delete))
            .route("/statistics", web::get().to(product_handlers::statistics))
            .route("/low-stock", web::get().to(product_handlers::low_stock))
            .route(
              "/suggested-categories",
              web::get().to(product_handlers::suggested_categories),
            )
            .route("/check-name", web::post().to(product_handlers::check_name))
            .route(
              "/check-deletion-constraints",
              web::post().to(product_handlers::check_deletion_constraints),
            )
            .route("/{id}", web::get().to(product_handlers::show))
            .route("/{id}", web::delete().to(product_handlers::delete)),
        ),
    );
}
