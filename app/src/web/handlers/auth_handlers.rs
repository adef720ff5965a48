// app/src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::models::user::User;
use crate::pipelines::contexts::{LoginCtxData, RegisterCtxData};
use crate::pipelines::run_flow;
use crate::requests::{LoginPayload, RegisterPayload};
use crate::services::policy::Permissions;
use crate::services::token_service::{self, IssuedToken};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;
use crate::web::response;

#[derive(Debug, Serialize)]
struct TokenResponse {
  token: String,
  token_type: &'static str,
  expires_in: i64,
  user: User,
}

impl TokenResponse {
  fn new(issued: IssuedToken, user: User) -> Self {
    Self {
      token: issued.token,
      token_type: "bearer",
      expires_in: issued.expires_in_secs,
      user,
    }
  }
}

#[instrument(name = "handler::register", skip_all, err(Display))]
pub async fn register(
  state: web::Data<AppState>,
  payload: web::Json<RegisterPayload>,
) -> Result<HttpResponse, AppError> {
  let ctx = run_flow(&state.flows, RegisterCtxData::new(state.get_ref().clone(), payload.into_inner())).await?;

  let user = ctx
    .read()
    .created_user
    .clone()
    .ok_or_else(|| AppError::Internal("Registration completed without a user".to_string()))?;
  Ok(response::created("User registered successfully", json!({ "user": user })))
}

#[instrument(name = "handler::login", skip_all, err(Display))]
pub async fn login(state: web::Data<AppState>, payload: web::Json<LoginPayload>) -> Result<HttpResponse, AppError> {
  let ctx = run_flow(&state.flows, LoginCtxData::new(state.get_ref().clone(), payload.into_inner())).await?;

  let (issued, user) = {
    let mut guard = ctx.write();
    (guard.issued_token.take(), guard.user.take())
  };
  match (issued, user) {
    (Some(issued), Some(user)) => Ok(response::ok("Login successful", TokenResponse::new(issued, user))),
    _ => Err(AppError::Internal("Login completed without a token".to_string())),
  }
}

#[instrument(name = "handler::logout", skip_all, fields(user_id = auth.user.id), err(Display))]
pub async fn logout(state: web::Data<AppState>, auth: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  token_service::revoke(&state.db_pool, auth.token_id).await?;
  info!("User logged out.");
  Ok(response::ok("Successfully logged out", serde_json::Value::Null))
}

/// Swaps the presented token for a fresh one.
#[instrument(name = "handler::refresh", skip_all, fields(user_id = auth.user.id), err(Display))]
pub async fn refresh(state: web::Data<AppState>, auth: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  token_service::revoke(&state.db_pool, auth.token_id).await?;
  let issued = token_service::issue(&state.db_pool, auth.user.id, state.config.token_ttl).await?;
  info!(token_id = issued.id, "Token refreshed.");
  Ok(response::ok(
    "Token refreshed successfully",
    TokenResponse::new(issued, auth.user),
  ))
}

pub async fn profile(auth: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  let permissions = Permissions::for_user(&auth.user);
  Ok(response::ok(
    "Profile retrieved successfully",
    json!({ "user": auth.user, "permissions": permissions }),
  ))
}
