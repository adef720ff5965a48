// app/src/web/extractors.rs

//! Bearer-token authentication as actix extractors.
//!
//! Adding [`AuthenticatedUser`] to a handler's arguments makes the route
//! require a valid token; [`AdminUser`] additionally requires the admin role.

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::errors::AppError;
use crate::models::user::User;
use crate::services::{policy, token_service};
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
  pub user: User,
  /// Row id of the presented token, for logout and refresh.
  pub token_id: i64,
}

/// Token from an `Authorization: Bearer <token>` header.
fn bearer_token(req: &HttpRequest) -> Option<String> {
  let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
  let (scheme, token) = value.trim().split_once(' ')?;
  if !scheme.eq_ignore_ascii_case("bearer") {
    return None;
  }
  let token = token.trim();
  (!token.is_empty()).then(|| token.to_string())
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let token = bearer_token(req);
    let state = req.app_data::<web::Data<AppState>>().cloned();

    Box::pin(async move {
      let state = state.ok_or_else(|| AppError::Internal("Application state is not configured".to_string()))?;
      let Some(token) = token else {
        warn!("Request without a bearer token.");
        return Err(AppError::Unauthenticated);
      };
      let (user, token_id) = token_service::authenticate(&state.db_pool, &token).await?;
      Ok(AuthenticatedUser { user, token_id })
    })
  }
}

/// An authenticated user holding admin privileges.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

impl FromRequest for AdminUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
    let authenticated = AuthenticatedUser::from_request(req, payload);
    Box::pin(async move {
      let auth = authenticated.await?;
      if !policy::can_delete_products(&auth.user) {
        warn!(user_id = auth.user.id, role = auth.user.role.display_name(), "Admin route refused.");
        return Err(AppError::Forbidden {
          user_role: auth.user.role.display_name(),
          user_id: auth.user.id,
        });
      }
      Ok(AdminUser(auth))
    })
  }
}
