// app/src/pipelines/contexts.rs

//! Per-request data the flows operate on.
//! Handlers receive these wrapped in `stockflow::ContextData`.

use crate::models::{Product, User};
use crate::requests::{CreateProductPayload, LoginPayload, ProductIdsPayload, RegisterPayload, ValidRegistration};
use crate::services::product_service::{BulkDeleteResults, NewProduct};
use crate::services::token_service::IssuedToken;
use crate::state::AppState;

pub struct RegisterCtxData {
  pub app_state: AppState,
  pub payload: RegisterPayload,
  pub registration: Option<ValidRegistration>,
  pub password_hash: Option<String>,
  pub created_user: Option<User>,
}

impl RegisterCtxData {
  pub fn new(app_state: AppState, payload: RegisterPayload) -> Self {
    Self {
      app_state,
      payload,
      registration: None,
      password_hash: None,
      created_user: None,
    }
  }
}

pub struct LoginCtxData {
  pub app_state: AppState,
  pub payload: LoginPayload,
  pub email: Option<String>,
  pub password: Option<String>,
  pub user: Option<User>,
  pub issued_token: Option<IssuedToken>,
}

impl LoginCtxData {
  pub fn new(app_state: AppState, payload: LoginPayload) -> Self {
    Self {
      app_state,
      payload,
      email: None,
      password: None,
      user: None,
      issued_token: None,
    }
  }
}

pub struct CreateProductCtxData {
  pub app_state: AppState,
  pub payload: CreateProductPayload,
  pub validated: Option<NewProduct>,
  pub created: Option<Product>,
}

impl CreateProductCtxData {
  pub fn new(app_state: AppState, payload: CreateProductPayload) -> Self {
    Self {
      app_state,
      payload,
      validated: None,
      created: None,
    }
  }
}

pub struct BulkDeleteCtxData {
  pub app_state: AppState,
  pub payload: ProductIdsPayload,
  /// Set by `validate_ids`; skips the constraint check when true.
  pub force: bool,
  pub ids: Vec<i64>,
  pub results: Option<BulkDeleteResults>,
}

impl BulkDeleteCtxData {
  pub fn new(app_state: AppState, payload: ProductIdsPayload) -> Self {
    Self {
      app_state,
      payload,
      force: false,
      ids: Vec::new(),
      results: None,
    }
  }
}
