// app/src/pipelines/login_pipeline.rs

use stockflow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use tracing::{info, instrument, warn};

use crate::errors::{AppError, Result as AppResult};
use crate::models::user::{User, USER_COLUMNS};
use crate::pipelines::contexts::LoginCtxData;
use crate::services::{auth_service, token_service};

/// Registers the login flow: credentials in, bearer token out.
///
/// Unknown emails and wrong passwords fail identically with
/// [`AppError::InvalidCredentials`].
pub fn register_login_pipeline(registry: &FlowRegistry<AppError>) -> AppResult<()> {
  let mut pipeline = Pipeline::<LoginCtxData, AppError>::new(&[
    ("validate_credentials", false, None),
    ("fetch_user", false, None),
    ("verify_password", false, None),
    ("issue_token", false, None),
  ]);

  pipeline.on("validate_credentials", validate_credentials)?;
  pipeline.on("fetch_user", fetch_user)?;
  pipeline.on("verify_password", verify_password)?;
  pipeline.on("issue_token", issue_token)?;

  registry.register(pipeline);
  info!("Login pipeline registered.");
  Ok(())
}

async fn validate_credentials(ctx: ContextData<LoginCtxData>) -> AppResult<PipelineControl> {
  let (email, password) = ctx.read().payload.validate()?;
  let mut guard = ctx.write();
  guard.email = Some(email);
  guard.password = Some(password);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "login::fetch_user", skip_all, err(Display))]
async fn fetch_user(ctx: ContextData<LoginCtxData>) -> AppResult<PipelineControl> {
  let (email, pool) = {
    let guard = ctx.read();
    (guard.email.clone().unwrap_or_default(), guard.app_state.db_pool.clone())
  };

  let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))
    .bind(&email)
    .fetch_optional(&pool)
    .await?;

  match user {
    Some(user) => {
      ctx.write().user = Some(user);
      Ok(PipelineControl::Continue)
    }
    None => {
      warn!(%email, "Login attempted for unknown email.");
      Err(AppError::InvalidCredentials)
    }
  }
}

async fn verify_password(ctx: ContextData<LoginCtxData>) -> AppResult<PipelineControl> {
  let (stored_hash, password, user_id) = {
    let guard = ctx.read();
    let user = guard.user.as_ref().ok_or(AppError::InvalidCredentials)?;
    (user.password_hash.clone(), guard.password.clone().unwrap_or_default(), user.id)
  };

  if auth_service::verify_password_blocking(stored_hash, password).await? {
    // The plain password is not needed past this point.
    ctx.write().password = None;
    Ok(PipelineControl::Continue)
  } else {
    warn!(user_id, "Login rejected: wrong password.");
    Err(AppError::InvalidCredentials)
  }
}

#[instrument(name = "login::issue_token", skip_all, err(Display))]
async fn issue_token(ctx: ContextData<LoginCtxData>) -> AppResult<PipelineControl> {
  let (user_id, pool, ttl) = {
    let guard = ctx.read();
    let user = guard.user.as_ref().ok_or(AppError::InvalidCredentials)?;
    (
      user.id,
      guard.app_state.db_pool.clone(),
      guard.app_state.config.token_ttl,
    )
  };

  let issued = token_service::issue(&pool, user_id, ttl).await?;
  info!(user_id, token_id = issued.id, "User logged in.");
  ctx.write().issued_token = Some(issued);
  Ok(PipelineControl::Continue)
}
