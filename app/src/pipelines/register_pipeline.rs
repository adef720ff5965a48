// app/src/pipelines/register_pipeline.rs

use chrono::Utc;
use stockflow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use tracing::{debug, info, instrument, warn};

use crate::errors::{AppError, Result as AppResult};
use crate::models::user::{Role, User, USER_COLUMNS};
use crate::pipelines::contexts::RegisterCtxData;
use crate::services::auth_service;

const EMAIL_TAKEN: &str = "The email has already been taken.";

/// Registers the account creation flow. New accounts are always moderators.
pub fn register_register_pipeline(registry: &FlowRegistry<AppError>) -> AppResult<()> {
  let mut pipeline = Pipeline::<RegisterCtxData, AppError>::new(&[
    ("validate_input", false, None),
    ("ensure_email_available", false, None),
    ("hash_password", false, None),
    ("insert_user", false, None),
  ]);

  pipeline.on("validate_input", validate_input)?;
  pipeline.on("ensure_email_available", ensure_email_available)?;
  pipeline.on("hash_password", hash_password)?;
  pipeline.on("insert_user", insert_user)?;

  registry.register(pipeline);
  info!("Register pipeline registered.");
  Ok(())
}

async fn validate_input(ctx: ContextData<RegisterCtxData>) -> AppResult<PipelineControl> {
  let registration = ctx.read().payload.validate()?;
  debug!(email = %registration.email, "Registration input valid.");
  ctx.write().registration = Some(registration);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "register::ensure_email_available", skip_all, err(Display))]
async fn ensure_email_available(ctx: ContextData<RegisterCtxData>) -> AppResult<PipelineControl> {
  let (email, pool) = {
    let guard = ctx.read();
    (registered(&guard)?.email.clone(), guard.app_state.db_pool.clone())
  };

  let taken: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
    .bind(&email)
    .fetch_one(&pool)
    .await?;
  if taken != 0 {
    warn!(%email, "Registration attempted with an existing email.");
    return Err(AppError::invalid("email", EMAIL_TAKEN));
  }
  Ok(PipelineControl::Continue)
}

async fn hash_password(ctx: ContextData<RegisterCtxData>) -> AppResult<PipelineControl> {
  let password = registered(&ctx.read())?.password.clone();
  let hash = auth_service::hash_password_blocking(password).await?;
  ctx.write().password_hash = Some(hash);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "register::insert_user", skip_all, err(Display))]
async fn insert_user(ctx: ContextData<RegisterCtxData>) -> AppResult<PipelineControl> {
  let (name, email, password_hash, pool) = {
    let guard = ctx.read();
    let registration = registered(&guard)?;
    let hash = guard
      .password_hash
      .clone()
      .ok_or_else(|| AppError::Internal("Password hash missing before insert".to_string()))?;
    (
      registration.name.clone(),
      registration.email.clone(),
      hash,
      guard.app_state.db_pool.clone(),
    )
  };

  let now = Utc::now();
  let inserted = sqlx::query_as::<_, User>(&format!(
    "INSERT INTO users (name, email, password_hash, role, created_at, updated_at) \
     VALUES (?, ?, ?, ?, ?, ?) RETURNING {}",
    USER_COLUMNS
  ))
  .bind(&name)
  .bind(&email)
  .bind(&password_hash)
  .bind(Role::Moderator)
  .bind(now)
  .bind(now)
  .fetch_one(&pool)
  .await;

  let user = match inserted {
    Ok(user) => user,
    Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
      return Err(AppError::invalid("email", EMAIL_TAKEN));
    }
    Err(other) => return Err(other.into()),
  };

  info!(user_id = user.id, email = %user.email, "User registered.");
  ctx.write().created_user = Some(user);
  Ok(PipelineControl::Continue)
}

fn registered(data: &RegisterCtxData) -> AppResult<&crate::requests::ValidRegistration> {
  data
    .registration
    .as_ref()
    .ok_or_else(|| AppError::Internal("Registration input was not validated".to_string()))
}
