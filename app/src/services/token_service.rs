// app/src/services/token_service.rs

//! Opaque bearer tokens.
//!
//! A token is 32 random bytes, base64url encoded, handed to the client once.
//! Only its SHA-256 digest is stored, so a leaked `access_tokens` table does
//! not leak usable credentials. Expiry and revocation are checked on every
//! authenticated request.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info, instrument, warn};

use crate::errors::{AppError, Result as AppResult};
use crate::models::user::{User, USER_COLUMNS};

const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone)]
pub struct IssuedToken {
  pub id: i64,
  /// Plain bearer secret; never persisted.
  pub token: String,
  pub expires_at: DateTime<Utc>,
  pub expires_in_secs: i64,
}

#[derive(Debug, FromRow)]
struct AccessTokenRow {
  id: i64,
  user_id: i64,
  expires_at: DateTime<Utc>,
  revoked_at: Option<DateTime<Utc>>,
}

fn generate_secret() -> String {
  let mut bytes = [0u8; TOKEN_BYTES];
  OsRng.fill_bytes(&mut bytes);
  URL_SAFE_NO_PAD.encode(bytes)
}

pub fn hash_token(token: &str) -> String {
  format!("{:x}", Sha256::digest(token.as_bytes()))
}

#[instrument(name = "token_service::issue", skip(pool))]
pub async fn issue(pool: &SqlitePool, user_id: i64, ttl: Duration) -> AppResult<IssuedToken> {
  let token = generate_secret();
  let now = Utc::now();
  let expires_at = now
    .checked_add_signed(ttl)
    .ok_or_else(|| AppError::Internal("Token expiry out of range".to_string()))?;

  let id: i64 = sqlx::query_scalar(
    "INSERT INTO access_tokens (user_id, token_hash, expires_at, created_at) VALUES (?, ?, ?, ?) RETURNING id",
  )
  .bind(user_id)
  .bind(hash_token(&token))
  .bind(expires_at)
  .bind(now)
  .fetch_one(pool)
  .await?;

  info!(token_id = id, "Access token issued.");
  Ok(IssuedToken {
    id,
    token,
    expires_at,
    expires_in_secs: ttl.num_seconds(),
  })
}

/// Resolves a bearer secret to its user and token id.
///
/// Unknown, expired and revoked tokens all yield `AppError::Unauthenticated`.
#[instrument(name = "token_service::authenticate", skip_all)]
pub async fn authenticate(pool: &SqlitePool, token: &str) -> AppResult<(User, i64)> {
  let row: Option<AccessTokenRow> =
    sqlx::query_as("SELECT id, user_id, expires_at, revoked_at FROM access_tokens WHERE token_hash = ?")
      .bind(hash_token(token))
      .fetch_optional(pool)
      .await?;

  let Some(row) = row else {
    debug!("Unknown bearer token.");
    return Err(AppError::Unauthenticated);
  };
  if row.revoked_at.is_some() {
    debug!(token_id = row.id, "Revoked bearer token presented.");
    return Err(AppError::Unauthenticated);
  }
  if row.expires_at <= Utc::now() {
    debug!(token_id = row.id, "Expired bearer token presented.");
    return Err(AppError::Unauthenticated);
  }

  let user: Option<User> = sqlx::query_as(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
    .bind(row.user_id)
    .fetch_optional(pool)
    .await?;

  match user {
    Some(user) => Ok((user, row.id)),
    None => {
      warn!(token_id = row.id, user_id = row.user_id, "Token belongs to a missing user.");
      Err(AppError::Unauthenticated)
    }
  }
}

#[instrument(name = "token_service::revoke", skip(pool))]
pub async fn revoke(pool: &SqlitePool, token_id: i64) -> AppResult<()> {
  sqlx::query("UPDATE access_tokens SET revoked_at = ? WHERE id = ? AND revoked_at IS NULL")
    .bind(Utc::now())
    .bind(token_id)
    .execute(pool)
    .await?;
  info!("Access token revoked.");
  Ok(())
}
