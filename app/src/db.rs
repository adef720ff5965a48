// app/src/db.rs

use crate::errors::{AppError, Result as AppResult};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{info, instrument};

/// Opens the pool with foreign keys enforced and applies pending migrations.
#[instrument(name = "db::connect", skip(database_url))]
pub async fn connect(database_url: &str, max_connections: u32) -> AppResult<SqlitePool> {
  let options = SqliteConnectOptions::from_str(database_url)?
    .create_if_missing(true)
    .foreign_keys(true);

  let db_file = options.get_filename();
  if let Some(parent) = db_file.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)
      .map_err(|e| AppError::Config(format!("Cannot create database directory {}: {}", parent.display(), e)))?;
  }

  // Connections are never recycled: an in-memory database lives only as long as its connection.
  let pool = SqlitePoolOptions::new()
    .max_connections(max_connections)
    .idle_timeout(None)
    .max_lifetime(None)
    .connect_with(options)
    .await?;
  info!("Connected to the database.");

  migrate(&pool).await?;
  Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> AppResult<()> {
  sqlx::migrate!("./migrations").run(pool).await?;
  info!("Database migrations applied.");
  Ok(())
}
