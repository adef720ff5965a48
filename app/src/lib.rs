// app/src/lib.rs

//! Stockroom: an inventory service with bearer-token auth, product search and
//! bulk maintenance, and a chat assistant backed by an external model.

pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod requests;
pub mod seed;
pub mod services;
pub mod state;
pub mod validation;
pub mod web;

use std::sync::Arc;
use stockflow::FlowRegistry;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, LogFormat};
use crate::errors::{AppError, Result as AppResult};
use crate::services::chatbot::ChatbotService;
use crate::state::AppState;

/// Installs the global subscriber. `RUST_LOG` overrides the default `info` level.
pub fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt().with_env_filter(filter);
  let result = match format {
    LogFormat::Json => builder.json().try_init(),
    LogFormat::Pretty => builder.try_init(),
  };
  if let Err(e) = result {
    eprintln!("Tracing subscriber already installed: {}", e);
  }
}

/// Connects the database, seeds it when enabled, builds the chat client and
/// registers every request flow.
pub async fn build_state(config: AppConfig) -> AppResult<AppState> {
  let db_pool = db::connect(&config.database_url, config.database_max_connections).await?;

  if config.seed_db {
    seed::run(&db_pool, &config.seed_admin_password).await?;
  }

  let chatbot = Arc::new(ChatbotService::new(config.chatbot.clone())?);

  let flows: Arc<FlowRegistry<AppError>> = Arc::new(FlowRegistry::new());
  pipelines::register_all_pipelines(&flows)?;

  Ok(AppState {
    db_pool,
    flows,
    config: Arc::new(config),
    chatbot,
  })
}
