// app/src/state.rs
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::services::chatbot::ChatbotService;
use sqlx::SqlitePool;
use std::sync::Arc;
use stockflow::FlowRegistry;

/// Shared, cheaply cloneable handles given to every handler and flow context.
#[derive(Clone)]
pub struct AppState {
  pub db_pool: SqlitePool,
  pub flows: Arc<FlowRegistry<AppError>>,
  pub config: Arc<AppConfig>,
  pub chatbot: Arc<ChatbotService>,
}
