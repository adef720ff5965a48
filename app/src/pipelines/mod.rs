// app/src/pipelines/mod.rs

//! Request flows for multi-step write operations, registered once at startup.

use crate::errors::AppError;
use stockflow::{ContextData, FlowRegistry, PipelineResult};
use tracing::{info, warn};

pub mod contexts;

pub mod bulk_delete_pipeline;
pub mod create_product_pipeline;
pub mod login_pipeline;
pub mod register_pipeline;

/// Registers every flow with `registry`.
pub fn register_all_pipelines(registry: &FlowRegistry<AppError>) -> Result<(), AppError> {
  info!("Registering request flows...");
  register_pipeline::register_register_pipeline(registry)?;
  login_pipeline::register_login_pipeline(registry)?;
  create_product_pipeline::register_create_product_pipeline(registry)?;
  bulk_delete_pipeline::register_bulk_delete_pipeline(registry)?;
  info!(count = registry.len(), "All request flows registered.");
  Ok(())
}

/// Runs the flow registered for `T` and hands back the context for reading results.
///
/// None of the flows stop early on success, so a stopped run is an internal error.
pub async fn run_flow<T>(registry: &FlowRegistry<AppError>, data: T) -> Result<ContextData<T>, AppError>
where
  T: Send + Sync + 'static,
{
  let ctx = ContextData::new(data);
  match registry.run(ctx.clone()).await? {
    PipelineResult::Completed => Ok(ctx),
    PipelineResult::Stopped => {
      warn!(context_type = %std::any::type_name::<T>(), "Flow was stopped by a handler.");
      Err(AppError::Internal("Request processing was halted unexpectedly.".to_string()))
    }
  }
}
