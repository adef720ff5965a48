// app/src/pipelines/bulk_delete_pipeline.rs

use std::sync::Arc;
use stockflow::{ContextData, FlowRegistry, Pipeline, PipelineControl, SkipCondition};
use tracing::{info, instrument, warn};

use crate::errors::{AppError, Result as AppResult};
use crate::pipelines::contexts::BulkDeleteCtxData;
use crate::requests::MAX_BULK_DELETE;
use crate::services::product_service;

/// Registers the bulk delete flow.
///
/// `check_constraints` is skipped when the request sets `force`; otherwise any
/// constrained product blocks the whole batch before anything is deleted.
pub fn register_bulk_delete_pipeline(registry: &FlowRegistry<AppError>) -> AppResult<()> {
  let skip_when_forced: SkipCondition<BulkDeleteCtxData> = Arc::new(|ctx: ContextData<BulkDeleteCtxData>| ctx.read().force);

  let mut pipeline = Pipeline::<BulkDeleteCtxData, AppError>::new(&[
    ("validate_ids", false, None),
    ("ensure_ids_exist", false, None),
    ("check_constraints", false, Some(skip_when_forced)),
    ("delete_products", false, None),
  ]);

  pipeline.on("validate_ids", validate_ids)?;
  pipeline.on("ensure_ids_exist", ensure_ids_exist)?;
  pipeline.on("check_constraints", check_constraints)?;
  pipeline.on("delete_products", delete_products)?;

  registry.register(pipeline);
  info!("Bulk-delete pipeline registered.");
  Ok(())
}

async fn validate_ids(ctx: ContextData<BulkDeleteCtxData>) -> AppResult<PipelineControl> {
  let (ids, force) = {
    let guard = ctx.read();
    (
      guard.payload.validate_ids(Some(MAX_BULK_DELETE), true)?,
      guard.payload.force()?,
    )
  };
  let mut guard = ctx.write();
  guard.ids = ids;
  guard.force = force;
  Ok(PipelineControl::Continue)
}

async fn ensure_ids_exist(ctx: ContextData<BulkDeleteCtxData>) -> AppResult<PipelineControl> {
  let (ids, pool) = {
    let guard = ctx.read();
    (guard.ids.clone(), guard.app_state.db_pool.clone())
  };
  product_service::ensure_all_exist(&pool, &ids).await?;
  Ok(PipelineControl::Continue)
}

#[instrument(name = "bulk_delete::check_constraints", skip_all, err(Display))]
async fn check_constraints(ctx: ContextData<BulkDeleteCtxData>) -> AppResult<PipelineControl> {
  let (ids, pool) = {
    let guard = ctx.read();
    (guard.ids.clone(), guard.app_state.db_pool.clone())
  };

  let constraints = product_service::deletion_constraints(&pool, &ids).await?;
  if !constraints.is_empty() {
    warn!(blocked = constraints.len(), "Bulk delete blocked by constraints.");
    return Err(AppError::DeletionBlocked(constraints));
  }
  Ok(PipelineControl::Continue)
}

async fn delete_products(ctx: ContextData<BulkDeleteCtxData>) -> AppResult<PipelineControl> {
  let (ids, force, pool) = {
    let guard = ctx.read();
    (guard.ids.clone(), guard.force, guard.app_state.db_pool.clone())
  };
  if force {
    info!(count = ids.len(), "Bulk delete forced past constraints.");
  }

  let results = product_service::delete_many(&pool, &ids).await?;
  ctx.write().results = Some(results);
  Ok(PipelineControl::Continue)
}
