// app/src/pipelines/create_product_pipeline.rs

use stockflow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use tracing::{debug, info, instrument, warn};

use crate::errors::{AppError, Result as AppResult};
use crate::pipelines::contexts::CreateProductCtxData;
use crate::services::product_service::{self, NewProduct};

pub fn register_create_product_pipeline(registry: &FlowRegistry<AppError>) -> AppResult<()> {
  let mut pipeline = Pipeline::<CreateProductCtxData, AppError>::new(&[
    ("validate_payload", false, None),
    ("ensure_unique_name", false, None),
    ("insert_product", false, None),
  ]);

  pipeline.on("validate_payload", validate_payload)?;
  pipeline.on("ensure_unique_name", ensure_unique_name)?;
  pipeline.on("insert_product", insert_product)?;

  registry.register(pipeline);
  info!("Create-product pipeline registered.");
  Ok(())
}

async fn validate_payload(ctx: ContextData<CreateProductCtxData>) -> AppResult<PipelineControl> {
  let validated = ctx.read().payload.validate()?;
  debug!(product_name = %validated.name, status = %validated.status, "Product payload valid.");
  ctx.write().validated = Some(validated);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "create_product::ensure_unique_name", skip_all, err(Display))]
async fn ensure_unique_name(ctx: ContextData<CreateProductCtxData>) -> AppResult<PipelineControl> {
  let (name, pool) = {
    let guard = ctx.read();
    (validated(&guard)?.name.clone(), guard.app_state.db_pool.clone())
  };

  if product_service::name_exists(&pool, &name, None).await? {
    warn!(product_name = %name, "Product name already taken.");
    return Err(AppError::invalid("name", "A product with this name already exists"));
  }
  Ok(PipelineControl::Continue)
}

async fn insert_product(ctx: ContextData<CreateProductCtxData>) -> AppResult<PipelineControl> {
  let (new_product, pool) = {
    let guard = ctx.read();
    (validated(&guard)?.clone(), guard.app_state.db_pool.clone())
  };

  let product = product_service::create(&pool, &new_product).await?;
  ctx.write().created = Some(product);
  Ok(PipelineControl::Continue)
}

fn validated(data: &CreateProductCtxData) -> AppResult<&NewProduct> {
  data
    .validated
    .as_ref()
    .ok_or_else(|| AppError::Internal("Product payload was not validated".to_string()))
}
