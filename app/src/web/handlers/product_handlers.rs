// app/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::instrument;

use crate::errors::AppError;
use crate::pipelines::contexts::{BulkDeleteCtxData, CreateProductCtxData};
use crate::pipelines::run_flow;
use crate::requests::{
  applied_filters, CheckNamePayload, CreateProductPayload, ListProductsQuery, LowStockQuery, ProductIdsPayload,
};
use crate::services::policy::Permissions;
use crate::services::product_service;
use crate::state::AppState;
use crate::web::extractors::{AdminUser, AuthenticatedUser};
use crate::web::response;

#[instrument(name = "handler::list_products", skip_all, fields(user_id = auth.user.id), err(Display))]
pub async fn list(
  auth: AuthenticatedUser,
  state: web::Data<AppState>,
  query: web::Query<ListProductsQuery>,
) -> Result<HttpResponse, AppError> {
  let params = query.validate()?;
  let page = product_service::list(&state.db_pool, &params).await?;

  Ok(response::ok(
    "Products retrieved successfully",
    json!({
      "products": page.items,
      "pagination": page.pagination,
      "filters_applied": applied_filters(&params),
      "user_permissions": Permissions::for_user(&auth.user),
    }),
  ))
}

#[instrument(name = "handler::create_product", skip_all, err(Display))]
pub async fn create(
  _auth: AuthenticatedUser,
  state: web::Data<AppState>,
  payload: web::Json<CreateProductPayload>,
) -> Result<HttpResponse, AppError> {
  let ctx = run_flow(
    &state.flows,
    CreateProductCtxData::new(state.get_ref().clone(), payload.into_inner()),
  )
  .await?;

  let product = ctx
    .write()
    .created
    .take()
    .ok_or_else(|| AppError::Internal("Product flow completed without a product".to_string()))?;
  Ok(response::created("Product created successfully", json!({ "product": product })))
}

#[instrument(name = "handler::show_product", skip(_auth, state), err(Display))]
pub async fn show(
  _auth: AuthenticatedUser,
  state: web::Data<AppState>,
  id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let product = product_service::find_by_id(&state.db_pool, id.into_inner())
    .await?
    .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
  Ok(response::ok("Product retrieved successfully", json!({ "product": product })))
}

#[instrument(name = "handler::delete_product", skip(admin, state), fields(user_id = admin.0.user.id), err(Display))]
pub async fn delete(
  admin: AdminUser,
  state: web::Data<AppState>,
  id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let deleted = product_service::delete(&state.db_pool, id.into_inner()).await?;
  Ok(response::ok(
    "Product deleted successfully",
    json!({ "deleted_product_id": deleted.id }),
  ))
}

#[instrument(name = "handler::bulk_delete_products", skip_all, fields(user_id = admin.0.user.id), err(Display))]
pub async fn bulk_delete(
  admin: AdminUser,
  state: web::Data<AppState>,
  payload: web::Json<ProductIdsPayload>,
) -> Result<HttpResponse, AppError> {
  let ctx = run_flow(
    &state.flows,
    BulkDeleteCtxData::new(state.get_ref().clone(), payload.into_inner()),
  )
  .await?;

  let (results, total_requested) = {
    let mut guard = ctx.write();
    (guard.results.take(), guard.ids.len())
  };
  let results = results.ok_or_else(|| AppError::Internal("Bulk delete completed without results".to_string()))?;

  Ok(response::ok(
    results.to_string(),
    json!({
      "summary": {
        "deleted_count": results.deleted.len(),
        "failed_count": results.failed.len(),
        "not_found_count": results.not_found.len(),
        "total_requested": total_requested,
      },
      "results": results,
    }),
  ))
}

pub async fn statistics(_auth: AuthenticatedUser, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let stats = product_service::statistics(&state.db_pool).await?;
  Ok(response::ok("Product statistics retrieved successfully", stats))
}

#[instrument(name = "handler::low_stock", skip_all, err(Display))]
pub async fn low_stock(
  _auth: AuthenticatedUser,
  state: web::Data<AppState>,
  query: web::Query<LowStockQuery>,
) -> Result<HttpResponse, AppError> {
  let threshold = query.threshold_or(state.config.low_stock_threshold)?;
  let products = product_service::low_stock(&state.db_pool, threshold).await?;
  Ok(response::ok(
    "Low stock products retrieved successfully",
    json!({
      "count": products.len(),
      "products": products,
      "threshold": threshold,
    }),
  ))
}

pub async fn suggested_categories(
  _auth: AuthenticatedUser,
  state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
  let categories = product_service::suggested_categories(&state.db_pool).await?;
  Ok(response::ok(
    "Suggested categories retrieved successfully",
    json!({ "categories": categories }),
  ))
}

#[instrument(name = "handler::check_name", skip_all, err(Display))]
pub async fn check_name(
  _auth: AuthenticatedUser,
  state: web::Data<AppState>,
  payload: web::Json<CheckNamePayload>,
) -> Result<HttpResponse, AppError> {
  let (name, exclude_id) = payload.validate()?;
  if let Some(id) = exclude_id {
    if !product_service::exists(&state.db_pool, id).await? {
      return Err(AppError::invalid("exclude_id", "The selected exclude id is invalid."));
    }
  }

  let exists = product_service::name_exists(&state.db_pool, &name, exclude_id).await?;
  Ok(response::ok(
    "Name availability checked",
    json!({ "name": name, "available": !exists, "exists": exists }),
  ))
}

/// Reports what would block deleting `ids` without deleting anything.
#[instrument(name = "handler::check_deletion_constraints", skip_all, err(Display))]
pub async fn check_deletion_constraints(
  _auth: AuthenticatedUser,
  state: web::Data<AppState>,
  payload: web::Json<ProductIdsPayload>,
) -> Result<HttpResponse, AppError> {
  let ids = payload.validate_ids(None, false)?;
  product_service::ensure_all_exist(&state.db_pool, &ids).await?;

  let constraints = product_service::deletion_constraints(&state.db_pool, &ids).await?;
  Ok(response::ok(
    "Deletion constraints checked",
    json!({
      "can_delete_all": constraints.is_empty(),
      "constrained_count": constraints.len(),
      "total_checked": ids.len(),
      "constraints": constraints,
    }),
  ))
}
