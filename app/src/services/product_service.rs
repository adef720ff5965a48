// app/src/services/product_service.rs

//! Product queries and mutations.
//!
//! Listing composes optional predicates onto one `SELECT` with
//! [`QueryBuilder`]; every user value is bound, and the sort column comes
//! from a closed enum. Bulk deletion reports per-id outcomes instead of
//! running in a transaction.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{error, info, instrument, warn};

use crate::errors::{AppError, Result as AppResult};
use crate::models::product::{serialize_money, Product, ProductStatus, PRODUCT_COLUMNS};
use crate::validation::ValidationErrors;

/// Products worth more than this in total (price × quantity, in cents) are protected from deletion.
pub const HIGH_VALUE_THRESHOLD_CENTS: i64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
  Name,
  Price,
  Quantity,
  CreatedAt,
  UpdatedAt,
}

impl SortColumn {
  pub const ALL: [SortColumn; 5] = [
    SortColumn::Name,
    SortColumn::Price,
    SortColumn::Quantity,
    SortColumn::CreatedAt,
    SortColumn::UpdatedAt,
  ];

  /// Name accepted in the `sort_by` query parameter.
  pub fn as_param(self) -> &'static str {
    match self {
      SortColumn::Name => "name",
      SortColumn::Price => "price",
      SortColumn::Quantity => "quantity",
      SortColumn::CreatedAt => "created_at",
      SortColumn::UpdatedAt => "updated_at",
    }
  }

  fn column(self) -> &'static str {
    match self {
      SortColumn::Price => "price_cents",
      other => other.as_param(),
    }
  }

  pub fn from_param(value: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|c| c.as_param() == value)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
  Asc,
  Desc,
}

impl SortOrder {
  pub fn as_param(self) -> &'static str {
    match self {
      SortOrder::Asc => "asc",
      SortOrder::Desc => "desc",
    }
  }

  pub fn from_param(value: &str) -> Option<Self> {
    match value {
      "asc" => Some(SortOrder::Asc),
      "desc" => Some(SortOrder::Desc),
      _ => None,
    }
  }

  fn sql(self) -> &'static str {
    match self {
      SortOrder::Asc => "ASC",
      SortOrder::Desc => "DESC",
    }
  }
}

/// Optional predicates; `None` means "not filtered".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilters {
  pub search: Option<String>,
  pub category: Option<String>,
  pub status: Option<ProductStatus>,
  pub min_price_cents: Option<i64>,
  pub max_price_cents: Option<i64>,
  pub low_stock_threshold: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
  pub filters: ProductFilters,
  pub sort_by: SortColumn,
  pub sort_order: SortOrder,
  pub per_page: i64,
  pub page: i64,
}

impl ListParams {
  /// Rows skipped before this page, or `None` when the page lies beyond any representable offset.
  pub fn offset(&self) -> Option<i64> {
    page_offset(self.page, self.per_page)
  }
}

fn page_offset(page: i64, per_page: i64) -> Option<i64> {
  page.checked_sub(1)?.checked_mul(per_page)
}

impl Default for ListParams {
  fn default() -> Self {
    Self {
      filters: ProductFilters::default(),
      sort_by: SortColumn::CreatedAt,
      sort_order: SortOrder::Desc,
      per_page: 15,
      page: 1,
    }
  }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Pagination {
  pub current_page: i64,
  pub last_page: i64,
  pub per_page: i64,
  pub total: i64,
  pub from: Option<i64>,
  pub to: Option<i64>,
}

impl Pagination {
  pub fn compute(page: i64, per_page: i64, total: i64, items_on_page: usize) -> Self {
    let last_page = ((total + per_page - 1) / per_page).max(1);
    let (from, to) = match page_offset(page, per_page) {
      Some(offset) if items_on_page > 0 => (
        Some(offset.saturating_add(1)),
        Some(offset.saturating_add(items_on_page as i64)),
      ),
      _ => (None, None),
    };
    Self {
      current_page: page,
      last_page,
      per_page,
      total,
      from,
      to,
    }
  }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
  pub items: Vec<T>,
  pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductStatistics {
  pub total_products: i64,
  pub in_stock: i64,
  pub low_stock: i64,
  pub ordered: i64,
  pub discontinued: i64,
  #[serde(serialize_with = "serialize_money")]
  pub total_value: Decimal,
  pub categories: Vec<String>,
}

/// Validated input for a new product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
  pub name: String,
  pub quantity: i64,
  pub category: String,
  pub description: Option<String>,
  pub price_cents: i64,
  pub status: ProductStatus,
}

/// Why a single product may not be deleted.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeletionConstraint {
  pub product_name: String,
  pub constraints: Vec<String>,
}

/// Constrained products keyed by id; unconstrained ids are absent.
pub type DeletionConstraints = BTreeMap<i64, DeletionConstraint>;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeletedProduct {
  pub id: i64,
  pub name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FailedDeletion {
  pub id: i64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct BulkDeleteResults {
  pub deleted: Vec<DeletedProduct>,
  pub failed: Vec<FailedDeletion>,
  pub not_found: Vec<i64>,
}

impl fmt::Display for BulkDeleteResults {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "Deletion completed: {} deleted, {} failed, {} not found",
      self.deleted.len(),
      self.failed.len(),
      self.not_found.len()
    )
  }
}

/// Escapes LIKE wildcards so user input matches literally (used with `ESCAPE '\'`).
pub fn like_pattern(term: &str) -> String {
  let mut escaped = String::with_capacity(term.len() + 2);
  escaped.push('%');
  for ch in term.chars() {
    if matches!(ch, '\\' | '%' | '_') {
      escaped.push('\\');
    }
    escaped.push(ch);
  }
  escaped.push('%');
  escaped
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filters: &ProductFilters) {
  qb.push(" WHERE 1 = 1");
  if let Some(search) = &filters.search {
    let pattern = like_pattern(search);
    qb.push(" AND (name LIKE ")
      .push_bind(pattern.clone())
      .push(" ESCAPE '\\' OR description LIKE ")
      .push_bind(pattern)
      .push(" ESCAPE '\\')");
  }
  if let Some(category) = &filters.category {
    qb.push(" AND category LIKE ")
      .push_bind(like_pattern(category))
      .push(" ESCAPE '\\'");
  }
  if let Some(status) = filters.status {
    qb.push(" AND status = ").push_bind(status);
  }
  if let Some(min) = filters.min_price_cents {
    qb.push(" AND price_cents >= ").push_bind(min);
  }
  if let Some(max) = filters.max_price_cents {
    qb.push(" AND price_cents <= ").push_bind(max);
  }
  if let Some(threshold) = filters.low_stock_threshold {
    qb.push(" AND quantity <= ").push_bind(threshold);
  }
}

/// Builds the page query; exposed for inspection in tests.
///
/// An unrepresentable offset is clamped to `i64::MAX`, which selects nothing.
pub fn build_list_query(params: &ListParams) -> QueryBuilder<'static, Sqlite> {
  let mut qb = QueryBuilder::new(format!("SELECT {} FROM products", PRODUCT_COLUMNS));
  push_filters(&mut qb, &params.filters);
  qb.push(format!(
    " ORDER BY {} {}, id {}",
    params.sort_by.column(),
    params.sort_order.sql(),
    params.sort_order.sql()
  ));
  qb.push(" LIMIT ")
    .push_bind(params.per_page)
    .push(" OFFSET ")
    .push_bind(params.offset().unwrap_or(i64::MAX));
  qb
}

fn build_count_query(filters: &ProductFilters) -> QueryBuilder<'static, Sqlite> {
  let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM products");
  push_filters(&mut qb, filters);
  qb
}

#[instrument(name = "product_service::list", skip(pool))]
pub async fn list(pool: &SqlitePool, params: &ListParams) -> AppResult<Page<Product>> {
  let total: i64 = build_count_query(&params.filters)
    .build_query_scalar()
    .fetch_one(pool)
    .await?;

  let items: Vec<Product> = match params.offset() {
    Some(offset) if offset < total => build_list_query(params).build_query_as().fetch_all(pool).await?,
    _ => Vec::new(),
  };

  let pagination = Pagination::compute(params.page, params.per_page, total, items.len());
  info!(total, returned = items.len(), "Products listed.");
  Ok(Page { items, pagination })
}

#[instrument(name = "product_service::statistics", skip(pool))]
pub async fn statistics(pool: &SqlitePool) -> AppResult<ProductStatistics> {
  let (total_products, in_stock, low_stock, ordered, discontinued): (i64, i64, i64, i64, i64) =
    sqlx::query_as(
      "SELECT COUNT(*), \
         COALESCE(SUM(CASE WHEN status = 'in_stock' THEN 1 ELSE 0 END), 0), \
         COALESCE(SUM(CASE WHEN status = 'low_stock' THEN 1 ELSE 0 END), 0), \
         COALESCE(SUM(CASE WHEN status = 'ordered' THEN 1 ELSE 0 END), 0), \
         COALESCE(SUM(CASE WHEN status = 'discontinued' THEN 1 ELSE 0 END), 0) \
       FROM products",
    )
    .fetch_one(pool)
    .await?;

  // Summed in Rust: the SQL product of the two columns can leave INTEGER range.
  let line_values: Vec<(i64, i64)> = sqlx::query_as("SELECT price_cents, quantity FROM products")
    .fetch_all(pool)
    .await?;
  let total_cents: i128 = line_values
    .into_iter()
    .map(|(cents, quantity)| i128::from(cents) * i128::from(quantity))
    .sum();
  let total_value = Decimal::try_from_i128_with_scale(total_cents, 2).unwrap_or(Decimal::MAX);

  Ok(ProductStatistics {
    total_products,
    in_stock,
    low_stock,
    ordered,
    discontinued,
    total_value,
    categories: suggested_categories(pool).await?,
  })
}

#[instrument(name = "product_service::low_stock", skip(pool))]
pub async fn low_stock(pool: &SqlitePool, threshold: i64) -> AppResult<Vec<Product>> {
  let products = sqlx::query_as(&format!(
    "SELECT {} FROM products WHERE quantity <= ? ORDER BY quantity ASC, id ASC",
    PRODUCT_COLUMNS
  ))
  .bind(threshold)
  .fetch_all(pool)
  .await?;
  Ok(products)
}

/// Distinct non-empty categories, sorted.
pub async fn suggested_categories(pool: &SqlitePool) -> AppResult<Vec<String>> {
  let categories = sqlx::query_scalar(
    "SELECT DISTINCT category FROM products WHERE category IS NOT NULL AND category <> '' ORDER BY category",
  )
  .fetch_all(pool)
  .await?;
  Ok(categories)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> AppResult<Option<Product>> {
  let product = sqlx::query_as(&format!("SELECT {} FROM products WHERE id = ?", PRODUCT_COLUMNS))
    .bind(id)
    .fetch_optional(pool)
    .await?;
  Ok(product)
}

pub async fn exists(pool: &SqlitePool, id: i64) -> AppResult<bool> {
  let found: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE id = ?)")
    .bind(id)
    .fetch_one(pool)
    .await?;
  Ok(found != 0)
}

/// Ids from `ids` with no matching row, in input order.
pub async fn missing_ids(pool: &SqlitePool, ids: &[i64]) -> AppResult<Vec<i64>> {
  let mut missing = Vec::new();
  for &id in ids {
    if !exists(pool, id).await? {
      missing.push(id);
    }
  }
  Ok(missing)
}

/// Fails with a per-index validation error for every id that has no product.
pub async fn ensure_all_exist(pool: &SqlitePool, ids: &[i64]) -> AppResult<()> {
  let missing = missing_ids(pool, ids).await?;
  if missing.is_empty() {
    return Ok(());
  }
  let mut errors = ValidationErrors::new();
  for (index, id) in ids.iter().enumerate() {
    if missing.contains(id) {
      errors.add(&format!("ids.{}", index), "One or more products do not exist");
    }
  }
  Err(AppError::Validation(errors))
}

pub async fn name_exists(pool: &SqlitePool, name: &str, exclude_id: Option<i64>) -> AppResult<bool> {
  let found: i64 =
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE name = ? AND (? IS NULL OR id <> ?))")
      .bind(name)
      .bind(exclude_id)
      .bind(exclude_id)
      .fetch_one(pool)
      .await?;
  Ok(found != 0)
}

#[instrument(name = "product_service::create", skip(pool, new_product), fields(product_name = %new_product.name))]
pub async fn create(pool: &SqlitePool, new_product: &NewProduct) -> AppResult<Product> {
  let now = Utc::now();
  let inserted = sqlx::query_as::<_, Product>(&format!(
    "INSERT INTO products (name, quantity, category, description, price_cents, status, created_at, updated_at) \
     VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING {}",
    PRODUCT_COLUMNS
  ))
  .bind(&new_product.name)
  .bind(new_product.quantity)
  .bind(&new_product.category)
  .bind(&new_product.description)
  .bind(new_product.price_cents)
  .bind(new_product.status)
  .bind(now)
  .bind(now)
  .fetch_one(pool)
  .await;

  match inserted {
    Ok(product) => {
      info!(product_id = product.id, "Product created.");
      Ok(product)
    }
    Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
      warn!("Product name taken by a concurrent insert.");
      Err(AppError::invalid("name", "A product with this name already exists"))
    }
    Err(other) => {
      error!(error = %other, "Failed to create product.");
      Err(other.into())
    }
  }
}

/// Deletes one product, returning the removed row.
#[instrument(name = "product_service::delete", skip(pool))]
pub async fn delete(pool: &SqlitePool, id: i64) -> AppResult<Product> {
  let product = find_by_id(pool, id)
    .await?
    .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

  info!(
    product_id = product.id,
    product_name = %product.name,
    category = %product.category,
    "Product deletion initiated."
  );

  let result = sqlx::query("DELETE FROM products WHERE id = ?")
    .bind(id)
    .execute(pool)
    .await?;
  if result.rows_affected() == 0 {
    // Removed by someone else between the read and the delete.
    return Err(AppError::NotFound("Product not found".to_string()));
  }

  info!(
    product_id = product.id,
    product_name = %product.name,
    quantity = product.quantity,
    price = %product.price(),
    "Product deleted."
  );
  Ok(product)
}

#[instrument(name = "product_service::delete_many", skip(pool), fields(requested = ids.len()))]
pub async fn delete_many(pool: &SqlitePool, ids: &[i64]) -> AppResult<BulkDeleteResults> {
  let mut results = BulkDeleteResults::default();

  for &id in ids {
    let product = match find_by_id(pool, id).await {
      Ok(Some(product)) => product,
      Ok(None) => {
        results.not_found.push(id);
        continue;
      }
      Err(e) => {
        warn!(product_id = id, error = %e, "Lookup before bulk delete failed.");
        results.failed.push(FailedDeletion {
          id,
          name: None,
          error: Some("Database operation failed".to_string()),
        });
        continue;
      }
    };

    match sqlx::query("DELETE FROM products WHERE id = ?").bind(id).execute(pool).await {
      Ok(done) if done.rows_affected() > 0 => results.deleted.push(DeletedProduct { id, name: product.name }),
      Ok(_) => results.failed.push(FailedDeletion {
        id,
        name: Some(product.name),
        error: None,
      }),
      Err(e) => {
        warn!(product_id = id, error = %e, "Bulk delete of one product failed.");
        results.failed.push(FailedDeletion {
          id,
          name: Some(product.name),
          error: Some("Database operation failed".to_string()),
        });
      }
    }
  }

  info!(
    deleted = results.deleted.len(),
    failed = results.failed.len(),
    not_found = results.not_found.len(),
    "Bulk product deletion completed."
  );
  Ok(results)
}

/// Business rules blocking deletion of `product`, given how many products share its category.
pub fn evaluate_constraints(product: &Product, category_count: i64) -> Vec<String> {
  let mut constraints = Vec::new();
  if product.total_value_cents() > HIGH_VALUE_THRESHOLD_CENTS {
    constraints.push("High-value product (total value > $10,000)".to_string());
  }
  if !product.category.is_empty() && category_count == 1 {
    constraints.push(format!("Last product in category \"{}\"", product.category));
  }
  constraints
}

#[instrument(name = "product_service::deletion_constraints", skip(pool), fields(checked = ids.len()))]
pub async fn deletion_constraints(pool: &SqlitePool, ids: &[i64]) -> AppResult<DeletionConstraints> {
  let mut constraints = DeletionConstraints::new();

  for &id in ids {
    // Removed after the existence check.
    let Some(product) = find_by_id(pool, id).await? else {
      continue;
    };

    let category_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category = ?")
      .bind(&product.category)
      .fetch_one(pool)
      .await?;

    let found = evaluate_constraints(&product, category_count);
    if !found.is_empty() {
      constraints.insert(
        id,
        DeletionConstraint {
          product_name: product.name,
          constraints: found,
        },
      );
    }
  }

  Ok(constraints)
}
