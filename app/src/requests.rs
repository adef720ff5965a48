// app/src/requests.rs

//! Request payloads and their validation rules.
//!
//! Numeric fields are taken as raw JSON values so a wrong type produces a
//! field-level 422 message rather than a generic deserialization failure.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::str::FromStr;

use crate::errors::AppError;
use crate::models::product::{cents_to_decimal, decimal_to_cents, ProductStatus, MAX_PRICE_CENTS, MAX_QUANTITY};
use crate::services::product_service::{ListParams, NewProduct, ProductFilters, SortColumn, SortOrder};
use crate::validation::{char_len, is_valid_email, normalize, ValidationErrors};

pub const MAX_BULK_DELETE: usize = 50;
const STATUS_MESSAGE: &str = "Status must be one of: in_stock, low_stock, ordered, discontinued";

fn integer_value(value: &Value) -> Option<i64> {
  match value {
    Value::Number(n) => n
      .as_i64()
      .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15).map(|f| f as i64)),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  }
}

fn decimal_str(raw: &str) -> Option<Decimal> {
  let raw = raw.trim();
  Decimal::from_str(raw).or_else(|_| Decimal::from_scientific(raw)).ok()
}

fn decimal_value(value: &Value) -> Option<Decimal> {
  match value {
    Value::Number(n) => decimal_str(&n.to_string()),
    Value::String(s) => decimal_str(s),
    _ => None,
  }
}

fn boolean_value(value: &Value) -> Option<bool> {
  match value {
    Value::Bool(b) => Some(*b),
    Value::Number(n) => match n.as_i64() {
      Some(0) => Some(false),
      Some(1) => Some(true),
      _ => None,
    },
    Value::String(s) => match s.as_str() {
      "0" | "false" => Some(false),
      "1" | "true" => Some(true),
      _ => None,
    },
    _ => None,
  }
}

fn is_absent(value: &Option<Value>) -> bool {
  match value {
    None | Some(Value::Null) => true,
    Some(Value::String(s)) => s.trim().is_empty(),
    _ => false,
  }
}

// --- Products ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateProductPayload {
  pub name: Option<String>,
  pub quantity: Option<Value>,
  pub category: Option<String>,
  pub description: Option<String>,
  pub price: Option<Value>,
  pub status: Option<String>,
}

impl CreateProductPayload {
  /// Field rules only; name uniqueness needs the database and is checked by the create flow.
  pub fn validate(&self) -> Result<NewProduct, AppError> {
    let mut errors = ValidationErrors::new();

    let name = normalize(self.name.as_deref());
    match &name {
      None => errors.add("name", "Product name is required"),
      Some(n) if char_len(n) > 255 => errors.add("name", "Product name cannot exceed 255 characters"),
      Some(_) => {}
    }

    let quantity = if is_absent(&self.quantity) {
      errors.add("quantity", "Product quantity is required");
      None
    } else {
      match self.quantity.as_ref().and_then(integer_value) {
        None => {
          errors.add("quantity", "Quantity must be a valid number");
          None
        }
        Some(q) if q < 0 => {
          errors.add("quantity", "Quantity cannot be negative");
          None
        }
        Some(q) if q > MAX_QUANTITY => {
          errors.add("quantity", "Quantity cannot exceed 2147483647");
          None
        }
        Some(q) => Some(q),
      }
    };

    let category = normalize(self.category.as_deref());
    if category.as_deref().is_some_and(|c| char_len(c) > 255) {
      errors.add("category", "Category cannot exceed 255 characters");
    }

    let description = normalize(self.description.as_deref());
    if description.as_deref().is_some_and(|d| char_len(d) > 1000) {
      errors.add("description", "Description cannot exceed 1000 characters");
    }

    let price_cents = if is_absent(&self.price) {
      errors.add("price", "Product price is required");
      None
    } else {
      match self.price.as_ref().and_then(decimal_value) {
        None => {
          errors.add("price", "Price must be a valid number");
          None
        }
        Some(p) if p.is_sign_negative() && !p.is_zero() => {
          errors.add("price", "Price cannot be negative");
          None
        }
        Some(p) => match decimal_to_cents(p).filter(|c| *c <= MAX_PRICE_CENTS) {
          Some(cents) => Some(cents),
          None => {
            errors.add("price", "Price cannot exceed 99,999,999.99");
            None
          }
        },
      }
    };

    let status = match normalize(self.status.as_deref()) {
      None => None,
      Some(raw) => match raw.parse::<ProductStatus>() {
        Ok(status) => Some(status),
        Err(()) => {
          errors.add("status", STATUS_MESSAGE);
          None
        }
      },
    };

    match (name, quantity, price_cents) {
      (Some(name), Some(quantity), Some(price_cents)) if errors.is_empty() => Ok(NewProduct {
        name,
        quantity,
        category: category.unwrap_or_else(|| "General".to_string()),
        description,
        price_cents,
        status: status.unwrap_or_else(|| ProductStatus::default_for_quantity(quantity)),
      }),
      _ => Err(AppError::Validation(errors)),
    }
  }
}

/// Query string of `GET /products`. Everything arrives as text and is checked here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListProductsQuery {
  pub search: Option<String>,
  pub category: Option<String>,
  pub status: Option<String>,
  pub min_price: Option<String>,
  pub max_price: Option<String>,
  pub sort_by: Option<String>,
  pub sort_order: Option<String>,
  pub per_page: Option<String>,
  pub page: Option<String>,
  pub low_stock_threshold: Option<String>,
}

fn parse_bounded_int(
  errors: &mut ValidationErrors,
  field: &str,
  raw: Option<String>,
  min: i64,
  max: Option<i64>,
  max_message: &str,
) -> Option<i64> {
  let raw = raw?;
  match raw.parse::<i64>() {
    Err(_) => {
      errors.add(field, format!("The {} field must be an integer.", field.replace('_', " ")));
      None
    }
    Ok(v) if v < min => {
      errors.add(field, format!("The {} field must be at least {}.", field.replace('_', " "), min));
      None
    }
    Ok(v) if max.is_some_and(|m| v > m) => {
      errors.add(field, max_message);
      None
    }
    Ok(v) => Some(v),
  }
}

impl ListProductsQuery {
  pub fn validate(&self) -> Result<ListParams, AppError> {
    let mut errors = ValidationErrors::new();

    let search = normalize(self.search.as_deref());
    if search.as_deref().is_some_and(|s| char_len(s) > 255) {
      errors.add("search", "The search field must not be greater than 255 characters.");
    }
    let category = normalize(self.category.as_deref());
    if category.as_deref().is_some_and(|c| char_len(c) > 255) {
      errors.add("category", "The category field must not be greater than 255 characters.");
    }

    let status = normalize(self.status.as_deref()).and_then(|raw| match raw.parse::<ProductStatus>() {
      Ok(s) => Some(s),
      Err(()) => {
        errors.add("status", STATUS_MESSAGE);
        None
      }
    });

    let mut price = |field: &str, message: &str, raw: Option<String>| -> Option<Decimal> {
      let d = decimal_str(&raw?);
      match d {
        None => {
          errors.add(field, message);
          None
        }
        Some(d) if d.is_sign_negative() && !d.is_zero() => {
          errors.add(field, format!("The {} field must be at least 0.", field.replace('_', " ")));
          None
        }
        Some(d) => Some(d),
      }
    };
    let min_price = price(
      "min_price",
      "Minimum price must be a valid number",
      normalize(self.min_price.as_deref()),
    );
    let max_price = price(
      "max_price",
      "The max price field must be a number.",
      normalize(self.max_price.as_deref()),
    );
    if let (Some(min), Some(max)) = (min_price, max_price) {
      if max < min {
        errors.add("max_price", "Maximum price must be greater than or equal to minimum price");
      }
    }

    let sort_by = match normalize(self.sort_by.as_deref()) {
      None => SortColumn::CreatedAt,
      Some(raw) => SortColumn::from_param(&raw).unwrap_or_else(|| {
        errors.add("sort_by", "Sort by must be one of: name, price, quantity, created_at, updated_at");
        SortColumn::CreatedAt
      }),
    };
    let sort_order = match normalize(self.sort_order.as_deref()) {
      None => SortOrder::Desc,
      Some(raw) => SortOrder::from_param(&raw).unwrap_or_else(|| {
        errors.add("sort_order", "Sort order must be either asc or desc");
        SortOrder::Desc
      }),
    };

    let per_page = parse_bounded_int(
      &mut errors,
      "per_page",
      normalize(self.per_page.as_deref()),
      1,
      Some(100),
      "Items per page cannot exceed 100",
    )
    .unwrap_or(15);
    let page = parse_bounded_int(&mut errors, "page", normalize(self.page.as_deref()), 1, None, "").unwrap_or(1);
    let low_stock_threshold = parse_bounded_int(
      &mut errors,
      "low_stock_threshold",
      normalize(self.low_stock_threshold.as_deref()),
      0,
      None,
      "",
    );

    // Zero-valued bounds and threshold count as "not given".
    let to_cents = |d: Option<Decimal>| d.filter(|d| !d.is_zero()).and_then(decimal_to_cents);
    let params = ListParams {
      filters: ProductFilters {
        search,
        category,
        status,
        min_price_cents: to_cents(min_price),
        max_price_cents: to_cents(max_price),
        low_stock_threshold: low_stock_threshold.filter(|t| *t != 0),
      },
      sort_by,
      sort_order,
      per_page,
      page,
    };
    errors.finish(params)
  }
}

/// The effective listing parameters, echoed back as `filters_applied`.
pub fn applied_filters(params: &ListParams) -> Map<String, Value> {
  let mut applied = Map::new();
  let f = &params.filters;
  if let Some(search) = &f.search {
    applied.insert("search".into(), Value::from(search.as_str()));
  }
  if let Some(category) = &f.category {
    applied.insert("category".into(), Value::from(category.as_str()));
  }
  if let Some(status) = f.status {
    applied.insert("status".into(), Value::from(status.as_str()));
  }
  if let Some(min) = f.min_price_cents {
    applied.insert("min_price".into(), Value::from(cents_to_decimal(min).to_string()));
  }
  if let Some(max) = f.max_price_cents {
    applied.insert("max_price".into(), Value::from(cents_to_decimal(max).to_string()));
  }
  applied.insert("sort_by".into(), Value::from(params.sort_by.as_param()));
  applied.insert("sort_order".into(), Value::from(params.sort_order.as_param()));
  applied.insert("per_page".into(), Value::from(params.per_page));
  applied.insert("page".into(), Value::from(params.page));
  if let Some(threshold) = f.low_stock_threshold {
    applied.insert("low_stock_threshold".into(), Value::from(threshold));
  }
  applied
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LowStockQuery {
  pub threshold: Option<String>,
}

impl LowStockQuery {
  pub fn threshold_or(&self, default: i64) -> Result<i64, AppError> {
    let mut errors = ValidationErrors::new();
    let threshold =
      parse_bounded_int(&mut errors, "threshold", normalize(self.threshold.as_deref()), 0, None, "").unwrap_or(default);
    errors.finish(threshold)
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckNamePayload {
  pub name: Option<String>,
  pub exclude_id: Option<Value>,
}

impl CheckNamePayload {
  /// Trimmed name and optional id to ignore; the id's existence is checked by the caller.
  pub fn validate(&self) -> Result<(String, Option<i64>), AppError> {
    let mut errors = ValidationErrors::new();
    let name = normalize(self.name.as_deref());
    match &name {
      None => errors.add("name", "The name field is required."),
      Some(n) if char_len(n) > 255 => errors.add("name", "The name field must not be greater than 255 characters."),
      Some(_) => {}
    }
    let exclude_id = if is_absent(&self.exclude_id) {
      None
    } else {
      let parsed = self.exclude_id.as_ref().and_then(integer_value);
      if parsed.is_none() {
        errors.add("exclude_id", "The exclude id field must be an integer.");
      }
      parsed
    };
    match name {
      Some(name) if errors.is_empty() => Ok((name, exclude_id)),
      _ => Err(AppError::Validation(errors)),
    }
  }
}

/// Body of the constraint check and bulk delete endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductIdsPayload {
  pub ids: Option<Value>,
  pub force: Option<Value>,
}

impl ProductIdsPayload {
  /// Shape rules for `ids`: a non-empty array of integers, at most `max` long, optionally without duplicates.
  pub fn validate_ids(&self, max: Option<usize>, reject_duplicates: bool) -> Result<Vec<i64>, AppError> {
    let mut errors = ValidationErrors::new();
    let items = match &self.ids {
      None | Some(Value::Null) => {
        errors.add("ids", "At least one product ID is required");
        return Err(AppError::Validation(errors));
      }
      Some(Value::Array(items)) => items,
      Some(_) => {
        errors.add("ids", "Product IDs must be provided as an array");
        return Err(AppError::Validation(errors));
      }
    };

    if items.is_empty() {
      errors.add("ids", "At least one product ID is required");
    }
    if let Some(max) = max {
      if items.len() > max {
        errors.add("ids", format!("Cannot delete more than {} products at once", max));
      }
    }

    let mut ids = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
      match item {
        Value::Null => errors.add(&format!("ids.{}", index), "Each product ID is required"),
        other => match integer_value(other) {
          Some(id) => ids.push(id),
          None => errors.add(&format!("ids.{}", index), "Product IDs must be valid integers"),
        },
      }
    }

    if reject_duplicates {
      let unique: HashSet<i64> = ids.iter().copied().collect();
      if unique.len() != ids.len() {
        errors.add("ids", "Duplicate product IDs are not allowed");
      }
    }

    errors.finish(ids)
  }

  pub fn force(&self) -> Result<bool, AppError> {
    if is_absent(&self.force) {
      return Ok(false);
    }
    self
      .force
      .as_ref()
      .and_then(boolean_value)
      .ok_or_else(|| AppError::invalid("force", "The force field must be true or false."))
  }
}

// --- Auth ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterPayload {
  pub name: Option<String>,
  pub email: Option<String>,
  pub password: Option<String>,
  pub password_confirmation: Option<String>,
}

/// Registration input that passed field rules.
#[derive(Debug, Clone)]
pub struct ValidRegistration {
  pub name: String,
  pub email: String,
  pub password: String,
}

impl RegisterPayload {
  /// Field rules only; email uniqueness is checked by the register flow.
  pub fn validate(&self) -> Result<ValidRegistration, AppError> {
    let mut errors = ValidationErrors::new();

    let name = normalize(self.name.as_deref());
    match &name {
      None => errors.add("name", "The name field is required."),
      Some(n) if char_len(n) > 255 => errors.add("name", "The name field must not be greater than 255 characters."),
      Some(_) => {}
    }

    let email = normalize(self.email.as_deref()).map(|e| e.to_lowercase());
    match &email {
      None => errors.add("email", "The email field is required."),
      Some(e) if !is_valid_email(e) => errors.add("email", "The email field must be a valid email address."),
      Some(e) if char_len(e) > 255 => errors.add("email", "The email field must not be greater than 255 characters."),
      Some(_) => {}
    }

    let password = self.password.clone().filter(|p| !p.is_empty());
    match &password {
      None => errors.add("password", "The password field is required."),
      Some(p) => {
        if char_len(p) < 8 {
          errors.add("password", "The password field must be at least 8 characters.");
        }
        if self.password_confirmation.as_deref() != Some(p.as_str()) {
          errors.add("password", "The password field confirmation does not match.");
        }
      }
    }

    match (name, email, password) {
      (Some(name), Some(email), Some(password)) if errors.is_empty() => Ok(ValidRegistration { name, email, password }),
      _ => Err(AppError::Validation(errors)),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginPayload {
  pub email: Option<String>,
  pub password: Option<String>,
}

impl LoginPayload {
  pub fn validate(&self) -> Result<(String, String), AppError> {
    let mut errors = ValidationErrors::new();
    let email = normalize(self.email.as_deref()).map(|e| e.to_lowercase());
    match &email {
      None => errors.add("email", "The email field is required."),
      Some(e) if !is_valid_email(e) => errors.add("email", "The email field must be a valid email address."),
      Some(_) => {}
    }
    let password = self.password.clone().filter(|p| !p.is_empty());
    if password.is_none() {
      errors.add("password", "The password field is required.");
    }
    match (email, password) {
      (Some(email), Some(password)) if errors.is_empty() => Ok((email, password)),
      _ => Err(AppError::Validation(errors)),
    }
  }
}

// --- Chat ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatMessagePayload {
  pub message: Option<Value>,
}

impl ChatMessagePayload {
  pub fn validate(&self) -> Result<String, AppError> {
    match &self.message {
      Some(Value::String(m)) if !m.trim().is_empty() => {
        if char_len(m) > 1000 {
          Err(AppError::invalid(
            "message",
            "The message field must not be greater than 1000 characters.",
          ))
        } else {
          Ok(m.clone())
        }
      }
      Some(Value::String(_)) | Some(Value::Null) | None => {
        Err(AppError::invalid("message", "The message field is required."))
      }
      Some(_) => Err(AppError::invalid("message", "The message field must be a string.")),
    }
  }
}
