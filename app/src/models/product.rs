// app/src/models/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use sqlx::{FromRow, Type as SqlxType};
use std::fmt;
use std::str::FromStr;

/// Largest accepted price, in cents (99,999,999.99).
pub const MAX_PRICE_CENTS: i64 = 9_999_999_999;
pub const MAX_QUANTITY: i64 = i32::MAX as i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, SqlxType)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
  InStock,
  LowStock,
  Ordered,
  Discontinued,
}

impl ProductStatus {
  pub const ALL: [ProductStatus; 4] = [
    ProductStatus::InStock,
    ProductStatus::LowStock,
    ProductStatus::Ordered,
    ProductStatus::Discontinued,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      ProductStatus::InStock => "in_stock",
      ProductStatus::LowStock => "low_stock",
      ProductStatus::Ordered => "ordered",
      ProductStatus::Discontinued => "discontinued",
    }
  }

  /// Status given to a new product when the caller does not pick one.
  pub fn default_for_quantity(quantity: i64) -> Self {
    if quantity > 10 {
      ProductStatus::InStock
    } else {
      ProductStatus::LowStock
    }
  }
}

impl fmt::Display for ProductStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ProductStatus {
  type Err = ();

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    ProductStatus::ALL.into_iter().find(|status| status.as_str() == s).ok_or(())
  }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
  pub id: i64,
  pub name: String,
  pub quantity: i64,
  pub category: String,
  pub description: Option<String>,
  #[serde(rename = "price", serialize_with = "serialize_cents")]
  pub price_cents: i64,
  pub status: ProductStatus,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Product {
  pub fn price(&self) -> Decimal {
    cents_to_decimal(self.price_cents)
  }

  /// `price × quantity`, in cents.
  pub fn total_value_cents(&self) -> i64 {
    self.price_cents.saturating_mul(self.quantity)
  }
}

/// Column list shared by every `SELECT` that maps into [`Product`].
pub const PRODUCT_COLUMNS: &str =
  "id, name, quantity, category, description, price_cents, status, created_at, updated_at";

/// Rounds to two places (half away from zero) and returns cents, or `None` if out of `i64` range.
pub fn decimal_to_cents(value: Decimal) -> Option<i64> {
  let mut rounded = value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero);
  rounded.rescale(2);
  rounded.mantissa().to_i64()
}

pub fn cents_to_decimal(cents: i64) -> Decimal {
  Decimal::new(cents, 2)
}

/// Serializes an amount as a string with two decimal places.
pub fn serialize_money<S: Serializer>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
  let mut amount = amount.round_dp(2);
  amount.rescale(2);
  serializer.collect_str(&amount)
}

/// Serializes a cent amount as a two-decimal string (`1999` -> `"19.99"`).
pub fn serialize_cents<S: Serializer>(cents: &i64, serializer: S) -> Result<S::Ok, S::Error> {
  serializer.collect_str(&cents_to_decimal(*cents))
}
