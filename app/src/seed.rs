// app/src/seed.rs

//! Startup seeding, enabled with `SEED_DB=true`.
//!
//! Users are upserted, so re-running keeps the administrator at id 1 with the
//! configured password. Sample products are only inserted into an empty table.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, instrument};

use crate::errors::Result as AppResult;
use crate::models::product::ProductStatus::{self, Discontinued, InStock, LowStock, Ordered};
use crate::services::auth_service;

pub const ADMIN_EMAIL: &str = "admin@email.com";
pub const MODERATOR_EMAIL: &str = "moderator@email.com";

struct SampleProduct {
  name: &'static str,
  quantity: i64,
  category: &'static str,
  description: &'static str,
  price_cents: i64,
  status: ProductStatus,
}

const fn sample(
  name: &'static str,
  quantity: i64,
  category: &'static str,
  description: &'static str,
  price_cents: i64,
  status: ProductStatus,
) -> SampleProduct {
  SampleProduct {
    name,
    quantity,
    category,
    description,
    price_cents,
    status,
  }
}

const SAMPLE_PRODUCTS: &[SampleProduct] = &[
  sample("MacBook Pro 16\" M2", 15, "Electronics", "Apple MacBook Pro with M2 Pro chip, 16GB RAM, 512GB SSD. Perfect for professional development and creative work.", 249_999, InStock),
  sample("Wireless Gaming Mouse", 3, "Electronics", "High-precision wireless gaming mouse with RGB lighting and customizable buttons.", 7_999, LowStock),
  sample("Smart Home Security Camera", 25, "Electronics", "4K security camera with night vision, motion detection, and cloud storage.", 14_999, InStock),
  sample("Mechanical Keyboard", 42, "Electronics", "Durable and reliable electronic equipment with hot-swappable switches.", 12_950, InStock),
  sample("USB-C Cable", 180, "Electronics", "Energy-efficient with long-lasting performance. Braided, 2 metres.", 1_299, InStock),
  sample("4K Studio Monitor", 30, "Electronics", "State-of-the-art design with premium materials. Factory-calibrated 32-inch panel.", 89_900, InStock),
  sample("Discontinued Gaming Console", 0, "Electronics", "Legacy gaming console no longer in production.", 19_999, Discontinued),
  sample("Vintage Leather Jacket", 8, "Clothing", "Premium genuine leather jacket with classic vintage styling.", 18_999, InStock),
  sample("Cotton T-Shirt", 120, "Clothing", "Comfortable and stylish apparel for everyday wear.", 1_599, InStock),
  sample("Running Shoes", 4, "Clothing", "Breathable material with modern cut.", 8_950, LowStock),
  sample("Programming Guide", 60, "Books", "Comprehensive guide with expert insights.", 4_499, InStock),
  sample("Science Fiction Novel", 35, "Books", "Engaging read with valuable information.", 1_850, InStock),
  sample("History Textbook", 2, "Books", "Educational resource with practical applications.", 6_200, LowStock),
  sample("LED Desk Lamp", 48, "Home & Garden", "Functional and decorative item for your home.", 3_499, InStock),
  sample("Garden Tools", 0, "Home & Garden", "Durable construction with aesthetic appeal.", 5_999, Ordered),
  sample("Indoor Plant Pot", 75, "Home & Garden", "Quality craftsmanship with modern design.", 2_199, InStock),
  sample("Fitness Resistance Bands Set", 45, "Sports", "Complete set of resistance bands with various resistance levels for home workouts.", 3_999, InStock),
  sample("Yoga Mat", 5, "Sports", "Ergonomic design for comfort and efficiency.", 2_950, LowStock),
  sample("Dumbbell Set", 12, "Sports", "Professional-grade equipment for optimal performance.", 14_900, InStock),
  sample("Building Blocks Kit", 22, "Toys", "Popular item with great customer reviews.", 4_999, InStock),
  sample("Herbal Face Cream", 14, "Health & Beauty", "Quality product with excellent value for money.", 2_450, InStock),
  sample("Professional Office Chair", 0, "Office Supplies", "Ergonomic office chair with lumbar support and adjustable height.", 29_999, Ordered),
  sample("Executive Standing Desk", 25, "Office Supplies", "Motorised sit-stand desk with memory presets.", 64_900, InStock),
  sample("Organic Coffee Beans", 2, "Food & Beverages", "Premium organic coffee beans from sustainable farms.", 2_499, LowStock),
];

/// Seeds users and, when the catalogue is empty, sample products.
#[instrument(name = "seed::run", skip_all)]
pub async fn run(pool: &SqlitePool, admin_password: &str) -> AppResult<()> {
  seed_users(pool, admin_password).await?;
  seed_products(pool).await?;
  Ok(())
}

async fn seed_users(pool: &SqlitePool, password: &str) -> AppResult<()> {
  let password_hash = auth_service::hash_password_blocking(password.to_string()).await?;
  let now = Utc::now();

  sqlx::query(
    "INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at) \
     VALUES (1, ?, ?, ?, 'admin', ?, ?) \
     ON CONFLICT(id) DO UPDATE SET name = excluded.name, email = excluded.email, \
       password_hash = excluded.password_hash, role = 'admin', updated_at = excluded.updated_at",
  )
  .bind("System Administrator")
  .bind(ADMIN_EMAIL)
  .bind(&password_hash)
  .bind(now)
  .bind(now)
  .execute(pool)
  .await?;

  sqlx::query(
    "INSERT INTO users (name, email, password_hash, role, created_at, updated_at) \
     VALUES (?, ?, ?, 'moderator', ?, ?) \
     ON CONFLICT(email) DO UPDATE SET name = excluded.name, password_hash = excluded.password_hash, \
       role = 'moderator', updated_at = excluded.updated_at",
  )
  .bind("Sample Moderator")
  .bind(MODERATOR_EMAIL)
  .bind(&password_hash)
  .bind(now)
  .bind(now)
  .execute(pool)
  .await?;

  info!(admin = ADMIN_EMAIL, moderator = MODERATOR_EMAIL, "Seeded users.");
  Ok(())
}

async fn seed_products(pool: &SqlitePool) -> AppResult<()> {
  let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products").fetch_one(pool).await?;
  if existing > 0 {
    info!(existing, "Products already present, skipping product seed.");
    return Ok(());
  }

  let now = Utc::now();
  let mut tx = pool.begin().await?;
  for product in SAMPLE_PRODUCTS {
    sqlx::query(
      "INSERT INTO products (name, quantity, category, description, price_cents, status, created_at, updated_at) \
       VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(product.name)
    .bind(product.quantity)
    .bind(product.category)
    .bind(product.description)
    .bind(product.price_cents)
    .bind(product.status)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;
  }
  tx.commit().await?;

  info!(count = SAMPLE_PRODUCTS.len(), "Seeded sample products.");
  Ok(())
}
