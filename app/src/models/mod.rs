// app/src/models/mod.rs

//! Database entities.

pub mod product;
pub mod user;

pub use product::{Product, ProductStatus};
pub use user::{Role, User};
