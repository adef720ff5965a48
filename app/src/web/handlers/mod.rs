// app/src/web/handlers/mod.rs

pub mod auth_handlers;
pub mod chatbot_handlers;
pub mod health;
pub mod product_handlers;
