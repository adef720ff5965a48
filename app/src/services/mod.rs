// app/src/services/mod.rs

//! Business logic and outbound integrations used by handlers and flows.

pub mod auth_service;
pub mod chatbot;
pub mod policy;
pub mod product_service;
pub mod retry;
pub mod token_service;
