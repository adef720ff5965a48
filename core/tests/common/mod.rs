// tests/common/mod.rs
#![allow(dead_code)]

use once_cell::sync::Lazy;
use stockflow::{ContextData, FlowError, Handler, PipelineControl};
use tracing::Level;

/// A restock request moving through a flow.
#[derive(Clone, Debug, Default)]
pub struct RestockContext {
  pub sku: String,
  pub quantity: i64,
  pub steps_executed: Vec<String>,
  pub stop_at: Option<String>,
  pub approved: bool,
}

impl RestockContext {
  pub fn for_sku(sku: &str, quantity: i64) -> Self {
    Self {
      sku: sku.to_string(),
      quantity,
      ..Default::default()
    }
  }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum RestockError {
  // FlowError is not Clone/Eq, keep its rendering for assertions.
  #[error("flow error: {0}")]
  Flow(String),

  #[error("rejected: {0}")]
  Rejected(String),
}

impl From<FlowError> for RestockError {
  fn from(err: FlowError) -> Self {
    RestockError::Flow(err.to_string())
  }
}

/// Records the step name, adds `delta` to the quantity and honours `stop_at`.
pub fn recording_handler(step_name: &'static str, delta: i64) -> Handler<RestockContext, RestockError> {
  Box::new(move |ctx: ContextData<RestockContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.quantity += delta;
      guard.steps_executed.push(step_name.to_string());
      tracing::debug!(target: "test_handlers", step = step_name, quantity = guard.quantity, "executed");
      if guard.stop_at.as_deref() == Some(step_name) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  })
}

pub fn rejecting_handler(step_name: &'static str, reason: &'static str) -> Handler<RestockContext, RestockError> {
  Box::new(move |ctx: ContextData<RestockContext>| {
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name.to_string());
      Err(RestockError::Rejected(reason.to_string()))
    })
  })
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
