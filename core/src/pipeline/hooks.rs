// src/pipeline/hooks.rs

//! Registration of `before`, `on` and `after` handlers.
//!
//! A handler is any `Fn(ContextData<TData>) -> impl Future<Output =
//! Result<PipelineControl, E>>` where `E: Into<Err>`, so plain `async fn`s
//! returning the application's error type can be passed directly.

use crate::core::context_data::ContextData;
use crate::core::control::PipelineControl;
use crate::core::handler::{boxed_handler, Handler};
use crate::error::{FlowError, FlowResult};
use crate::pipeline::definition::Pipeline;
use std::collections::HashMap;
use std::future::Future;
use tracing::{event, Level};

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn before<F, UserErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) -> FlowResult<&mut Self>
  where
    F: Future<Output = Result<PipelineControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.position_of(step_name)?;
    push_handler(&mut self.before, step_name, boxed_handler(handler_fn));
    event!(Level::DEBUG, %step_name, phase = "before", "Handler registered.");
    Ok(self)
  }

  pub fn on<F, UserErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) -> FlowResult<&mut Self>
  where
    F: Future<Output = Result<PipelineControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.position_of(step_name)?;
    push_handler(&mut self.on, step_name, boxed_handler(handler_fn));
    event!(Level::DEBUG, %step_name, phase = "on", "Handler registered.");
    Ok(self)
  }

  pub fn after<F, UserErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) -> FlowResult<&mut Self>
  where
    F: Future<Output = Result<PipelineControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.position_of(step_name)?;
    push_handler(&mut self.after, step_name, boxed_handler(handler_fn));
    event!(Level::DEBUG, %step_name, phase = "after", "Handler registered.");
    Ok(self)
  }
}

fn push_handler<TData: Send + Sync + 'static, Err>(
  table: &mut HashMap<String, Vec<Handler<TData, Err>>>,
  step_name: &str,
  handler: Handler<TData, Err>,
) {
  table.entry(step_name.to_string()).or_default().push(handler);
}
