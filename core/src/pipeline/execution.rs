// src/pipeline/execution.rs

//! `Pipeline::run()`.

use crate::core::context_data::ContextData;
use crate::core::control::{PipelineControl, PipelineResult};
use crate::core::handler::Handler;
use crate::error::FlowError;
use crate::pipeline::definition::Pipeline;
use tracing::{event, instrument, Instrument, Level};

#[derive(Debug, Clone, Copy)]
enum Phase {
  Before,
  On,
  After,
}

impl Phase {
  const ORDER: [Phase; 3] = [Phase::Before, Phase::On, Phase::After];

  fn as_str(self) -> &'static str {
    match self {
      Phase::Before => "before",
      Phase::On => "on",
      Phase::After => "after",
    }
  }
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn handlers_for(&self, phase: Phase, step_name: &str) -> &[Handler<TData, Err>] {
    let table = match phase {
      Phase::Before => &self.before,
      Phase::On => &self.on,
      Phase::After => &self.after,
    };
    table.get(step_name).map(Vec::as_slice).unwrap_or_default()
  }

  /// Runs every step in order against `ctx_data`.
  ///
  /// Fails with the first handler error, or with `FlowError::HandlerMissing`
  /// (converted into `Err`) when a non-optional, non-skipped step has no handlers.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(
      context_type = %std::any::type_name::<TData>(),
      num_steps = self.steps.len(),
    ),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    event!(Level::DEBUG, "Flow starting.");

    for (step_index, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();

      if let Some(skip_if) = &step_def.skip_if {
        if skip_if(ctx_data.clone()) {
          event!(Level::DEBUG, %step_name, "Step skipped by condition.");
          continue;
        }
      }

      let has_handlers = Phase::ORDER
        .iter()
        .any(|phase| !self.handlers_for(*phase, step_name).is_empty());
      if !has_handlers {
        if step_def.optional {
          event!(Level::DEBUG, %step_name, "Optional step has no handlers, skipping.");
          continue;
        }
        event!(Level::ERROR, %step_name, "Non-optional step has no handlers.");
        return Err(Err::from(FlowError::HandlerMissing {
          step_name: step_def.name.clone(),
        }));
      }

      let step_span = tracing::info_span!("flow_step", step_name, step_index);
      for phase in Phase::ORDER {
        for handler_fn in self.handlers_for(phase, step_name) {
          let outcome = handler_fn(ctx_data.clone()).instrument(step_span.clone()).await;
          match outcome {
            Ok(PipelineControl::Continue) => {}
            Ok(PipelineControl::Stop) => {
              event!(Level::INFO, %step_name, phase = phase.as_str(), "Flow stopped by handler.");
              return Ok(PipelineResult::Stopped);
            }
            Err(e) => {
              event!(Level::WARN, %step_name, phase = phase.as_str(), error = %e, "Handler failed.");
              return Err(e);
            }
          }
        }
      }
    }

    event!(Level::DEBUG, "Flow completed.");
    Ok(PipelineResult::Completed)
  }
}
