// src/lib.rs

//! Stockflow: a small async, step-based flow engine.
//!
//! A flow is a [`Pipeline`] of named steps run against a shared, lockable
//! context ([`ContextData`]). Each step can carry `before`, `on` and `after`
//! handlers, can be optional, and can be skipped by a condition evaluated
//! against the context. Handlers may stop the flow early.
//!
//! Pipelines are registered once in a [`FlowRegistry`], keyed by the type of
//! their context data, and dispatched per request by handing the registry a
//! freshly built context.

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::handler::Handler;
pub use crate::core::step::{SkipCondition, StepDef};

pub use crate::pipeline::definition::Pipeline;

pub use crate::error::{FlowError, FlowResult};

pub use crate::registry::FlowRegistry;
