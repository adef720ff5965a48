// tests/error_handling_tests.rs
mod common;
use common::*;
use serial_test::serial;
use stockflow::{ContextData, FlowError, Pipeline, PipelineControl};

#[tokio::test]
#[serial]
async fn missing_handler_names_the_step() {
  setup_tracing();
  let pipeline = Pipeline::<RestockContext, RestockError>::new(&[("count_shelf", false, None)]);

  let err = pipeline.run(ContextData::new(RestockContext::default())).await.unwrap_err();
  match err {
    RestockError::Flow(message) => assert!(message.contains("count_shelf")),
    other => panic!("expected a flow error, got {other:?}"),
  }
}

#[tokio::test]
#[serial]
async fn anyhow_errors_become_handler_errors() {
  setup_tracing();
  let mut pipeline = Pipeline::<RestockContext, FlowError>::new(&[("reserve", false, None)]);
  pipeline
    .on("reserve", |_ctx: ContextData<RestockContext>| async {
      Err::<PipelineControl, _>(anyhow::anyhow!("warehouse unreachable"))
    })
    .unwrap();

  let err = pipeline.run(ContextData::new(RestockContext::default())).await.unwrap_err();
  match err {
    FlowError::HandlerError { source } => assert_eq!(source.to_string(), "warehouse unreachable"),
    other => panic!("expected HandlerError, got {other:?}"),
  }
}

#[tokio::test]
#[serial]
async fn failing_before_handler_prevents_on_and_after() {
  setup_tracing();
  let mut pipeline = Pipeline::<RestockContext, RestockError>::new(&[("commit", false, None)]);
  pipeline.before("commit", rejecting_handler("commit:before", "locked")).unwrap();
  pipeline.on("commit", recording_handler("commit:on", 5)).unwrap();
  pipeline.after("commit", recording_handler("commit:after", 5)).unwrap();

  let ctx = ContextData::new(RestockContext::for_sku("LAMP-01", 1));
  let err = pipeline.run(ctx.clone()).await.unwrap_err();

  assert_eq!(err, RestockError::Rejected("locked".to_string()));
  let guard = ctx.read();
  assert_eq!(guard.quantity, 1);
  assert_eq!(guard.steps_executed, vec!["commit:before"]);
}

#[tokio::test]
#[serial]
async fn optional_step_errors_still_abort() {
  setup_tracing();
  let mut pipeline = Pipeline::<RestockContext, RestockError>::new(&[
    ("notify_supplier", true, None),
    ("commit", false, None),
  ]);
  pipeline
    .on("notify_supplier", rejecting_handler("notify_supplier", "mail down"))
    .unwrap();
  pipeline.on("commit", recording_handler("commit", 1)).unwrap();

  let ctx = ContextData::new(RestockContext::default());
  assert!(pipeline.run(ctx.clone()).await.is_err());
  assert_eq!(ctx.read().steps_executed, vec!["notify_supplier"]);
}
