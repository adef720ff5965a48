// app/src/main.rs

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing_actix_web::TracingLogger;

use stockroom::config::AppConfig;
use stockroom::web::configure_app_routes;
use stockroom::{build_state, init_tracing};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  let config = AppConfig::from_env().context("loading configuration")?;
  init_tracing(config.log_format);
  tracing::info!("Starting stockroom server...");

  let bind_address = config.bind_address();
  let app_state = build_state(config).await.context("initialising application state")?;

  tracing::info!(address = %bind_address, "Binding HTTP server.");
  HttpServer::new(move || {
    App::new()
      .app_data(web::Data::new(app_state.clone()))
      .wrap(TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&bind_address)
  .with_context(|| format!("binding {}", bind_address))?
  .run()
  .await
  .context("running HTTP server")?;

  tracing::info!("Server stopped.");
  Ok(())
}
