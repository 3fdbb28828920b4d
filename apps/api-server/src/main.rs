//! # Quill API Server
//!
//! Blog CMS backend: articles, categories, moderated comments, analytics,
//! site settings and an AI writing assistant over Actix-web.

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

mod background;
mod config;
mod handlers;
mod middleware;
mod observability;
mod state;
mod telemetry;

use config::AppConfig;
use observability::RequestIdMiddleware;
use state::AppState;
use telemetry::{TelemetryConfig, init_telemetry};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();
    let state = AppState::new(&config).await;

    #[cfg(feature = "scheduler")]
    let mut scheduler = background::scheduler::start(&state, &config).await?;
    #[cfg(not(feature = "scheduler"))]
    let sweeper = background::spawn_rate_limit_sweep(&state, std::time::Duration::from_secs(60));

    let (host, port) = config.bind_address();
    tracing::info!(host = %host, port, storage = state.storage, "Starting Quill API server");

    let app_state = state.clone();
    HttpServer::new(move || {
        let state = app_state.clone();
        App::new()
            .wrap(TracingLogger::default())
            .wrap(RequestIdMiddleware)
            .app_data(web::Data::new(state.clone()))
            .configure(|cfg| handlers::configure_routes(cfg, &state))
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;

    #[cfg(feature = "scheduler")]
    scheduler.shutdown().await?;
    #[cfg(not(feature = "scheduler"))]
    sweeper.abort();

    tracing::info!("Server stopped");
    Ok(())
}
