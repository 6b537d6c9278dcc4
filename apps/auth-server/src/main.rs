//! # GymGate Auth Server
//!
//! The main entry point for the Actix-web HTTP server.

use actix_web::{App, HttpServer, middleware::from_fn, web};
use anyhow::Context;
use tracing_actix_web::TracingLogger;

use auth_server::config::AppConfig;
use auth_server::handlers;
use auth_server::middleware::auth::AuthenticationMiddleware;
use auth_server::observability::assign_request_id;
use auth_server::state::AppState;
use auth_server::telemetry::{TelemetryConfig, init_telemetry};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_telemetry(&TelemetryConfig::from_env()).context("Failed to initialise logging")?;

    let config = AppConfig::from_env().context("Invalid configuration")?;

    tracing::info!(
        host = %config.host,
        port = config.port,
        "Starting GymGate auth server"
    );

    let state = AppState::build(&config).await?;

    // Actix applies `wrap` in reverse, so the last one added runs first.
    HttpServer::new(move || {
        let routes_state = state.clone();
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(move |cfg| handlers::configure_routes(cfg, &routes_state))
            .wrap(AuthenticationMiddleware::new(state.authenticator.clone()))
            .wrap(from_fn(assign_request_id))
            .wrap(TracingLogger::default())
    })
    .bind((config.host.as_str(), config.port))
    .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?
    .run()
    .await
    .context("Server terminated with an error")
}
