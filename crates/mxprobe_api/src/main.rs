//! Email Deliverability Validation API Server
//!
//! HTTP front door for the mxprobe validation engine, built with axum and
//! tokio. One authenticated endpoint runs the full pipeline per request;
//! the process holds no state between requests.

use axum::Router;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use mxprobe_core::{ReferenceTables, ValidationPipeline};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api_handler;
mod auth;
mod config;
mod routes;

use config::{env_vars, AppConfig};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ValidationPipeline>,
    pub config: Arc<AppConfig>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;

    init_tracing(&config)?;

    info!(
        "Starting Email Deliverability Validation API v{}",
        env!("CARGO_PKG_VERSION")
    );

    let pipeline = ValidationPipeline::new(
        config.engine.to_engine_config(),
        ReferenceTables::builtin(),
    );

    let app_state = AppState {
        pipeline: Arc::new(pipeline),
        config: Arc::new(config.clone()),
    };

    let app = create_router(app_state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on {}", addr);
    info!("Status check available at http://{}/status", addr);
    info!("Validation API: http://{}/validate", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    routes::build_routes(Arc::new(state))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
                .allow_headers(tower_http::cors::Any),
        )
        .layer(CompressionLayer::new())
}

/// Load application configuration from environment and files
fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    // Optional config file
    if std::path::Path::new("Config.toml").exists() {
        figment = figment.merge(Toml::file("Config.toml"));
    }

    // Double underscore separates sections from keys with underscores.
    figment = figment.merge(Env::prefixed("MXPROBE_").split("__"));

    let mut config: AppConfig = figment.extract()?;

    // The key is the only secret and never passes through figment.
    config.security.api_key = std::env::var(env_vars::API_KEY)
        .map_err(|_| format!("{} must be set", env_vars::API_KEY))?;
    if config.security.api_key.is_empty() {
        return Err(format!("{} must not be empty", env_vars::API_KEY).into());
    }

    Ok(config)
}

/// Initialize tracing and logging
fn init_tracing(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.observability.log_level.clone().into());

    if config.observability.json_logs {
        // JSON format for production
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        // Human-readable format for development
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
