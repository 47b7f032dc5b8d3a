//! ED Rostering - Axum Server
//!
//! Run with: cargo run
//! Then open: http://localhost:7860

use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ed_rostering::api;
use ed_rostering::config::{RosterConfig, ServerConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ed_rostering=info,tower_http=info")),
        )
        .init();

    #[cfg(feature = "console")]
    ed_rostering::console::print_banner();

    let config = match RosterConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid roster configuration");
            std::process::exit(1);
        }
    };
    info!(
        rest_hours = config.rules.rest_hours_required,
        objective = ?config.objective.strategy,
        time_limit_secs = config.solver.time_limit_secs,
        "Roster configuration loaded"
    );

    let state = Arc::new(api::AppState::new(config));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = api::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let server = ServerConfig::from_env();
    let addr = server.server_address();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(address = %addr, error = %e, "Cannot bind server address");
            std::process::exit(1);
        }
    };
    info!("Server listening on http://{}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "Server error");
    }
}
