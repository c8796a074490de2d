mod auth;
mod config;
mod dashboard;
mod errors;
mod expiry;
mod routes;
mod source;
mod state;
mod submission;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::SessionStore;
use crate::config::Config;
use crate::routes::build_router;
use crate::source::SheetsClient;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting inspection API v{}", env!("CARGO_PKG_VERSION"));

    let credentials = config.load_credentials()?;
    info!("Loaded {} credential entries", credentials.len());

    let schemas = config.load_schemas()?;
    for schema in schemas.iter() {
        info!(
            "Kind {} → tab '{}' ({} date fields)",
            schema.kind,
            schema.tab,
            schema.date_fields.len()
        );
    }

    let source = SheetsClient::new(
        config.sheets_api_base.clone(),
        config.spreadsheet_id.clone(),
        config.sheets_api_token.clone(),
    )?;
    info!("Sheets client initialized ({})", config.sheets_api_base);
    info!(
        "Expiry horizon: {} days, {} accepted date formats",
        config.expiry.horizon_days,
        config.expiry.accepted_date_formats.iter().count()
    );

    let state = AppState {
        config: config.clone(),
        source: Arc::new(source),
        credentials: Arc::new(credentials),
        schemas: Arc::new(schemas),
        sessions: SessionStore::new(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS to the form frontend origin

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
