//! # FormGuard - contact form gatekeeper
//!
//! Decides whether a contact-form submission may be forwarded to the mail
//! relay: honeypot, timing, rate limit and behavioral checks, field
//! validation, sanitization, then delivery.
//!
//! ## Architecture
//! ```text
//! Browser form → FormGuard → Mail relay (EmailJS)
//!                    ↓
//!            History store (memory | Redis)
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod captcha;
mod config;
mod contact;
mod guard;
mod history;
mod relay;
mod routes;
mod session;
mod state;

use config::AppConfig;
use session::session_purge_worker;
use state::AppState;

/// How often stale form sessions are purged
const SESSION_PURGE_INTERVAL_SECS: u64 = 60;

/// FormGuard - contact form gatekeeper
#[derive(Parser, Debug)]
#[command(name = "formguard")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/formguard.toml")]
    config: String,

    /// Redis URL for submission history (enables the Redis backend)
    #[arg(long, env = "REDIS_URL")]
    redis_url: Option<String>,

    /// Listen address (overrides config)
    #[arg(short, long, env = "LISTEN_ADDR")]
    listen: Option<String>,

    /// Mail relay service id
    #[arg(long, env = "FORMGUARD_SERVICE_ID")]
    service_id: Option<String>,

    /// Mail relay template id
    #[arg(long, env = "FORMGUARD_TEMPLATE_ID")]
    template_id: Option<String>,

    /// Mail relay public key
    #[arg(long, env = "FORMGUARD_PUBLIC_KEY")]
    public_key: Option<String>,

    /// Expose the debug panel
    #[arg(long, env = "FORMGUARD_DEBUG")]
    debug: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, default_value = "false")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up a local .env before reading env-backed arguments
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level, args.json_logs)?;

    info!("Starting FormGuard v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::load(&args.config, &args)?;
    info!(
        history = ?config.history.backend,
        debug = config.debug,
        "Configuration loaded from {}",
        args.config
    );

    // Create shutdown broadcast channel
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    // Initialize application state
    let listen_addr = config.listen_addr.clone();
    let state = AppState::new(config).await?;

    // Spawn stale session purge worker
    let sessions = state.sessions.clone();
    let purge_shutdown = shutdown_tx.subscribe();
    tokio::spawn(async move {
        session_purge_worker(sessions, SESSION_PURGE_INTERVAL_SECS, purge_shutdown).await;
    });

    // Build router
    let app = routes::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    info!("FormGuard listening on {}", listen_addr);

    // Handle graceful shutdown
    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        }
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context("Server error")?;

    info!("FormGuard shutdown complete");
    Ok(())
}

/// Initialize structured logging with tracing
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .init();
    }

    Ok(())
}
