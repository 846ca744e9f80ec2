// Main entry point for grayscale-server.
// Parses configuration, sets up logging, builds the Axum router and serves it
// until Ctrl-C / SIGTERM.

mod config;
mod conversion;
mod relay;
mod shutdown_signal;
#[cfg(test)]
mod test_prelude;
mod web;

use clap::Parser;
use config::{DEFAULT_MAX_BODY_BYTES, DEFAULT_UPLOAD_DIR, ServiceConfig};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::Level;
use web::AppState;

/// Command line arguments for grayscale-server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct AppConfig {
    /// Hostname/IP to bind the server to.
    /// If this option is specified without value, it will default to "*", meaning the server will listen on all interfaces.
    #[arg(long, env = "GRAYSCALE_SERVER_HOST", default_value = "localhost", num_args = 0..=1, default_missing_value = "*")]
    host: String,

    /// Port number to listen on.
    #[arg(short, long, env = "GRAYSCALE_SERVER_PORT", default_value_t = 8000)]
    port: u16,

    /// Largest accepted request body in bytes. Larger uploads get 413.
    #[arg(long, env = "GRAYSCALE_SERVER_MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    max_body_bytes: usize,

    /// Also save every converted image into --upload-dir.
    #[arg(long, env = "GRAYSCALE_SERVER_PERSIST_CONVERTED", action = clap::ArgAction::SetTrue)]
    persist_converted: bool,

    /// Directory converted images are saved to when --persist-converted is set.
    #[arg(long, env = "GRAYSCALE_SERVER_UPLOAD_DIR", default_value = DEFAULT_UPLOAD_DIR)]
    upload_dir: PathBuf,

    /// Base URL the /test_curl relay sends its PUT to, e.g. "http://localhost:8000".
    /// Defaults to the Host of the incoming request.
    #[arg(long, env = "GRAYSCALE_SERVER_RELAY_BASE_URL")]
    relay_base_url: Option<String>,

    /// Timeout in seconds for the relay's outbound request.
    #[arg(long, env = "GRAYSCALE_SERVER_RELAY_TIMEOUT_SECS", default_value_t = 30)]
    relay_timeout_secs: u64,

    /// Log at DEBUG instead of INFO.
    #[arg(short, long, env = "GRAYSCALE_SERVER_VERBOSE", action = clap::ArgAction::SetTrue)]
    verbose: bool,
}

impl From<&AppConfig> for ServiceConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_body_bytes: config.max_body_bytes,
            persist_converted: config.persist_converted,
            upload_dir: config.upload_dir.clone(),
            relay_base_url: config.relay_base_url.clone(),
            relay_timeout: Duration::from_secs(config.relay_timeout_secs),
            ..ServiceConfig::default()
        }
    }
}

#[tokio::main]
async fn main() {
    // Parse command line args and environment variables
    let config = AppConfig::parse();

    // Initialize tracing subscriber for structured logging.
    tracing_subscriber::fmt()
        .with_max_level(if config.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(true) // Include module path in logs
        .with_file(true) // Include source file name
        .with_line_number(true) // Include line numbers
        .init();

    tracing::info!("Starting grayscale-server...");

    let service_config = ServiceConfig::from(&config);
    tracing::info!(
        "Allowed extensions: {}; max body size: {} bytes",
        service_config.allowed_extensions,
        service_config.max_body_bytes
    );
    if service_config.persist_converted {
        tracing::info!(
            "Converted images will be saved to {}",
            service_config.upload_dir.display()
        );
    }

    let state = match AppState::new(service_config) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            tracing::error!("FATAL: Failed to initialize application state: {}", e);
            eprintln!("FATAL: Initialization failed. Error: {}. Exiting.", e);
            std::process::exit(1);
        }
    };

    let app = web::create_app(state);
    tracing::info!("Axum router configured.");

    // --- Start HTTP Server ---
    let listener = match web::create_listener(&config.host, config.port).await {
        Ok((addr, l)) => {
            tracing::info!("Server successfully bound. Listening on {}", addr);
            l
        }
        Err(e) => {
            tracing::error!("FATAL: Failed to bind server: {}", e);
            eprintln!("FATAL: Could not bind server. Error: {}. Exiting.", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal::shutdown_signal())
        .await
    {
        tracing::error!("Server run error: {}", e);
        eprintln!("ERROR: Server shut down unexpectedly. Error: {}", e);
    }

    tracing::info!("grayscale-server has shut down.");
}
