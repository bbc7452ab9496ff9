//! marksheet-server - REST API server binary.

use std::net::SocketAddr;

use marksheet_core::{MarksheetConfig, MarksheetPipeline};
use marksheet_llm::LlmFactory;
use marksheet_server::{create_server, create_server_with_auth, AppState};
use tokio::signal;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::from_default_env()
        .add_directive(Level::INFO.into())
        .add_directive("marksheet_server=debug".parse()?);

    let json = std::env::var("MARKSHEET_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }
    Ok(())
}

fn load_config() -> Result<MarksheetConfig, Box<dyn std::error::Error>> {
    let config = match std::env::var("MARKSHEET_CONFIG") {
        Ok(path) => {
            info!("Loading configuration from {}", path);
            MarksheetConfig::from_file(&path)?.with_env_overrides()?
        }
        Err(_) => MarksheetConfig::from_env()?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing()?;

    let host = std::env::var("MARKSHEET_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("MARKSHEET_PORT")
        .unwrap_or_else(|_| "8000".to_string())
        .parse()
        .map_err(|_| "MARKSHEET_PORT must be a valid port number")?;
    let require_auth = std::env::var("MARKSHEET_REQUIRE_AUTH").is_ok();

    let config = load_config()?;

    // A missing key leaves the service up; extraction requests then report 503
    let llm = match LlmFactory::from_config(&config.llm) {
        Ok(llm) => Some(llm),
        Err(e) => {
            warn!(provider = %config.llm.provider, "Model unavailable: {}", e);
            None
        }
    };

    let pipeline = MarksheetPipeline::from_config(&config, llm);
    let state = AppState::new(pipeline, config);

    // Create server with or without auth
    let app = if require_auth {
        info!("Authentication enabled");
        create_server_with_auth(state)
    } else {
        info!("Authentication disabled");
        create_server(state)
    };

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting marksheet-server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            info!("Shutdown signal received, draining requests...");
        })
        .await?;

    info!("Server stopped cleanly");
    Ok(())
}
