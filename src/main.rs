//! Chatrelay host: loads the configuration, starts the relay and feeds
//! standard input into every console endpoint until shut down.

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{debug, error, info, warn};

use chatrelay::config::{env::get_config_path, load_and_validate};
use chatrelay::endpoint::console::{CONSOLE_ENDPOINT_TYPE, CONSOLE_SENDER};
use chatrelay::endpoint::{MESSAGE_TEXT, SENDER_NAME};
use chatrelay::{Message, Relay, RoutingGraph};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Chatrelay v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let config = load_and_validate(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!("Please ensure {} exists and is properly formatted.", config_path);
        e
    })?;

    info!("Configuration loaded successfully");
    info!("  Endpoints: {}", config.endpoints.len());
    info!("  Links: {}", config.links.len());
    info!("  Repeatable filters: {}", config.repeatable_filters.len());
    info!("  Cycle floor: {}ms", config.distributor.cycle_floor_ms);

    // Start the relay
    let relay = Relay::start(&config)?;
    relay.report_pending();

    // Feed standard input into console endpoints
    let console_handle = tokio::spawn(forward_console(
        relay.graph().clone(),
        relay.publisher(),
    ));

    // Wait for shutdown signal
    shutdown_signal().await;

    info!("Shutting down...");
    console_handle.abort();
    relay.shutdown();
    info!("Goodbye!");

    Ok(())
}

/// Publish each line of standard input as a message from every console endpoint.
async fn forward_console(graph: Arc<RoutingGraph>, publisher: chatrelay::Publisher) {
    let consoles: Vec<String> = graph
        .endpoints()
        .into_iter()
        .filter(|endpoint| endpoint.type_tag() == CONSOLE_ENDPOINT_TYPE)
        .map(|endpoint| endpoint.name().to_string())
        .collect();
    if consoles.is_empty() {
        debug!("No console endpoints, not reading standard input");
        return;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim_end().to_string();
                if line.is_empty() {
                    continue;
                }
                for console in &consoles {
                    let message = Message::new(console.as_str(), line.as_str())
                        .with_field(SENDER_NAME, CONSOLE_SENDER)
                        .with_field(MESSAGE_TEXT, line.as_str());
                    if !publisher.publish(message) {
                        return;
                    }
                }
            }
            Ok(None) => {
                debug!("Standard input closed");
                return;
            }
            Err(e) => {
                warn!("Failed to read standard input: {}", e);
                return;
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
