//! Assistant Relay server binary.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use assistant_relay::assistant::HostedAssistantGateway;
use assistant_relay::config::AppConfig;
use assistant_relay::directory::CredentialDirectory;
use assistant_relay::runs::RunCoordinator;
use assistant_relay::{AppState, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (M-LOG-STRUCTURED)
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // Load .env (if present)
    let _ = dotenv();

    let config = match AppConfig::load() {
        Ok(c) => Arc::new(c),
        Err(msg) => {
            eprintln!("Configuration error: {msg}");
            std::process::exit(1);
        }
    };

    // A missing or malformed credentials file is startup-fatal.
    let directory = Arc::new(CredentialDirectory::load(&config.credentials.path)?);

    info!(
        name: "gateway.config.loaded",
        base_url = %config.gateway.base_url,
        poll_interval_ms = config.gateway.poll_interval_ms,
        "Gateway configuration loaded"
    );

    let gateway = Arc::new(HostedAssistantGateway::new(config.gateway.base_url.as_str()));
    let coordinator = Arc::new(RunCoordinator::new(
        gateway.clone(),
        Duration::from_millis(config.gateway.poll_interval_ms),
    ));

    let state = AppState {
        directory,
        gateway,
        coordinator,
        config: config.clone(),
    };

    server::start_server(config, state).await
}
