use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use blobnav::cli::Args;
use blobnav::config::load_config;
use blobnav::error::Result;
use blobnav::storage::OpenDalConnector;
use blobnav::web::{self, AppState};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing();

    if let Err(e) = run_app(args).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run_app(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    log::info!(
        "starting blobnav version={} provider={} root_prefix={:?}",
        env!("CARGO_PKG_VERSION"),
        config.provider,
        config.browser.root_prefix
    );

    let connector = OpenDalConnector::new(config.provider, config.endpoint.clone());
    let state = AppState::new(config.browser, Arc::new(connector));
    web::serve(web::router(state), config.server).await
}

/// Installs the fmt subscriber; `log` records are bridged through `tracing-log`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
