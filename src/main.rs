use tokio::sync::mpsc;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod coincap;
mod config;
mod format;
mod listing;
mod shell;
mod view;

use crate::coincap::client::MarketClient;
use crate::config::{read_config, Config};
use crate::shell::Session;

const DEFAULT_CONFIG_PATH: &str = "app_config.json";
const DEFAULT_LOG_FILTER: &str = "info,koin_cek=debug";

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // stdout belongs to the table
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = match read_config(&config_path).await {
        Ok(Some(config)) => config,
        Ok(None) => {
            warn!("Config file {} not found, using defaults", config_path);
            Config::default()
        }
        Err(error) => {
            error!("Error reading config file {}: {}", config_path, error);
            return;
        }
    };
    debug!("Loaded config: {:?}", config);

    let client = match MarketClient::new(&config.base_url) {
        Ok(client) => client,
        Err(error) => {
            error!("Cannot create HTTP client: {}", error);
            return;
        }
    };
    info!("Using CoinCap API at {}", client.base_url());

    let (outcome_sender, outcome_receiver) = mpsc::unbounded_channel();
    let mut session = Session::new(client, &config, outcome_sender);
    session.start();

    shell::run(session, outcome_receiver).await;
}
