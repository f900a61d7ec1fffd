use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use lcd_stake_exporter::config::Config;
use lcd_stake_exporter::lcd::LcdClient;
use lcd_stake_exporter::server::{self, AppState};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path)?;

    // RUST_LOG overrides the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));
    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    tracing::info!(
        chains = config.chains.len(),
        wallets = config.chains.iter().map(|c| c.wallets.len()).sum::<usize>(),
        applications = config.chains.iter().map(|c| c.applications.len()).sum::<usize>(),
        suppliers = config.chains.iter().map(|c| c.suppliers.len()).sum::<usize>(),
        "Configuration loaded from {}",
        config_path
    );

    let lcd = Arc::new(LcdClient::new(Duration::from_secs(config.timeout_secs))?);
    let shutdown = CancellationToken::new();
    let state = Arc::new(AppState::new(lcd, config.chains, shutdown.clone()));

    let listen_address = config.listen_address.clone();
    let mut server_task = tokio::spawn(async move { server::serve(state, &listen_address).await });

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("Shutdown signal received, stopping exporter...");
        }
        result = &mut server_task => {
            return result.map_err(|e| eyre::eyre!("Metrics server task panicked: {}", e))?;
        }
    }

    shutdown.cancel();
    server_task
        .await
        .map_err(|e| eyre::eyre!("Metrics server task panicked: {}", e))??;

    tracing::info!("Exporter stopped");
    Ok(())
}
