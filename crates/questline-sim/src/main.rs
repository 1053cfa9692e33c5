//! Questline sim entry point.

use std::error::Error;

use questline_core::repository::SystemClock;
use questline_sim::config::SimConfig;
use questline_sim::runner;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = SimConfig::from_env()?;
    tracing::info!(
        ticks = config.ticks,
        seed = config.seed,
        save_path = ?config.save_path,
        "Starting questline simulation"
    );

    let summary = runner::run(&config, &SystemClock).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
