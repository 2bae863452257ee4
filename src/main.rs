use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use geoloc_init::{bootstrap, config::BootstrapConfig, db_mongo};

const SUCCESS_MESSAGE: &str = "Banco de dados inicializado com sucesso!";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = BootstrapConfig::from_env().context("Failed to load configuration")?;

    let client = db_mongo::create_client(&config.mongodb_uri, config.connect_timeout).await?;
    let report = bootstrap::run_bootstrap(&client, &config).await?;

    tracing::info!(
        credential = %report.credential,
        collection_created = report.collection_created,
        inserted = report.inserted,
        skipped = report.skipped,
        stored = report.verification.total,
        "Bootstrap finished"
    );

    println!("{}", SUCCESS_MESSAGE);
    Ok(())
}
