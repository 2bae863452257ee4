pub mod models;
pub mod queries;

use anyhow::{Context, Result};
use mongodb::{Client, Database, options::ClientOptions};
use std::time::Duration;

const APP_NAME: &str = "geoloc-init";

/// Connect with an administrative URI and make sure the server answers.
///
/// `timeout` bounds server selection, so a database container that is still
/// starting fails the run instead of hanging it.
pub async fn create_client(uri: &str, timeout: Duration) -> Result<Client> {
    let mut options = ClientOptions::parse(uri)
        .await
        .context("Invalid MongoDB connection string")?;
    options.app_name = Some(APP_NAME.to_string());
    options.server_selection_timeout = Some(timeout);
    options.connect_timeout = Some(timeout);

    let client = Client::with_options(options).context("Failed to build MongoDB client")?;

    client
        .database("admin")
        .run_command(mongodb::bson::doc! {"ping": 1})
        .await
        .context("Failed to ping MongoDB")?;

    tracing::info!(timeout_secs = timeout.as_secs(), "Connected to MongoDB");
    Ok(client)
}

pub fn get_database(client: &Client, db_name: &str) -> Database {
    client.database(db_name)
}
