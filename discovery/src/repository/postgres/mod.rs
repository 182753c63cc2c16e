use log::{debug, error};
use tokio_postgres::{Client, NoTls};

use crate::config::DatabaseConfiguration;
use crate::error::DiscoveryError;

pub mod postgres_patent_repo;
pub mod schema;

/// Opens a connection and drives it on a background task
///
/// # Errors
/// If the database cannot be reached or refuses the credentials
pub async fn connect(config: &DatabaseConfiguration) -> Result<Client, DiscoveryError> {
    debug!(
        "Connecting to postgres at {}:{}/{} as {}",
        config.host, config.port, config.name, config.user
    );

    let (client, connection) = tokio_postgres::connect(&config.connection_string(), NoTls)
        .await
        .map_err(|e| DiscoveryError::Connection(e.to_string()))?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!("Database connection error: {e}");
        }
    });
    Ok(client)
}
