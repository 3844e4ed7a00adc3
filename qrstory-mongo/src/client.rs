use bson::doc;
use mongodb::{Client, Database};
use tracing::info;

/// Owned MongoDB client wrapper.
///
/// Constructed once at startup and handed to the stores; connection failures
/// surface here rather than on first use.
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Connect and verify the connection with a ping
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self, mongodb::error::Error> {
        info!(db_name, "connecting to MongoDB");

        // Bounded selection/connect timeouts so an unreachable server fails fast
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri).await?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await?;

        info!(db_name, "connected to MongoDB");

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// The configured database
    pub fn database(&self) -> Database {
        self.client.database(&self.db_name)
    }

    /// Get the raw MongoDB client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Cleanly close all connections (test teardown, graceful shutdown)
    pub async fn shutdown(self) {
        self.client.shutdown().await;
    }
}
