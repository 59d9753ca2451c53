//! Remote document-store client.
//!
//! Talks to the Moodwatch ingestion endpoint, a thin HTTP facade over the
//! cloud document database. Writes with an explicit document id use PUT
//! (last-write-wins on that identity); writes without one use POST and the
//! server assigns and returns a fresh id.

use crate::store::{DocumentStore, StoreError};
use serde::Deserialize;
use serde_json::Value;

/// Remote store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL of the ingestion endpoint, e.g. `https://ingest.example.com`
    pub base_url: String,
    /// Bearer authentication token
    pub token: String,
}

impl StoreConfig {
    /// Create a new store configuration.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// URL of a collection (POST target for auto-id writes).
    pub fn collection_url(&self, collection: &str) -> String {
        format!("{}/v1/{collection}", self.base_url)
    }

    /// URL of a single document (PUT target for identified writes).
    pub fn document_url(&self, collection: &str, document_id: &str) -> String {
        format!("{}/v1/{collection}/{document_id}", self.base_url)
    }

    /// Health check endpoint URL.
    pub fn health_url(&self) -> String {
        format!("{}/health", self.base_url)
    }
}

/// Server response to an auto-id write.
#[derive(Debug, Clone, Deserialize)]
struct PutResponse {
    id: String,
}

/// Async client for the remote document store.
pub struct HttpDocumentStore {
    config: StoreConfig,
    client: reqwest::Client,
    device_id: String,
}

impl HttpDocumentStore {
    /// Create a new client.
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| StoreError::Config(format!("failed to create HTTP client: {e}")))?;

        // Device ID from hostname + instance
        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        let device_id = format!(
            "sensor-{}-{}",
            hostname,
            &uuid::Uuid::new_v4().to_string()[..8]
        );

        Ok(Self {
            config,
            client,
            device_id,
        })
    }

    /// Test connection to the store.
    pub async fn test_connection(&self) -> Result<bool, StoreError> {
        let response = self
            .client
            .get(self.config.health_url())
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }

    /// Store a record, assigning or overwriting the document identity.
    pub async fn put_document(
        &self,
        collection: &str,
        document_id: Option<&str>,
        record: &Value,
    ) -> Result<String, StoreError> {
        let request = match document_id {
            Some(id) => self.client.put(self.config.document_url(collection, id)),
            None => self.client.post(self.config.collection_url(collection)),
        };

        let response = request
            .header("Authorization", format!("Bearer {}", self.config.token))
            .header("X-Device-Id", &self.device_id)
            .json(record)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(StoreError::Server {
                status: status.as_u16(),
                message,
            });
        }

        match document_id {
            Some(id) => Ok(id.to_string()),
            None => {
                let assigned: PutResponse = response
                    .json()
                    .await
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(assigned.id)
            }
        }
    }

    /// Get the device ID.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }
}

/// Blocking client for use from the tick threads.
pub struct BlockingDocumentStore {
    inner: HttpDocumentStore,
    runtime: tokio::runtime::Runtime,
}

impl BlockingDocumentStore {
    /// Create a new blocking client.
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StoreError::Config(format!("failed to create runtime: {e}")))?;

        Ok(Self {
            inner: HttpDocumentStore::new(config)?,
            runtime,
        })
    }

    /// Test connection to the store.
    pub fn test_connection(&self) -> Result<bool, StoreError> {
        self.runtime.block_on(self.inner.test_connection())
    }

    /// Get the device ID.
    pub fn device_id(&self) -> &str {
        self.inner.device_id()
    }
}

impl DocumentStore for BlockingDocumentStore {
    fn put(
        &self,
        collection: &str,
        document_id: Option<&str>,
        record: &Value,
    ) -> Result<String, StoreError> {
        self.runtime
            .block_on(self.inner.put_document(collection, document_id, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_config_urls() {
        let config = StoreConfig::new("https://ingest.example.com", "test-token");
        assert_eq!(
            config.collection_url("users/u/raw_events"),
            "https://ingest.example.com/v1/users/u/raw_events"
        );
        assert_eq!(
            config.document_url("users/u/raw_periodic", "1700000000000"),
            "https://ingest.example.com/v1/users/u/raw_periodic/1700000000000"
        );
        assert_eq!(config.health_url(), "https://ingest.example.com/health");
    }

    #[test]
    fn test_store_config_trims_trailing_slash() {
        let config = StoreConfig::new("https://ingest.example.com/", "t");
        assert_eq!(config.health_url(), "https://ingest.example.com/health");
    }

    #[test]
    fn test_device_id_shape() {
        let store =
            HttpDocumentStore::new(StoreConfig::new("http://127.0.0.1:9999", "t")).unwrap();
        assert!(store.device_id().starts_with("sensor-"));
    }
}
