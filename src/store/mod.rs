//! Document-store collaborators.
//!
//! The collection loops hand finished records to a [`DocumentStore`] and move
//! on; a failed write is logged and counted, never retried, and never fails
//! the tick that produced it.

pub mod memory;

#[cfg(feature = "remote")]
pub mod http;

pub use memory::MemoryStore;

use serde_json::Value;

/// Collection path for periodic biometric samples.
pub fn periodic_collection(user_id: &str) -> String {
    format!("users/{user_id}/raw_periodic")
}

/// Collection path for audio events.
pub fn events_collection(user_id: &str) -> String {
    format!("users/{user_id}/raw_events")
}

/// A sink that durably stores records under collection paths.
pub trait DocumentStore: Send + Sync {
    /// Store a record.
    ///
    /// With `document_id` the write has overwrite semantics (last write wins
    /// on that identity); without it the store assigns a fresh identity and
    /// appends. Returns the identity the record was stored under.
    fn put(
        &self,
        collection: &str,
        document_id: Option<&str>,
        record: &Value,
    ) -> Result<String, StoreError>;
}

/// Document-store error types.
#[derive(Debug)]
pub enum StoreError {
    /// Configuration error
    Config(String),
    /// Network/HTTP error
    Network(String),
    /// Server returned an error response
    Server { status: u16, message: String },
    /// JSON serialization error
    Serialization(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Config(msg) => write!(f, "store config error: {msg}"),
            StoreError::Network(msg) => write!(f, "store network error: {msg}"),
            StoreError::Server { status, message } => {
                write!(f, "store server error ({status}): {message}")
            }
            StoreError::Serialization(msg) => write!(f, "store serialization error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}
