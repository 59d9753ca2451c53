//! Moodwatch Sensor Agent - wearable companion data collector.
//!
//! This library implements the data-collection side of the Moodwatch
//! companion: two independent periodic loops that sample biometric and
//! audio-derived signals and push them to a remote document store.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   Moodwatch Sensor Agent                     │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌────────┐   ┌─────────────┐                 ┌───────────┐  │
//! │  │ Ticker │──▶│   Sampler   │────────────────▶│           │  │
//! │  └────────┘   │ (real/fall- │  raw_periodic   │ Document  │  │
//! │               │  back bpm)  │                 │   Store   │  │
//! │  ┌────────┐   ┌─────────────┐   ┌──────────┐  │           │  │
//! │  │ Ticker │──▶│  Capture +  │──▶│  Dummy   │─▶│           │  │
//! │  └────────┘   │  Classify   │   │ Injector │  └───────────┘  │
//! │               └─────────────┘   └──────────┘    raw_events   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use moodwatch_sensor_agent::{
//!     clock::SystemClock,
//!     sensor::NoopSensor,
//!     service::{PeriodicService, PeriodicServiceConfig},
//!     store::MemoryStore,
//!     transparency::create_shared_log,
//! };
//!
//! let store = Arc::new(MemoryStore::new());
//! let service = PeriodicService::start(
//!     PeriodicServiceConfig::default(),
//!     Arc::new(NoopSensor),
//!     store,
//!     create_shared_log(),
//!     Arc::new(SystemClock),
//! );
//! ```

pub mod audio;
pub mod capability;
pub mod clock;
pub mod config;
pub mod injector;
pub mod record;
pub mod sampler;
pub mod sensor;
pub mod service;
pub mod store;
pub mod ticker;
pub mod transparency;

// Re-export key types at crate root for convenience
pub use capability::Capability;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, SourceConfig};
pub use injector::DummyEventInjector;
pub use record::{AudioEventSample, EventType, PeriodicSample};
pub use sampler::PeriodicSampler;
pub use sensor::{HeartRateSource, NoopSensor, SimulatedSensor};
pub use store::{events_collection, periodic_collection, DocumentStore, MemoryStore, StoreError};
pub use ticker::Ticker;
pub use transparency::{SharedTransparencyLog, TransparencyLog, TransparencyStats};

// Remote store re-exports (when enabled)
#[cfg(feature = "remote")]
pub use store::http::{BlockingDocumentStore, HttpDocumentStore, StoreConfig};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Collection declaration that can be displayed to users.
pub const DATA_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║          MOODWATCH SENSOR AGENT - COLLECTION DECLARATION         ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This agent collects wellbeing signals for mood analysis.        ║
║                                                                  ║
║  ✓ WHAT WE COLLECT:                                              ║
║    • Heart-rate summaries once per minute (avg/min/max, HRV)     ║
║    • Respiratory rate and movement counts                        ║
║    • Short audio level summaries (laughter / sigh detection)     ║
║                                                                  ║
║  ✗ WHAT WE NEVER COLLECT:                                        ║
║    • Continuous audio (only ~2 second classification windows)    ║
║    • Speech content or transcripts                               ║
║    • Location of any kind                                        ║
║                                                                  ║
║  When a live sensor is unavailable, clearly-marked fallback      ║
║  values are substituted (is_fallback = true) so the downstream   ║
║  pipeline keeps flowing.                                         ║
║                                                                  ║
║  You can view collection statistics anytime with:                ║
║    moodwatch-sensor status                                       ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_declaration_contents() {
        assert!(DATA_DECLARATION.contains("COLLECTION DECLARATION"));
        assert!(DATA_DECLARATION.contains("NEVER COLLECT"));
        assert!(DATA_DECLARATION.contains("is_fallback"));
    }
}
