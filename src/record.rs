//! Record types written to the document store.
//!
//! Field names are a wire contract with the downstream analysis backend and
//! must be preserved verbatim; renaming a field here breaks consumers that
//! subscribe to the raw collections.

use serde::{Deserialize, Serialize};

/// One periodic biometric sample, constructed fresh each tick and handed to
/// the store under a document id equal to the stringified timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodicSample {
    /// Collection instant (epoch ms)
    pub timestamp: i64,
    /// Average heart rate over the window (bpm)
    pub heart_rate_avg: u32,
    /// Minimum heart rate (bpm)
    pub heart_rate_min: u32,
    /// Maximum heart rate (bpm)
    pub heart_rate_max: u32,
    /// Heart-rate variability, SDNN (ms)
    pub hrv_sdnn: u32,
    /// Average respiratory rate (breaths/min)
    pub respiratory_rate_avg: u32,
    /// Movement detections in the window
    pub movement_count: u32,
    /// Whether the heart-rate fields were synthesized instead of measured
    pub is_fallback: bool,
}

impl PeriodicSample {
    /// Document id for this sample: the stringified timestamp, so repeated
    /// ticks never collide and writes are ordered by identity.
    pub fn document_id(&self) -> String {
        self.timestamp.to_string()
    }
}

/// Audio event category guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Laughter,
    Sigh,
    Unknown,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::Laughter => write!(f, "laughter"),
            EventType::Sigh => write!(f, "sigh"),
            EventType::Unknown => write!(f, "unknown"),
        }
    }
}

/// One audio event, real or injected.
///
/// An `Unknown` guess is never persisted by the real-event path; only the
/// dummy-injection path writes synthetic events, and those always carry a
/// real category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioEventSample {
    /// Event instant (epoch ms)
    pub timestamp: i64,
    /// Classified category
    pub event_type_guess: EventType,
    /// Sound level estimate (percentage of full scale)
    pub event_dbfs: i32,
    /// Event duration (ms)
    pub event_duration_ms: i32,
    /// Base64-encoded WAV of the capture window, absent for dummy events
    pub audio_base64: Option<String>,
    /// Whether this event was synthesized rather than captured
    pub is_fallback: bool,
}
