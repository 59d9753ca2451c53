//! Transparency log tracking what the agent has written.
//!
//! Plain counters, no record content: enough for a user to audit how much
//! data left the device and how much of it was fallback.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Transparency statistics for the current session.
#[derive(Debug)]
pub struct TransparencyLog {
    /// Periodic samples written to the store
    periodic_samples: AtomicU64,
    /// Real (captured) audio events written
    real_events: AtomicU64,
    /// Synthetic (injected) audio events written
    dummy_events: AtomicU64,
    /// Audio ticks that produced no write
    ticks_skipped: AtomicU64,
    /// Store writes that failed
    write_failures: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl TransparencyLog {
    /// Create a new transparency log.
    pub fn new() -> Self {
        Self {
            periodic_samples: AtomicU64::new(0),
            real_events: AtomicU64::new(0),
            dummy_events: AtomicU64::new(0),
            ticks_skipped: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a transparency log with persistence.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        // Try to load existing stats
        if let Err(e) = log.load() {
            tracing::debug!("no previous transparency stats loaded: {e}");
        }

        log
    }

    /// Record a stored periodic sample.
    pub fn record_periodic_sample(&self) {
        self.periodic_samples.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a stored real audio event.
    pub fn record_real_event(&self) {
        self.real_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a stored dummy audio event.
    pub fn record_dummy_event(&self) {
        self.dummy_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an audio tick that produced no write.
    pub fn record_tick_skipped(&self) {
        self.ticks_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed store write.
    pub fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> TransparencyStats {
        TransparencyStats {
            periodic_samples: self.periodic_samples.load(Ordering::Relaxed),
            real_events: self.real_events.load(Ordering::Relaxed),
            dummy_events: self.dummy_events.load(Ordering::Relaxed),
            ticks_skipped: self.ticks_skipped.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds() as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Periodic samples stored: {}\n\
             - Real audio events stored: {}\n\
             - Dummy audio events injected: {}\n\
             - Audio ticks without a write: {}\n\
             - Failed store writes: {}\n\
             - Session duration: {} seconds",
            stats.periodic_samples,
            stats.real_events,
            stats.dummy_events,
            stats.ticks_skipped,
            stats.write_failures,
            stats.session_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            // Ensure parent directory exists
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                periodic_samples: stats.periodic_samples,
                real_events: stats.real_events,
                dummy_events: stats.dummy_events,
                ticks_skipped: stats.ticks_skipped,
                write_failures: stats.write_failures,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;

            std::fs::write(path, json)?;
        }
        Ok(())
    }

    /// Load stats from disk.
    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.periodic_samples
                    .store(persisted.periodic_samples, Ordering::Relaxed);
                self.real_events
                    .store(persisted.real_events, Ordering::Relaxed);
                self.dummy_events
                    .store(persisted.dummy_events, Ordering::Relaxed);
                self.ticks_skipped
                    .store(persisted.ticks_skipped, Ordering::Relaxed);
                self.write_failures
                    .store(persisted.write_failures, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.periodic_samples.store(0, Ordering::Relaxed);
        self.real_events.store(0, Ordering::Relaxed);
        self.dummy_events.store(0, Ordering::Relaxed);
        self.ticks_skipped.store(0, Ordering::Relaxed);
        self.write_failures.store(0, Ordering::Relaxed);
    }
}

impl Default for TransparencyLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of transparency statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransparencyStats {
    pub periodic_samples: u64,
    pub real_events: u64,
    pub dummy_events: u64,
    pub ticks_skipped: u64,
    pub write_failures: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    periodic_samples: u64,
    real_events: u64,
    dummy_events: u64,
    ticks_skipped: u64,
    write_failures: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared transparency log.
pub type SharedTransparencyLog = Arc<TransparencyLog>;

/// Create a new shared transparency log.
pub fn create_shared_log() -> SharedTransparencyLog {
    Arc::new(TransparencyLog::new())
}

/// Create a new shared transparency log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedTransparencyLog {
    Arc::new(TransparencyLog::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transparency_log_counting() {
        let log = TransparencyLog::new();

        log.record_periodic_sample();
        log.record_periodic_sample();
        log.record_real_event();
        log.record_dummy_event();
        log.record_tick_skipped();
        log.record_write_failure();

        let stats = log.stats();
        assert_eq!(stats.periodic_samples, 2);
        assert_eq!(stats.real_events, 1);
        assert_eq!(stats.dummy_events, 1);
        assert_eq!(stats.ticks_skipped, 1);
        assert_eq!(stats.write_failures, 1);
    }

    #[test]
    fn test_transparency_log_reset() {
        let log = TransparencyLog::new();

        log.record_periodic_sample();
        log.record_dummy_event();
        log.reset();

        let stats = log.stats();
        assert_eq!(stats.periodic_samples, 0);
        assert_eq!(stats.dummy_events, 0);
    }

    #[test]
    fn test_summary_format() {
        let log = TransparencyLog::new();
        let summary = log.summary();

        assert!(summary.contains("Periodic samples stored"));
        assert!(summary.contains("Dummy audio events injected"));
        assert!(summary.contains("Failed store writes"));
    }
}
