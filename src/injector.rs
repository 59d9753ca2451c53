//! Synthetic-event injection bounding the gap between persisted events.
//!
//! The downstream consumer must never see more than `dummy_interval` without
//! *some* event, so a silent stretch eventually produces a clearly-marked
//! placeholder. The last-real-event marker lives in this struct, not in
//! ambient process state, so tests can drive it with an explicit clock.

use crate::record::{AudioEventSample, EventType};
use rand::Rng;
use std::time::Duration;

/// Level reported for injected events.
const DUMMY_DBFS: i32 = 70;
/// Duration reported for injected events (ms).
const DUMMY_DURATION_MS: i32 = 2_000;

/// Tracks time since the last accepted event and synthesizes placeholders.
#[derive(Debug)]
pub struct DummyEventInjector {
    last_event_ms: i64,
    dummy_interval_ms: i64,
}

impl DummyEventInjector {
    /// Create an injector. The marker starts at epoch 0, so a fresh process
    /// that hears nothing injects on its first tick.
    pub fn new(dummy_interval: Duration) -> Self {
        Self {
            last_event_ms: 0,
            dummy_interval_ms: dummy_interval.as_millis() as i64,
        }
    }

    /// Record that a real event was accepted at `now_ms`.
    ///
    /// The marker advances whether or not the store write succeeded; write
    /// failures are not retried and must not cause an injection storm.
    pub fn observe_real_event(&mut self, now_ms: i64) {
        self.last_event_ms = now_ms;
    }

    /// Whether a silent/unknown tick at `now_ms` should inject. The bound is
    /// strict: a tick at exactly `last + interval` does not inject.
    pub fn should_inject(&self, now_ms: i64) -> bool {
        now_ms - self.last_event_ms > self.dummy_interval_ms
    }

    /// Build the synthetic event for `now_ms` and advance the marker.
    pub fn synthesize<R: Rng>(&mut self, now_ms: i64, rng: &mut R) -> AudioEventSample {
        let event_type = if rng.gen_range(0..=1) == 0 {
            EventType::Laughter
        } else {
            EventType::Sigh
        };

        self.last_event_ms = now_ms;

        AudioEventSample {
            timestamp: now_ms,
            event_type_guess: event_type,
            event_dbfs: DUMMY_DBFS,
            event_duration_ms: DUMMY_DURATION_MS,
            audio_base64: None,
            is_fallback: true,
        }
    }

    /// Epoch-ms instant of the last accepted or injected event.
    pub fn last_event_ms(&self) -> i64 {
        self.last_event_ms
    }
}
