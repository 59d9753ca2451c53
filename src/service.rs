//! Collection services: the periodic biometric loop and the audio event loop.
//!
//! Each service owns one [`Ticker`] thread. The two loops share nothing but
//! the store they write to, so each tick body is single-threaded and the
//! last-event marker needs no locking. The per-tick logic lives in free
//! functions over injected clock/rng/store so tests can drive a tick without
//! threads or sleeping.

use crate::audio::{analyze, classify, AudioSource, SilencePolicy};
use crate::clock::Clock;
use crate::injector::DummyEventInjector;
use crate::record::{AudioEventSample, EventType};
use crate::sampler::PeriodicSampler;
use crate::sensor::HeartRateSource;
use crate::store::{events_collection, periodic_collection, DocumentStore};
use crate::ticker::Ticker;
use crate::transparency::{SharedTransparencyLog, TransparencyLog};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Configuration for the periodic biometric loop.
#[derive(Debug, Clone)]
pub struct PeriodicServiceConfig {
    /// Interval between sampling ticks
    pub interval: Duration,
    /// How long the first tick may wait for an initial live reading
    /// (0 = fall back immediately)
    pub sensor_warmup: Duration,
    /// Owning user identity for collection paths
    pub user_id: String,
    /// Random seed (None = entropy)
    pub seed: Option<u64>,
}

impl Default for PeriodicServiceConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(60_000),
            sensor_warmup: Duration::ZERO,
            user_id: "testUser".to_string(),
            seed: None,
        }
    }
}

/// Configuration for the audio event loop.
#[derive(Debug, Clone)]
pub struct AudioServiceConfig {
    /// Interval between capture ticks
    pub interval: Duration,
    /// Length of each capture window
    pub capture_window: Duration,
    /// Maximum gap without a persisted event before a dummy is injected
    pub dummy_interval: Duration,
    /// Silence detection thresholds
    pub silence: SilencePolicy,
    /// Owning user identity for collection paths
    pub user_id: String,
    /// Random seed (None = entropy)
    pub seed: Option<u64>,
}

impl Default for AudioServiceConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(60_000),
            capture_window: Duration::from_millis(2_000),
            dummy_interval: Duration::from_millis(3_600_000),
            silence: SilencePolicy::default(),
            user_id: "testUser".to_string(),
            seed: None,
        }
    }
}

/// The periodic biometric loop.
pub struct PeriodicService {
    ticker: Option<Ticker>,
    paused: Arc<AtomicBool>,
}

impl PeriodicService {
    /// Start the loop on its own thread. The first tick fires immediately,
    /// optionally after waiting up to `sensor_warmup` for an initial reading.
    pub fn start(
        config: PeriodicServiceConfig,
        sensor: Arc<dyn HeartRateSource>,
        store: Arc<dyn DocumentStore>,
        log: SharedTransparencyLog,
        clock: Arc<dyn Clock>,
    ) -> Self {
        if !config.sensor_warmup.is_zero() && sensor.capability().is_available() {
            wait_for_first_reading(sensor.as_ref(), config.sensor_warmup);
        }

        let mut sampler = PeriodicSampler::new(config.seed);
        let user_id = config.user_id.clone();
        let paused = Arc::new(AtomicBool::new(false));
        let paused_flag = paused.clone();

        let ticker = Ticker::start(config.interval, move || {
            if paused_flag.load(Ordering::SeqCst) {
                return;
            }
            let now_ms = clock.now_ms();
            let live = sensor.latest();
            run_periodic_tick(&mut sampler, live, now_ms, &user_id, store.as_ref(), &log);
        });

        Self {
            ticker: Some(ticker),
            paused,
        }
    }

    /// Pause or resume the loop. Paused ticks do nothing, including writes.
    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    /// Stop the loop. Blocks until the tick thread exits.
    pub fn stop(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.stop();
        }
    }
}

impl Drop for PeriodicService {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The audio event loop.
pub struct AudioEventService {
    ticker: Option<Ticker>,
    paused: Arc<AtomicBool>,
}

impl AudioEventService {
    /// Start the loop on its own thread.
    pub fn start(
        config: AudioServiceConfig,
        mut source: Box<dyn AudioSource>,
        store: Arc<dyn DocumentStore>,
        log: SharedTransparencyLog,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut injector = DummyEventInjector::new(config.dummy_interval);
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let user_id = config.user_id.clone();
        let silence = config.silence;
        let window = config.capture_window;
        let paused = Arc::new(AtomicBool::new(false));
        let paused_flag = paused.clone();

        let ticker = Ticker::start(config.interval, move || {
            if paused_flag.load(Ordering::SeqCst) {
                return;
            }
            let now_ms = clock.now_ms();
            run_audio_tick(
                source.as_mut(),
                &mut injector,
                &mut rng,
                &silence,
                window,
                now_ms,
                &user_id,
                store.as_ref(),
                &log,
            );
        });

        Self {
            ticker: Some(ticker),
            paused,
        }
    }

    /// Pause or resume the loop.
    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    /// Stop the loop. Blocks until the tick thread exits.
    pub fn stop(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.stop();
        }
    }
}

impl Drop for AudioEventService {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One tick of the periodic biometric loop: build a sample from the latest
/// reading (or fallback ranges) and store it under its timestamp identity.
pub fn run_periodic_tick<R: Rng>(
    sampler: &mut PeriodicSampler<R>,
    live_reading: Option<f64>,
    now_ms: i64,
    user_id: &str,
    store: &dyn DocumentStore,
    log: &TransparencyLog,
) {
    let sample = sampler.sample(now_ms, live_reading);
    let collection = periodic_collection(user_id);

    let record = match serde_json::to_value(&sample) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!("failed to serialize periodic sample: {e}");
            log.record_write_failure();
            return;
        }
    };

    match store.put(&collection, Some(&sample.document_id()), &record) {
        Ok(id) => {
            tracing::info!(
                collection = %collection,
                id = %id,
                is_fallback = sample.is_fallback,
                "periodic sample stored"
            );
            log.record_periodic_sample();
        }
        Err(e) => {
            // Not retried: the next tick's write is independent.
            tracing::error!("failed to store periodic sample: {e}");
            log.record_write_failure();
        }
    }
}

/// One tick of the audio event loop: capture, classify, persist a real event
/// or fall through to dummy injection.
#[allow(clippy::too_many_arguments)]
pub fn run_audio_tick<R: Rng>(
    source: &mut dyn AudioSource,
    injector: &mut DummyEventInjector,
    rng: &mut R,
    silence: &SilencePolicy,
    window: Duration,
    now_ms: i64,
    user_id: &str,
    store: &dyn DocumentStore,
    log: &TransparencyLog,
) {
    let window_ms = window.as_millis() as i32;
    let sample_rate = source.sample_rate();

    // Missing permission and capture failure both degrade to a silent window.
    let features = if source.capability().is_available() {
        match source.record(window) {
            Ok(samples) => analyze(&samples, sample_rate, window_ms, silence),
            Err(e) => {
                tracing::warn!("audio capture failed, treating window as silent: {e}");
                analyze(&[], sample_rate, window_ms, silence)
            }
        }
    } else {
        analyze(&[], sample_rate, window_ms, silence)
    };

    let guess = classify(&features);
    if !features.is_silent && guess != EventType::Unknown {
        let event = AudioEventSample {
            timestamp: now_ms,
            event_type_guess: guess,
            event_dbfs: features.level,
            event_duration_ms: features.duration_ms,
            audio_base64: features.encoded,
            is_fallback: false,
        };
        persist_event(&event, user_id, store, log);
        // The marker advances even if the write failed; failures are not
        // allowed to trigger an injection storm.
        injector.observe_real_event(now_ms);
        return;
    }

    if injector.should_inject(now_ms) {
        let event = injector.synthesize(now_ms, rng);
        tracing::info!(event_type = %event.event_type_guess, "injecting dummy audio event");
        persist_event(&event, user_id, store, log);
    } else {
        log.record_tick_skipped();
    }
}

fn persist_event(
    event: &AudioEventSample,
    user_id: &str,
    store: &dyn DocumentStore,
    log: &TransparencyLog,
) {
    let collection = events_collection(user_id);

    let record = match serde_json::to_value(event) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!("failed to serialize audio event: {e}");
            log.record_write_failure();
            return;
        }
    };

    match store.put(&collection, None, &record) {
        Ok(id) => {
            tracing::info!(
                collection = %collection,
                id = %id,
                event_type = %event.event_type_guess,
                is_fallback = event.is_fallback,
                "audio event stored"
            );
            if event.is_fallback {
                log.record_dummy_event();
            } else {
                log.record_real_event();
            }
        }
        Err(e) => {
            tracing::error!("failed to store audio event: {e}");
            log.record_write_failure();
        }
    }
}

/// Poll the sensor until a first reading arrives or the warmup budget runs
/// out.
fn wait_for_first_reading(sensor: &dyn HeartRateSource, warmup: Duration) {
    let deadline = std::time::Instant::now() + warmup;
    while sensor.latest().is_none() && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(100));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{NoopSource, SyntheticSource};
    use crate::store::MemoryStore;
    use crate::transparency::TransparencyLog;

    const HOUR_MS: i64 = 3_600_000;

    fn audio_fixture() -> (DummyEventInjector, StdRng, SilencePolicy, MemoryStore, TransparencyLog)
    {
        (
            DummyEventInjector::new(Duration::from_millis(HOUR_MS as u64)),
            StdRng::seed_from_u64(7),
            SilencePolicy::default(),
            MemoryStore::new(),
            TransparencyLog::new(),
        )
    }

    #[test]
    fn test_periodic_tick_writes_under_timestamp_id() {
        let mut sampler = PeriodicSampler::new(Some(1));
        let store = MemoryStore::new();
        let log = TransparencyLog::new();

        run_periodic_tick(&mut sampler, Some(72.0), 1_700_000_000_000, "u1", &store, &log);

        let docs = store.documents("users/u1/raw_periodic");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].0, "1700000000000");
        assert_eq!(docs[0].1["heart_rate_avg"], 72);
        assert_eq!(docs[0].1["is_fallback"], false);
        assert_eq!(log.stats().periodic_samples, 1);
    }

    #[test]
    fn test_periodic_tick_same_timestamp_overwrites() {
        let mut sampler = PeriodicSampler::new(Some(1));
        let store = MemoryStore::new();
        let log = TransparencyLog::new();

        run_periodic_tick(&mut sampler, None, 42, "u1", &store, &log);
        run_periodic_tick(&mut sampler, None, 42, "u1", &store, &log);

        assert_eq!(store.document_count("users/u1/raw_periodic"), 1);
    }

    #[test]
    fn test_audio_tick_silent_before_threshold_writes_nothing() {
        let (mut injector, mut rng, silence, store, log) = audio_fixture();
        let mut source = NoopSource::new(8_000);
        injector.observe_real_event(1_000);

        run_audio_tick(
            &mut source,
            &mut injector,
            &mut rng,
            &silence,
            Duration::from_millis(2_000),
            1_000 + HOUR_MS,
            "u1",
            &store,
            &log,
        );

        assert_eq!(store.document_count("users/u1/raw_events"), 0);
        assert_eq!(log.stats().ticks_skipped, 1);
    }

    #[test]
    fn test_audio_tick_injects_past_threshold() {
        let (mut injector, mut rng, silence, store, log) = audio_fixture();
        let mut source = NoopSource::new(8_000);
        injector.observe_real_event(1_000);

        run_audio_tick(
            &mut source,
            &mut injector,
            &mut rng,
            &silence,
            Duration::from_millis(2_000),
            1_000 + HOUR_MS + 1,
            "u1",
            &store,
            &log,
        );

        let docs = store.documents("users/u1/raw_events");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].1["event_dbfs"], 70);
        assert_eq!(docs[0].1["event_duration_ms"], 2_000);
        assert_eq!(docs[0].1["is_fallback"], true);
        assert!(docs[0].1["audio_base64"].is_null());
        assert_eq!(log.stats().dummy_events, 1);
    }

    #[test]
    fn test_audio_tick_real_event_resets_marker() {
        let (mut injector, mut rng, silence, store, log) = audio_fixture();
        // Loud tone: classifies as laughter over a 2 s window.
        let mut source = SyntheticSource::new(8_000, 30_000);

        run_audio_tick(
            &mut source,
            &mut injector,
            &mut rng,
            &silence,
            Duration::from_millis(2_000),
            5_000_000,
            "u1",
            &store,
            &log,
        );

        let docs = store.documents("users/u1/raw_events");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].1["event_type_guess"], "laughter");
        assert_eq!(docs[0].1["is_fallback"], false);
        assert!(docs[0].1["audio_base64"].is_string());
        assert_eq!(injector.last_event_ms(), 5_000_000);
        assert_eq!(log.stats().real_events, 1);
    }
}
