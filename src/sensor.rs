//! Heart-rate sensor collaborators.
//!
//! The sampler never blocks on the sensor: it reads whatever latest value has
//! arrived asynchronously, and absence is a valid steady state rather than an
//! error.

use crate::capability::Capability;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// A source of asynchronously updated heart-rate readings.
pub trait HeartRateSource: Send + Sync {
    /// Whether the underlying sensor is usable at all.
    fn capability(&self) -> Capability;

    /// The most recent reading, if one has arrived. Never blocks.
    fn latest(&self) -> Option<f64>;
}

/// A sensor that never produces a reading (permission denied or no hardware).
/// Every tick through this source takes the fallback path.
pub struct NoopSensor;

impl HeartRateSource for NoopSensor {
    fn capability(&self) -> Capability {
        Capability::Denied
    }

    fn latest(&self) -> Option<f64> {
        None
    }
}

/// Resting rate the simulated sensor walks around.
const SIMULATED_RESTING_BPM: f64 = 70.0;

/// A background-thread sensor producing a slow random walk around a resting
/// rate. Used to exercise the live-reading path before real signal
/// acquisition exists.
pub struct SimulatedSensor {
    reading: Arc<Mutex<Option<f64>>>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SimulatedSensor {
    /// Start the simulation thread, updating roughly once per second.
    pub fn start() -> Self {
        Self::start_at(SIMULATED_RESTING_BPM)
    }

    /// Start the simulation thread around a specific resting rate.
    pub fn start_at(resting_bpm: f64) -> Self {
        let reading = Arc::new(Mutex::new(Some(resting_bpm)));
        let running = Arc::new(AtomicBool::new(true));

        let shared = reading.clone();
        let flag = running.clone();
        let handle = std::thread::spawn(move || {
            let mut rng = StdRng::from_entropy();
            let mut bpm = resting_bpm;

            while flag.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(1_000));
                bpm = (bpm + rng.gen_range(-1.5..=1.5)).clamp(55.0, 110.0);
                if let Ok(mut slot) = shared.lock() {
                    *slot = Some(bpm);
                }
            }
        });

        Self {
            reading,
            running,
            handle: Some(handle),
        }
    }

    /// Stop the simulation thread.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl HeartRateSource for SimulatedSensor {
    fn capability(&self) -> Capability {
        Capability::Available
    }

    fn latest(&self) -> Option<f64> {
        self.reading.lock().ok().and_then(|slot| *slot)
    }
}

impl Drop for SimulatedSensor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_sensor_is_denied_and_empty() {
        let sensor = NoopSensor;
        assert_eq!(sensor.capability(), Capability::Denied);
        assert!(sensor.latest().is_none());
    }

    #[test]
    fn test_simulated_sensor_has_initial_reading() {
        let mut sensor = SimulatedSensor::start_at(68.0);
        assert_eq!(sensor.capability(), Capability::Available);

        // The initial value is published before the first walk step.
        let reading = sensor.latest().expect("simulated sensor has a reading");
        assert!((50.0..=120.0).contains(&reading));
        sensor.stop();
    }
}
