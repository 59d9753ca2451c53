//! Audio capture sources.
//!
//! Capture is scoped: the device is acquired when `record` is called and
//! released before it returns, on every exit path. The agent holds no audio
//! resource between ticks.

use crate::capability::Capability;
use std::f64::consts::TAU;
use std::time::Duration;

/// A source of raw 16-bit mono PCM for one capture window.
pub trait AudioSource: Send {
    /// Whether microphone access is usable at all.
    fn capability(&self) -> Capability;

    /// Native sample rate of this source in Hz.
    fn sample_rate(&self) -> u32;

    /// Capture one window of samples. Returning an empty buffer is valid and
    /// is treated as silence downstream.
    fn record(&mut self, window: Duration) -> Result<Vec<i16>, CaptureError>;
}

/// Errors raised by an audio backend.
#[derive(Debug)]
pub enum CaptureError {
    /// Microphone permission is not granted
    PermissionDenied,
    /// The backend failed mid-capture
    Backend(String),
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureError::PermissionDenied => write!(f, "microphone permission denied"),
            CaptureError::Backend(e) => write!(f, "capture backend error: {e}"),
        }
    }
}

impl std::error::Error for CaptureError {}

/// A source with no usable microphone. Capability reports denied and capture
/// yields no samples, so every tick through this source is silent.
pub struct NoopSource {
    sample_rate: u32,
}

impl NoopSource {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

impl AudioSource for NoopSource {
    fn capability(&self) -> Capability {
        Capability::Denied
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn record(&mut self, _window: Duration) -> Result<Vec<i16>, CaptureError> {
        Ok(Vec::new())
    }
}

/// A deterministic tone generator standing in for a microphone, for
/// simulation runs and tests.
pub struct SyntheticSource {
    sample_rate: u32,
    amplitude: i16,
    frequency_hz: f64,
}

impl SyntheticSource {
    /// A tone at the given peak amplitude (440 Hz).
    pub fn new(sample_rate: u32, amplitude: i16) -> Self {
        Self {
            sample_rate,
            amplitude,
            frequency_hz: 440.0,
        }
    }

    /// A tone quiet enough to always register as silent.
    pub fn quiet(sample_rate: u32) -> Self {
        Self::new(sample_rate, 500)
    }
}

impl AudioSource for SyntheticSource {
    fn capability(&self) -> Capability {
        Capability::Available
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn record(&mut self, window: Duration) -> Result<Vec<i16>, CaptureError> {
        let count = (u128::from(self.sample_rate) * window.as_millis() / 1_000) as usize;
        let amplitude = f64::from(self.amplitude);
        let step = self.frequency_hz / f64::from(self.sample_rate);

        let samples = (0..count)
            .map(|i| (amplitude * (TAU * step * i as f64).sin()).round() as i16)
            .collect();

        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::features::{analyze, classify, SilencePolicy};
    use crate::record::EventType;

    #[test]
    fn test_noop_source_yields_silence() {
        let mut source = NoopSource::new(8_000);
        assert_eq!(source.capability(), Capability::Denied);
        let samples = source.record(Duration::from_millis(2_000)).unwrap();
        assert!(samples.is_empty());
    }

    #[test]
    fn test_synthetic_source_window_length() {
        let mut source = SyntheticSource::new(8_000, 20_000);
        let samples = source.record(Duration::from_millis(2_000)).unwrap();
        assert_eq!(samples.len(), 16_000);
    }

    #[test]
    fn test_loud_tone_classifies_as_laughter() {
        // Peak 30_000 → rms ≈ 21_213 → level ≈ 65, over a 2 s window.
        let mut source = SyntheticSource::new(8_000, 30_000);
        let samples = source.record(Duration::from_millis(2_000)).unwrap();
        let features = analyze(&samples, 8_000, 2_000, &SilencePolicy::default());

        assert!(!features.is_silent);
        assert_eq!(classify(&features), EventType::Laughter);
    }

    #[test]
    fn test_quiet_tone_is_silent() {
        let mut source = SyntheticSource::quiet(8_000);
        let samples = source.record(Duration::from_millis(2_000)).unwrap();
        let features = analyze(&samples, 8_000, 2_000, &SilencePolicy::default());
        assert!(features.is_silent);
    }
}
