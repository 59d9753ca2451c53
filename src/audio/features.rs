//! Audio-window feature extraction and event classification.
//!
//! A capture window reduces to three numbers (level, duration, silence flag)
//! plus an optional encoded payload. Classification over those numbers is a
//! pure function; the level/duration ranges for laughter and sigh overlap, so
//! laughter is checked first.

use crate::audio::wav;
use crate::record::EventType;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

/// Minimum level (percent of full scale) for a laughter guess.
const LAUGHTER_MIN_LEVEL: i32 = 60;
/// Duration band for a laughter guess (ms).
const LAUGHTER_DURATION_MS: std::ops::RangeInclusive<i32> = 500..=2500;
/// Minimum duration for a sigh guess (ms).
const SIGH_MIN_DURATION_MS: i32 = 1800;
/// Level band for a sigh guess.
const SIGH_LEVEL: std::ops::RangeInclusive<i32> = 30..=80;

/// Silence detection thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SilencePolicy {
    /// Absolute amplitude above which a sample counts as "loud"
    pub amplitude: i16,
    /// Fraction of loud samples below which the window is silent
    pub fraction: f64,
}

impl Default for SilencePolicy {
    fn default() -> Self {
        Self {
            amplitude: 5_000,
            fraction: 0.01,
        }
    }
}

/// Summary of one capture window.
#[derive(Debug, Clone)]
pub struct AudioFeatures {
    /// RMS level as a percentage of full scale, clamped to 0..=100
    pub level: i32,
    /// Window duration (ms)
    pub duration_ms: i32,
    /// Whether the window is effectively silent
    pub is_silent: bool,
    /// Base64 WAV of the window, only present for non-silent windows
    pub encoded: Option<String>,
}

/// Reduce a window of raw samples to features.
///
/// An empty window (capture misbehavior, missing permission) is silent, never
/// an error.
pub fn analyze(
    samples: &[i16],
    sample_rate: u32,
    window_ms: i32,
    silence: &SilencePolicy,
) -> AudioFeatures {
    if samples.is_empty() {
        return AudioFeatures {
            level: 0,
            duration_ms: window_ms,
            is_silent: true,
            encoded: None,
        };
    }

    let mut sum_squares = 0.0f64;
    let mut loud = 0usize;
    for &sample in samples {
        let v = f64::from(sample);
        sum_squares += v * v;
        if i32::from(sample).abs() > i32::from(silence.amplitude) {
            loud += 1;
        }
    }

    let rms = (sum_squares / samples.len() as f64).sqrt();
    let level = ((rms / f64::from(i16::MAX)) * 100.0).clamp(0.0, 100.0).round() as i32;
    let loud_fraction = loud as f64 / samples.len() as f64;
    let is_silent = loud_fraction < silence.fraction;

    let encoded = if is_silent {
        None
    } else {
        Some(BASE64.encode(wav::encode(samples, sample_rate)))
    };

    AudioFeatures {
        level,
        duration_ms: window_ms,
        is_silent,
        encoded,
    }
}

/// Classify a window summary into an event category. Pure and deterministic.
pub fn classify(features: &AudioFeatures) -> EventType {
    if features.is_silent {
        return EventType::Unknown;
    }

    let level = features.level;
    let duration = features.duration_ms;

    if level >= LAUGHTER_MIN_LEVEL && LAUGHTER_DURATION_MS.contains(&duration) {
        EventType::Laughter
    } else if duration >= SIGH_MIN_DURATION_MS && SIGH_LEVEL.contains(&level) {
        EventType::Sigh
    } else {
        EventType::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(level: i32, duration_ms: i32, is_silent: bool) -> AudioFeatures {
        AudioFeatures {
            level,
            duration_ms,
            is_silent,
            encoded: None,
        }
    }

    #[test]
    fn test_silent_is_always_unknown() {
        // Silence wins even over otherwise-classifiable numbers.
        assert_eq!(classify(&features(65, 1000, true)), EventType::Unknown);
        assert_eq!(classify(&features(40, 2000, true)), EventType::Unknown);
    }

    #[test]
    fn test_laughter_band() {
        assert_eq!(classify(&features(65, 1000, false)), EventType::Laughter);
        assert_eq!(classify(&features(60, 500, false)), EventType::Laughter);
        assert_eq!(classify(&features(100, 2500, false)), EventType::Laughter);
    }

    #[test]
    fn test_sigh_band() {
        assert_eq!(classify(&features(40, 2000, false)), EventType::Sigh);
        assert_eq!(classify(&features(30, 1800, false)), EventType::Sigh);
        assert_eq!(classify(&features(59, 2600, false)), EventType::Sigh);
    }

    #[test]
    fn test_laughter_wins_in_overlap() {
        // level 60..=80 with duration 1800..=2500 satisfies both rules.
        assert_eq!(classify(&features(70, 2000, false)), EventType::Laughter);
    }

    #[test]
    fn test_unknown_outside_bands() {
        assert_eq!(classify(&features(50, 1000, false)), EventType::Unknown);
        assert_eq!(classify(&features(20, 3000, false)), EventType::Unknown);
        assert_eq!(classify(&features(90, 3000, false)), EventType::Unknown);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let f = features(65, 1000, false);
        let first = classify(&f);
        for _ in 0..10 {
            assert_eq!(classify(&f), first);
        }
    }

    #[test]
    fn test_analyze_empty_window_is_silent() {
        let f = analyze(&[], 8_000, 2_000, &SilencePolicy::default());
        assert!(f.is_silent);
        assert_eq!(f.level, 0);
        assert_eq!(f.duration_ms, 2_000);
        assert!(f.encoded.is_none());
    }

    #[test]
    fn test_analyze_quiet_window_is_silent() {
        // All samples below the loud threshold.
        let samples = vec![1_000i16; 4_000];
        let f = analyze(&samples, 8_000, 2_000, &SilencePolicy::default());
        assert!(f.is_silent);
        assert!(f.encoded.is_none());
    }

    #[test]
    fn test_analyze_loud_window() {
        // Constant amplitude: rms = 20_000, level ≈ 61.
        let samples = vec![20_000i16; 4_000];
        let f = analyze(&samples, 8_000, 2_000, &SilencePolicy::default());
        assert!(!f.is_silent);
        assert_eq!(f.level, 61);
        assert!(f.encoded.is_some());
    }

    #[test]
    fn test_analyze_silence_fraction_boundary() {
        // Exactly 1% loud samples is NOT silent (threshold is strict <).
        let mut samples = vec![0i16; 990];
        samples.extend(vec![10_000i16; 10]);
        let f = analyze(&samples, 8_000, 2_000, &SilencePolicy::default());
        assert!(!f.is_silent);

        // Just below 1% is silent.
        let mut samples = vec![0i16; 991];
        samples.extend(vec![10_000i16; 9]);
        let f = analyze(&samples, 8_000, 2_000, &SilencePolicy::default());
        assert!(f.is_silent);
    }

    #[test]
    fn test_encoded_payload_is_wav() {
        let samples = vec![20_000i16; 1_000];
        let f = analyze(&samples, 8_000, 2_000, &SilencePolicy::default());
        let bytes = BASE64.decode(f.encoded.unwrap()).unwrap();
        let header = wav::WavHeader::parse(&bytes).unwrap();
        assert_eq!(header.sample_rate, 8_000);
        assert_eq!(header.data_len as usize, samples.len() * 2);
    }

    #[test]
    fn test_level_clamped_to_100() {
        let samples = vec![i16::MAX; 100];
        let f = analyze(&samples, 8_000, 2_000, &SilencePolicy::default());
        assert_eq!(f.level, 100);
    }
}
