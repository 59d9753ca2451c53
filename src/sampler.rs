//! Periodic biometric sampling with real-vs-fallback selection.
//!
//! When a live heart-rate reading is available the heart-rate fields are
//! derived from it; everything else (and, without a reading, everything) is
//! drawn uniformly from documented inclusive ranges. The random source is
//! injected so tests can pin exact boundary behavior with a seed.

use crate::record::PeriodicSample;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Lowest heart-rate minimum the sampler will report for a live reading.
const LIVE_MIN_FLOOR: i64 = 40;
/// Highest heart-rate maximum the sampler will report for a live reading.
const LIVE_MAX_CEIL: i64 = 150;

/// Builds [`PeriodicSample`] records, one per tick.
pub struct PeriodicSampler<R: Rng = StdRng> {
    rng: R,
}

impl PeriodicSampler<StdRng> {
    /// Create a sampler with an optionally seeded random source.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl<R: Rng> PeriodicSampler<R> {
    /// Create a sampler around an existing random source.
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Produce the sample for one tick.
    ///
    /// `live_reading` is the latest heart rate observed no earlier than the
    /// previous tick, if any; absence selects the fallback ranges.
    pub fn sample(&mut self, now_ms: i64, live_reading: Option<f64>) -> PeriodicSample {
        match live_reading {
            Some(hr) => self.live_sample(now_ms, hr),
            None => self.fallback_sample(now_ms),
        }
    }

    fn live_sample(&mut self, now_ms: i64, hr: f64) -> PeriodicSample {
        let avg = hr.round() as i64;
        let min = (avg - 5).max(LIVE_MIN_FLOOR);
        let max = (avg + 10).min(LIVE_MAX_CEIL);

        PeriodicSample {
            timestamp: now_ms,
            heart_rate_avg: avg.max(0) as u32,
            heart_rate_min: min.max(0) as u32,
            heart_rate_max: max.max(0) as u32,
            hrv_sdnn: self.rng.gen_range(30..=70),
            respiratory_rate_avg: self.rng.gen_range(12..=20),
            movement_count: self.rng.gen_range(0..=10),
            is_fallback: false,
        }
    }

    fn fallback_sample(&mut self, now_ms: i64) -> PeriodicSample {
        PeriodicSample {
            timestamp: now_ms,
            heart_rate_avg: self.rng.gen_range(60..=85),
            heart_rate_min: self.rng.gen_range(45..=60),
            heart_rate_max: self.rng.gen_range(90..=120),
            hrv_sdnn: self.rng.gen_range(20..=70),
            respiratory_rate_avg: self.rng.gen_range(12..=20),
            movement_count: self.rng.gen_range(0..=15),
            is_fallback: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_reading_72() {
        let mut sampler = PeriodicSampler::new(Some(42));
        let sample = sampler.sample(1_000, Some(72.0));

        assert_eq!(sample.heart_rate_avg, 72);
        assert_eq!(sample.heart_rate_min, 67);
        assert_eq!(sample.heart_rate_max, 82);
        assert!(!sample.is_fallback);
        assert!((30..=70).contains(&sample.hrv_sdnn));
        assert!((12..=20).contains(&sample.respiratory_rate_avg));
        assert!(sample.movement_count <= 10);
    }

    #[test]
    fn test_live_reading_clamps() {
        let mut sampler = PeriodicSampler::new(Some(1));

        // Low reading: min floors at 40
        let low = sampler.sample(0, Some(42.0));
        assert_eq!(low.heart_rate_avg, 42);
        assert_eq!(low.heart_rate_min, 40);

        // High reading: max ceils at 150
        let high = sampler.sample(0, Some(145.0));
        assert_eq!(high.heart_rate_avg, 145);
        assert_eq!(high.heart_rate_max, 150);
    }

    #[test]
    fn test_live_reading_rounds() {
        let mut sampler = PeriodicSampler::new(Some(7));
        let sample = sampler.sample(0, Some(71.6));
        assert_eq!(sample.heart_rate_avg, 72);
    }

    #[test]
    fn test_fallback_ranges() {
        let mut sampler = PeriodicSampler::new(Some(9));

        for _ in 0..200 {
            let sample = sampler.sample(0, None);
            assert!(sample.is_fallback);
            assert!((60..=85).contains(&sample.heart_rate_avg));
            assert!((45..=60).contains(&sample.heart_rate_min));
            assert!((90..=120).contains(&sample.heart_rate_max));
            assert!((20..=70).contains(&sample.hrv_sdnn));
            assert!((12..=20).contains(&sample.respiratory_rate_avg));
            assert!(sample.movement_count <= 15);
        }
    }

    #[test]
    fn test_seeded_sampler_is_deterministic() {
        let mut a = PeriodicSampler::new(Some(1234));
        let mut b = PeriodicSampler::new(Some(1234));

        let sa = a.sample(5, None);
        let sb = b.sample(5, None);
        assert_eq!(sa.heart_rate_avg, sb.heart_rate_avg);
        assert_eq!(sa.hrv_sdnn, sb.hrv_sdnn);
        assert_eq!(sa.movement_count, sb.movement_count);
    }

    #[test]
    fn test_timestamp_passthrough() {
        let mut sampler = PeriodicSampler::new(Some(3));
        let sample = sampler.sample(1_700_000_000_123, None);
        assert_eq!(sample.timestamp, 1_700_000_000_123);
        assert_eq!(sample.document_id(), "1700000000123");
    }
}
