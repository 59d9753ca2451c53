//! Configuration for the Moodwatch Sensor Agent.
//!
//! Every interval and threshold the agent uses is enumerated here with its
//! compiled-in default, so the values are inspectable (`moodwatch-sensor
//! config`) and overridable without recompiling.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for the sensor agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Interval between sampling ticks (both loops)
    #[serde(with = "duration_ms_serde")]
    pub tick_interval: Duration,

    /// Maximum gap without a persisted audio event before a dummy is injected
    #[serde(with = "duration_ms_serde")]
    pub dummy_interval: Duration,

    /// Length of each audio capture window
    #[serde(with = "duration_ms_serde")]
    pub capture_window: Duration,

    /// How long the first periodic tick may wait for an initial live reading
    /// (0 = fall back immediately)
    #[serde(with = "duration_ms_serde")]
    pub sensor_warmup: Duration,

    /// Audio capture sample rate in Hz
    pub sample_rate_hz: u32,

    /// Absolute amplitude above which a sample counts as "loud"
    pub silence_amplitude: i16,

    /// Fraction of loud samples below which a window is silent
    pub silence_fraction: f64,

    /// Owning user identity for the store collection paths
    pub user_id: String,

    /// Which collection loops to run
    pub sources: SourceConfig,

    /// Path for storing state and transparency logs
    pub data_path: PathBuf,

    /// Whether collection is currently paused
    pub paused: bool,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("moodwatch-sensor-agent");

        Self {
            tick_interval: Duration::from_millis(60_000),
            dummy_interval: Duration::from_millis(3_600_000),
            capture_window: Duration::from_millis(2_000),
            sensor_warmup: Duration::from_millis(0),
            sample_rate_hz: 8_000,
            silence_amplitude: 5_000,
            silence_fraction: 0.01,
            user_id: "testUser".to_string(),
            sources: SourceConfig::default(),
            data_path: data_dir,
            paused: false,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("moodwatch-sensor-agent")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }
}

/// Configuration for which collection loops to run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub biometrics: bool,
    pub audio: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            biometrics: true,
            audio: true,
        }
    }
}

impl SourceConfig {
    /// Parse source configuration from a comma-separated string.
    pub fn from_csv(s: &str) -> Self {
        let sources: Vec<String> = s.split(',').map(|s| s.trim().to_lowercase()).collect();

        Self {
            biometrics: sources.iter().any(|s| s == "biometrics" || s == "all"),
            audio: sources.iter().any(|s| s == "audio" || s == "all"),
        }
    }

    /// Check if at least one loop is enabled.
    pub fn any_enabled(&self) -> bool {
        self.biometrics || self.audio
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration as integer milliseconds.
mod duration_ms_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_config_parsing() {
        let config = SourceConfig::from_csv("biometrics,audio");
        assert!(config.biometrics);
        assert!(config.audio);

        let config = SourceConfig::from_csv("biometrics");
        assert!(config.biometrics);
        assert!(!config.audio);

        let config = SourceConfig::from_csv("all");
        assert!(config.biometrics);
        assert!(config.audio);
    }

    #[test]
    fn test_default_intervals() {
        let config = Config::default();
        assert_eq!(config.tick_interval, Duration::from_millis(60_000));
        assert_eq!(config.dummy_interval, Duration::from_millis(3_600_000));
        assert_eq!(config.capture_window, Duration::from_millis(2_000));
        assert_eq!(config.sensor_warmup, Duration::ZERO);
        assert_eq!(config.sample_rate_hz, 8_000);
        assert_eq!(config.silence_amplitude, 5_000);
        assert!(!config.paused);
    }

    #[test]
    fn test_duration_roundtrip() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.tick_interval, config.tick_interval);
        assert_eq!(parsed.dummy_interval, config.dummy_interval);
    }
}
