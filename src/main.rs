//! Moodwatch Sensor Agent CLI
//!
//! Wearable companion data collector.

use clap::{Parser, Subcommand};
use moodwatch_sensor_agent::{
    audio::{AudioSource, NoopSource, SyntheticSource},
    clock::SystemClock,
    config::{Config, SourceConfig},
    sensor::{HeartRateSource, NoopSensor, SimulatedSensor},
    service::{AudioEventService, AudioServiceConfig, PeriodicService, PeriodicServiceConfig},
    store::{DocumentStore, MemoryStore},
    transparency::create_shared_log_with_persistence,
    DATA_DECLARATION, VERSION,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[cfg(feature = "remote")]
use moodwatch_sensor_agent::{BlockingDocumentStore, StoreConfig};

#[derive(Parser)]
#[command(name = "moodwatch-sensor")]
#[command(author = "Moodwatch")]
#[command(version = VERSION)]
#[command(about = "Wearable companion data collector", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the collection loops
    Start {
        /// Owning user identity for the store collection paths
        #[arg(long)]
        user_id: Option<String>,

        /// Collection loops to run (biometrics, audio, or all)
        #[arg(long, default_value = "all")]
        sources: String,

        /// Use simulated sensor/microphone sources instead of real hardware
        #[arg(long)]
        simulate: bool,

        /// Write to an in-memory store instead of the remote one
        #[arg(long)]
        offline: bool,

        /// Remote store base URL (requires remote feature)
        #[arg(long)]
        store_url: Option<String>,

        /// Remote store bearer token
        #[arg(long)]
        store_token: Option<String>,

        /// Seed for fallback-value generation (reproducible runs)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Pause data collection
    Pause,

    /// Resume data collection
    Resume,

    /// Show current collection status
    Status,

    /// Show configuration
    Config,

    /// Display collection declaration
    Data,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            user_id,
            sources,
            simulate,
            offline,
            store_url,
            store_token,
            seed,
        } => {
            cmd_start(user_id, &sources, simulate, offline, store_url, store_token, seed);
        }
        Commands::Pause => {
            cmd_pause();
        }
        Commands::Resume => {
            cmd_resume();
        }
        Commands::Status => {
            cmd_status();
        }
        Commands::Config => {
            cmd_config();
        }
        Commands::Data => {
            cmd_data();
        }
    }
}

#[allow(unused_variables)]
fn cmd_start(
    user_id: Option<String>,
    sources: &str,
    simulate: bool,
    offline: bool,
    store_url: Option<String>,
    store_token: Option<String>,
    seed: Option<u64>,
) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("Moodwatch Sensor Agent v{VERSION}");
    println!();

    // Parse source configuration
    let source_config = SourceConfig::from_csv(sources);
    if !source_config.any_enabled() {
        eprintln!("Error: At least one source must be enabled (biometrics or audio)");
        std::process::exit(1);
    }

    // Load or create configuration
    let mut config = Config::load().unwrap_or_default();
    if let Some(user_id) = user_id {
        config.user_id = user_id;
    }
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    println!("Starting collection...");
    println!("  User: {}", config.user_id);
    println!(
        "  Biometrics: {}",
        if source_config.biometrics {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!(
        "  Audio events: {}",
        if source_config.audio {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!("  Tick interval: {}ms", config.tick_interval.as_millis());
    println!(
        "  Dummy-event threshold: {}ms",
        config.dummy_interval.as_millis()
    );

    // Build the document store. Offline (or a failed remote setup) falls back
    // to an in-memory store so the loops always have somewhere to write.
    let memory = Arc::new(MemoryStore::new());
    let mut offline_store: Option<Arc<MemoryStore>> = None;

    let store: Arc<dyn DocumentStore> = if offline {
        println!("  Store: in-memory (offline)");
        offline_store = Some(memory.clone());
        memory
    } else {
        match create_remote_store(store_url, store_token) {
            Some(remote) => remote,
            None => {
                eprintln!("Continuing with in-memory store.");
                offline_store = Some(memory.clone());
                memory
            }
        }
    };

    // Sensor and microphone sources
    let sensor: Arc<dyn HeartRateSource> = if simulate {
        println!("  Heart-rate sensor: simulated");
        Arc::new(SimulatedSensor::start())
    } else {
        println!("  Heart-rate sensor: unavailable (fallback values)");
        Arc::new(NoopSensor)
    };

    let audio_source: Box<dyn AudioSource> = if simulate {
        println!("  Microphone: simulated (quiet)");
        Box::new(SyntheticSource::quiet(config.sample_rate_hz))
    } else {
        println!("  Microphone: unavailable (dummy events only)");
        Box::new(NoopSource::new(config.sample_rate_hz))
    };

    println!();
    println!("Press Ctrl+C to stop");
    println!();

    // Set up transparency log
    let transparency_log =
        create_shared_log_with_persistence(config.data_path.join("transparency.json"));

    let clock = Arc::new(SystemClock);

    // Start the loops
    let periodic_service = if source_config.biometrics {
        Some(PeriodicService::start(
            PeriodicServiceConfig {
                interval: config.tick_interval,
                sensor_warmup: config.sensor_warmup,
                user_id: config.user_id.clone(),
                seed,
            },
            sensor,
            store.clone(),
            transparency_log.clone(),
            clock.clone(),
        ))
    } else {
        None
    };

    let audio_service = if source_config.audio {
        Some(AudioEventService::start(
            AudioServiceConfig {
                interval: config.tick_interval,
                capture_window: config.capture_window,
                dummy_interval: config.dummy_interval,
                silence: moodwatch_sensor_agent::audio::SilencePolicy {
                    amplitude: config.silence_amplitude,
                    fraction: config.silence_fraction,
                },
                user_id: config.user_id.clone(),
                seed,
            },
            audio_source,
            store.clone(),
            transparency_log.clone(),
            clock,
        ))
    } else {
        None
    };

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc_handler(r);

    // Support pause/resume from another process by polling the config file.
    let mut paused = config.paused;
    if paused {
        println!("Collection is currently paused.");
        println!("Run `moodwatch-sensor resume` to start collecting.");
        println!();
    }
    apply_paused(paused, &periodic_service, &audio_service);

    let mut last_config_check = std::time::Instant::now();
    while running.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(100));

        // Periodically reload config so `moodwatch-sensor pause/resume` can
        // control a running agent.
        if last_config_check.elapsed() >= Duration::from_secs(1) {
            if let Ok(cfg) = Config::load() {
                if cfg.paused != paused {
                    paused = cfg.paused;
                    println!();
                    if paused {
                        println!("Pausing collection...");
                    } else {
                        println!("Resuming collection...");
                    }
                    apply_paused(paused, &periodic_service, &audio_service);
                }
            }
            last_config_check = std::time::Instant::now();
        }
    }

    // Stop collection
    println!();
    println!("Stopping collection...");
    if let Some(mut service) = periodic_service {
        service.stop();
    }
    if let Some(mut service) = audio_service {
        service.stop();
    }

    // Save transparency log
    if let Err(e) = transparency_log.save() {
        eprintln!("Warning: Could not save transparency log: {e}");
    }

    // Report offline store contents
    if let Some(memory) = offline_store {
        println!();
        println!(
            "In-memory store holds {} document(s) across collections (discarded on exit).",
            memory.total_documents()
        );
    }

    // Final stats
    println!();
    println!("{}", transparency_log.summary());
}

fn apply_paused(
    paused: bool,
    periodic: &Option<PeriodicService>,
    audio: &Option<AudioEventService>,
) {
    if let Some(service) = periodic {
        service.set_paused(paused);
    }
    if let Some(service) = audio {
        service.set_paused(paused);
    }
}

/// Build the remote store from CLI flags, or explain why it cannot be built.
#[cfg(feature = "remote")]
fn create_remote_store(
    store_url: Option<String>,
    store_token: Option<String>,
) -> Option<Arc<dyn DocumentStore>> {
    let (url, token) = match (store_url, store_token) {
        (Some(url), Some(token)) => (url, token),
        _ => {
            eprintln!("Warning: --store-url and --store-token are required for remote sync.");
            return None;
        }
    };

    match BlockingDocumentStore::new(StoreConfig::new(url, token)) {
        Ok(store) => {
            println!("  Store: remote");
            println!("  Device ID: {}", store.device_id());

            // Test connection
            match store.test_connection() {
                Ok(true) => println!("  Store connection: OK"),
                Ok(false) => {
                    eprintln!("Warning: Store health check failed");
                }
                Err(e) => {
                    eprintln!("Warning: Could not connect to store: {e}");
                }
            }
            Some(Arc::new(store))
        }
        Err(e) => {
            eprintln!("Warning: Store initialization failed: {e}");
            None
        }
    }
}

#[cfg(not(feature = "remote"))]
fn create_remote_store(
    _store_url: Option<String>,
    _store_token: Option<String>,
) -> Option<Arc<dyn DocumentStore>> {
    eprintln!("Warning: remote sync not compiled in (remote feature disabled).");
    None
}

fn cmd_pause() {
    let mut config = Config::load().unwrap_or_default();
    config.paused = true;
    if let Err(e) = config.save() {
        eprintln!("Error saving config: {e}");
        std::process::exit(1);
    }
    println!("Collection paused. Use 'moodwatch-sensor resume' to continue.");
}

fn cmd_resume() {
    let mut config = Config::load().unwrap_or_default();
    config.paused = false;
    if let Err(e) = config.save() {
        eprintln!("Error saving config: {e}");
        std::process::exit(1);
    }
    println!("Collection resumed.");
}

fn cmd_status() {
    let config = Config::load().unwrap_or_default();

    println!("Moodwatch Sensor Agent Status");
    println!("=============================");
    println!();

    println!("Configuration:");
    println!("  User: {}", config.user_id);
    println!(
        "  Biometrics: {}",
        if config.sources.biometrics {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!(
        "  Audio events: {}",
        if config.sources.audio {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!("  Tick interval: {}ms", config.tick_interval.as_millis());
    println!(
        "  Dummy-event threshold: {}ms",
        config.dummy_interval.as_millis()
    );
    println!("  Paused: {}", config.paused);
    println!();

    // Load and show transparency stats if available
    let stats_path = config.data_path.join("transparency.json");
    if stats_path.exists() {
        if let Ok(content) = std::fs::read_to_string(&stats_path) {
            if let Ok(stats) = serde_json::from_str::<serde_json::Value>(&content) {
                println!("Cumulative Statistics:");
                if let Some(samples) = stats.get("periodic_samples") {
                    println!("  Periodic samples stored: {samples}");
                }
                if let Some(real) = stats.get("real_events") {
                    println!("  Real audio events stored: {real}");
                }
                if let Some(dummy) = stats.get("dummy_events") {
                    println!("  Dummy audio events injected: {dummy}");
                }
                if let Some(failures) = stats.get("write_failures") {
                    println!("  Failed store writes: {failures}");
                }
            }
        }
    } else {
        println!("No previous session data found.");
    }
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

fn cmd_data() {
    println!("{DATA_DECLARATION}");
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");
}
