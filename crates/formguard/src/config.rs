//! Configuration management for FormGuard.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;

use formguard_common::constants::{
    DEFAULT_LISTEN_ADDR, DEFAULT_REDIS_URL, DEFAULT_RELAY_ENDPOINT, MAX_ATTEMPTS_PER_WINDOW,
    MAX_SESSION_SECS, MIN_ATTEMPT_SPACING_SECS, MIN_FIELD_FOCUS, MIN_FILL_SECS, MIN_KEYSTROKES,
    MIN_MOUSE_MOVES, RATE_WINDOW_SECS,
};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Expose the debug panel with internal counters
    #[serde(default)]
    pub debug: bool,

    /// Where submission history is kept
    #[serde(default)]
    pub history: HistoryConfig,

    /// Mail relay (EmailJS) configuration
    #[serde(default)]
    pub relay: RelayConfig,

    /// Form timing limits
    #[serde(default)]
    pub timing: TimingConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Behavioral thresholds
    #[serde(default)]
    pub behavior: BehaviorConfig,
}

/// Submission history backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryBackend {
    /// Process-local map (lost on restart)
    #[default]
    Memory,
    /// Redis string keys
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    #[serde(default)]
    pub backend: HistoryBackend,

    /// Redis connection URL (redis backend only)
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            backend: HistoryBackend::default(),
            redis_url: default_redis_url(),
        }
    }
}

/// Mail relay configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// REST endpoint for sending
    #[serde(default = "default_relay_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub service_id: String,

    #[serde(default)]
    pub template_id: String,

    #[serde(default)]
    pub public_key: String,

    /// HTTP client timeout in seconds
    #[serde(default = "default_relay_timeout")]
    pub timeout_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            endpoint: default_relay_endpoint(),
            service_id: String::new(),
            template_id: String::new(),
            public_key: String::new(),
            timeout_secs: default_relay_timeout(),
        }
    }
}

impl RelayConfig {
    /// All three identifiers are required to initialize the relay client
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("service_id", &self.service_id),
            ("template_id", &self.template_id),
            ("public_key", &self.public_key),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

        if !missing.is_empty() {
            bail!("Mail relay is missing: {}", missing.join(", "));
        }
        Ok(())
    }
}

/// Form timing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TimingConfig {
    /// Minimum seconds between opening the form and submitting
    #[serde(default = "default_min_fill")]
    pub min_fill_secs: i64,

    /// Maximum session age in seconds
    #[serde(default = "default_max_session")]
    pub max_session_secs: i64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            min_fill_secs: default_min_fill(),
            max_session_secs: default_max_session(),
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Attempts allowed per window
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Window length in seconds
    #[serde(default = "default_window")]
    pub window_secs: i64,

    /// Minimum seconds between two attempts
    #[serde(default = "default_min_spacing")]
    pub min_spacing_secs: i64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            window_secs: default_window(),
            min_spacing_secs: default_min_spacing(),
        }
    }
}

/// Behavioral heuristics configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BehaviorConfig {
    #[serde(default = "default_min_keystrokes")]
    pub min_keystrokes: u32,

    #[serde(default = "default_min_mouse_moves")]
    pub min_mouse_moves: u32,

    #[serde(default = "default_min_field_focus")]
    pub min_field_focus: u32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            min_keystrokes: default_min_keystrokes(),
            min_mouse_moves: default_min_mouse_moves(),
            min_field_focus: default_min_field_focus(),
        }
    }
}

// Default value functions
fn default_listen_addr() -> String { DEFAULT_LISTEN_ADDR.to_string() }
fn default_redis_url() -> String { DEFAULT_REDIS_URL.to_string() }
fn default_relay_endpoint() -> String { DEFAULT_RELAY_ENDPOINT.to_string() }
fn default_relay_timeout() -> u64 { 15 }
fn default_min_fill() -> i64 { MIN_FILL_SECS }
fn default_max_session() -> i64 { MAX_SESSION_SECS }
fn default_max_attempts() -> u32 { MAX_ATTEMPTS_PER_WINDOW }
fn default_window() -> i64 { RATE_WINDOW_SECS }
fn default_min_spacing() -> i64 { MIN_ATTEMPT_SPACING_SECS }
fn default_min_keystrokes() -> u32 { MIN_KEYSTROKES }
fn default_min_mouse_moves() -> u32 { MIN_MOUSE_MOVES }
fn default_min_field_focus() -> u32 { MIN_FIELD_FOCUS }

impl AppConfig {
    /// Load configuration from file, with CLI/environment overrides
    pub fn load(config_path: &str, args: &super::Args) -> Result<Self> {
        let mut config = if Path::new(config_path).exists() {
            let settings = config::Config::builder()
                .add_source(config::File::with_name(config_path))
                .build()
                .context("Failed to load config file")?;

            settings
                .try_deserialize()
                .context("Failed to parse config")?
        } else {
            // Use defaults if config file doesn't exist
            tracing::warn!("Config file not found, using defaults");
            Self::default()
        };

        // Apply CLI overrides
        if let Some(ref listen) = args.listen {
            config.listen_addr = listen.clone();
        }
        if let Some(ref redis_url) = args.redis_url {
            config.history.backend = HistoryBackend::Redis;
            config.history.redis_url = redis_url.clone();
        }
        if let Some(ref service_id) = args.service_id {
            config.relay.service_id = service_id.clone();
        }
        if let Some(ref template_id) = args.template_id {
            config.relay.template_id = template_id.clone();
        }
        if let Some(ref public_key) = args.public_key {
            config.relay.public_key = public_key.clone();
        }
        if args.debug {
            config.debug = true;
        }

        config.relay.validate()?;

        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            debug: false,
            history: HistoryConfig::default(),
            relay: RelayConfig::default(),
            timing: TimingConfig::default(),
            rate_limit: RateLimitConfig::default(),
            behavior: BehaviorConfig::default(),
        }
    }
}
