// src/config/mod.rs
//! Configuration management module
//!
//! This module handles application configuration loading from various sources
//! including environment variables, configuration files, and default values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Ingestion limits and the duration heuristic
    pub ingestion: IngestionConfig,
    /// Speech-to-text service configuration
    pub speech: SpeechConfig,
    /// Text-insight (LLM) service configuration
    pub insight: InsightConfig,
    /// Result cache configuration
    pub cache: CacheConfig,
    /// Pattern analytics configuration
    pub analytics: AnalyticsConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Ingestion pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Maximum accepted audio payload size in bytes
    pub max_audio_bytes: u64,
    /// Accepted audio mime types (codec parameters are stripped before matching)
    pub allowed_mime_types: Vec<String>,
    /// Assumed encoder bitrate used to estimate entry duration from payload
    /// size. Recordings encoded at a different or variable bitrate will
    /// report a drifted duration.
    pub assumed_bitrate_bps: u64,
}

/// Speech-to-text service configuration (Whisper-compatible HTTP API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// API key for the speech service
    pub api_key: String,
    /// Base URL of the service
    pub base_url: String,
    /// Transcription model name
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Text-insight service configuration (Ollama-compatible HTTP API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightConfig {
    /// Base URL of the Ollama server
    pub base_url: String,
    /// Model used for tag and content analysis prompts
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum transcript length (in characters) sent to the model
    pub max_content_length: usize,
    /// Maximum number of tags kept per entry
    pub max_tags: usize,
}

/// Result cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Time-to-live for cached transcription and insight results, in seconds
    pub ttl_secs: u64,
    /// Maximum number of cached values
    pub max_capacity: u64,
    /// Number of transcript characters used to derive a cache key
    pub key_prefix_chars: usize,
}

/// Pattern analytics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// A topic is emerging (or declining) when its rate in the recent third
    /// of the timeline exceeds (or falls short of) the earlier rate by this
    /// factor
    pub emerging_ratio: f64,
    /// Below this entry count the topic lists stay empty
    pub min_entries_for_topics: usize,
    /// Window, in days, used by mood-trend recommendations
    pub recent_window_days: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ingestion: IngestionConfig::default(),
            speech: SpeechConfig::default(),
            insight: InsightConfig::default(),
            cache: CacheConfig::default(),
            analytics: AnalyticsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            max_audio_bytes: 25 * 1024 * 1024, // 25MB
            allowed_mime_types: vec![
                "audio/webm".to_string(),
                "audio/wav".to_string(),
                "audio/x-wav".to_string(),
                "audio/mpeg".to_string(),
                "audio/mp4".to_string(),
                "audio/ogg".to_string(),
                "audio/x-m4a".to_string(),
            ],
            assumed_bitrate_bps: 128_000,
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com".to_string(),
            model: "whisper-1".to_string(),
            timeout_secs: 120,
        }
    }
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.1".to_string(),
            timeout_secs: 300,
            max_content_length: 50000,
            max_tags: 5,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600, // 1 hour
            max_capacity: 10_000,
            key_prefix_chars: 100,
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            emerging_ratio: 2.0,
            min_entries_for_topics: 3,
            recent_window_days: 7,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        // Try to load from config file
        if let Ok(file_config) = Self::load_from_file("config.toml") {
            config = file_config;
        }

        // Override with environment variables
        config.load_from_env()?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path))?;

        toml::from_str(&content).context("Failed to parse config file")
    }

    /// Load configuration from environment variables
    pub fn load_from_env(&mut self) -> Result<()> {
        // Speech service configuration
        if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            self.speech.api_key = api_key;
        }
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            self.speech.base_url = base_url;
        }

        // Insight service configuration
        if let Ok(base_url) = std::env::var("OLLAMA_BASE_URL") {
            self.insight.base_url = base_url;
        }
        if let Ok(model) = std::env::var("OLLAMA_DEFAULT_MODEL") {
            self.insight.model = model;
        }

        // Ingestion configuration
        if let Ok(max_bytes) = std::env::var("MAX_AUDIO_BYTES") {
            self.ingestion.max_audio_bytes =
                max_bytes.parse().context("Invalid MAX_AUDIO_BYTES")?;
        }

        // Cache configuration
        if let Ok(ttl) = std::env::var("CACHE_TTL_SECS") {
            self.cache.ttl_secs = ttl.parse().context("Invalid CACHE_TTL_SECS")?;
        }

        // Logging configuration
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.ingestion.max_audio_bytes == 0 {
            return Err(anyhow::anyhow!("Maximum audio size cannot be 0"));
        }
        if self.ingestion.allowed_mime_types.is_empty() {
            return Err(anyhow::anyhow!("Allowed mime type list cannot be empty"));
        }
        if self.ingestion.assumed_bitrate_bps == 0 {
            return Err(anyhow::anyhow!("Assumed bitrate cannot be 0"));
        }

        if self.insight.base_url.is_empty() {
            return Err(anyhow::anyhow!("Ollama base URL cannot be empty"));
        }
        if self.insight.max_tags == 0 {
            return Err(anyhow::anyhow!("Maximum tag count cannot be 0"));
        }

        if self.cache.ttl_secs == 0 {
            return Err(anyhow::anyhow!("Cache TTL cannot be 0"));
        }
        if self.cache.key_prefix_chars == 0 {
            return Err(anyhow::anyhow!("Cache key prefix length cannot be 0"));
        }

        if self.analytics.emerging_ratio <= 1.0 {
            return Err(anyhow::anyhow!(
                "Emerging topic ratio must be greater than 1.0"
            ));
        }
        if self.analytics.recent_window_days <= 0 {
            return Err(anyhow::anyhow!("Recent window must be at least one day"));
        }

        // Validate log level
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => return Err(anyhow::anyhow!("Invalid log level: {}", self.logging.level)),
        }

        Ok(())
    }
}
