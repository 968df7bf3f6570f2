//! Configuration management for the fraud scoring service

use crate::clock::SystemClock;
use crate::models::logistic::DEFAULT_DECISION_THRESHOLD;
use crate::types::verdict::RiskLevelThresholds;
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Environment variable overriding the configuration file location
pub const CONFIG_PATH_ENV: &str = "FRAUD_SCORER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Classifier backend used to serve the model artifact
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelBackend {
    /// JSON logistic regression artifact
    #[default]
    Logistic,
    /// ONNX model (requires the `onnx` feature)
    Onnx,
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub model: ModelConfig,
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming transaction requests
    pub transaction_subject: String,
    /// Subject verdict events are published to
    pub verdict_subject: String,
    /// Queue group shared by service instances
    #[serde(default)]
    pub queue_group: Option<String>,
}

/// Model artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Path to the model artifact
    pub path: String,
    #[serde(default)]
    pub backend: ModelBackend,
    /// Probability at or above which the logistic backend predicts fraud
    #[serde(default = "default_decision_threshold")]
    pub decision_threshold: f64,
    /// Intra-op threads for ONNX inference
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_decision_threshold() -> f64 {
    DEFAULT_DECISION_THRESHOLD
}

fn default_onnx_threads() -> usize {
    1
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: "models/logistic_v2.json".to_string(),
            backend: ModelBackend::Logistic,
            decision_threshold: DEFAULT_DECISION_THRESHOLD,
            onnx_threads: 1,
        }
    }
}

/// Reference clock configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ClockConfig {
    /// Offset east of UTC for time-of-day features; host local time when unset
    pub utc_offset_minutes: Option<i32>,
}

impl ClockConfig {
    pub fn system_clock(&self) -> Result<SystemClock> {
        match self.utc_offset_minutes {
            None => Ok(SystemClock::local()),
            Some(minutes) => SystemClock::from_offset_minutes(minutes)
                .with_context(|| format!("utc_offset_minutes {minutes} is out of range")),
        }
    }
}

/// Detection configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DetectionConfig {
    /// Probability thresholds for verdict event risk levels
    #[serde(default)]
    pub risk_levels: RiskLevelThresholds,
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Maximum transactions scored concurrently
    pub workers: usize,
    /// Seconds between metrics summaries
    #[serde(default = "default_metrics_interval")]
    pub metrics_interval_secs: u64,
}

fn default_metrics_interval() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from `FRAUD_SCORER_CONFIG` or the default path
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        let config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.pipeline.workers == 0 {
            anyhow::bail!("pipeline.workers must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.model.decision_threshold) {
            anyhow::bail!(
                "model.decision_threshold {} is outside [0, 1]",
                self.model.decision_threshold
            );
        }
        self.clock.system_clock()?;
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                transaction_subject: "transactions.score".to_string(),
                verdict_subject: "fraud.verdicts".to_string(),
                queue_group: Some("fraud-risk-scorer".to_string()),
            },
            model: ModelConfig::default(),
            clock: ClockConfig::default(),
            detection: DetectionConfig::default(),
            pipeline: PipelineConfig {
                workers: 4,
                metrics_interval_secs: 30,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}
