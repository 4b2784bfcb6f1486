//! Configuration management for guidecam
//!
//! Runtime knobs for capture sessions, preview defaults and logging, loaded
//! from and saved to TOML. Capture-window geometry is fixed and not part of
//! the configuration.

use crate::errors::CaptureError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideCamConfig {
    pub session: SessionTuning,
    pub preview: PreviewConfig,
    pub logging: LoggingConfig,
}

/// Capture session timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionTuning {
    /// How long to wait for each video frame, in milliseconds
    pub frame_timeout_ms: u64,
    /// Maximum frames analysed at once; later frames are dropped
    pub analysis_concurrency: usize,
    /// Upper bound for shutter plus finishing, in milliseconds
    pub capture_timeout_ms: u64,
}

/// Preview defaults used when no view size is supplied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Preview view size [width, height] in view units
    pub default_view_size: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log filter when RUST_LOG is unset
    pub level: String,
}

impl Default for GuideCamConfig {
    fn default() -> Self {
        Self {
            session: SessionTuning {
                frame_timeout_ms: 500,
                analysis_concurrency: 2,
                capture_timeout_ms: 10_000,
            },
            preview: PreviewConfig {
                default_view_size: [390.0, 844.0],
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl SessionTuning {
    pub fn frame_timeout(&self) -> Duration {
        Duration::from_millis(self.frame_timeout_ms)
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }
}

impl GuideCamConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CaptureError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| CaptureError::Config(format!("Failed to read config file: {}", e)))?;

        let config: GuideCamConfig = toml::from_str(&contents)
            .map_err(|e| CaptureError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate().map_err(CaptureError::Config)?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CaptureError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CaptureError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| CaptureError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| CaptureError::Config(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("guidecam.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.session.frame_timeout_ms == 0 {
            return Err("Frame timeout must be greater than zero".to_string());
        }
        if self.session.analysis_concurrency == 0 || self.session.analysis_concurrency > 64 {
            return Err("Analysis concurrency must be between 1 and 64".to_string());
        }
        if self.session.capture_timeout_ms == 0 {
            return Err("Capture timeout must be greater than zero".to_string());
        }

        let [w, h] = self.preview.default_view_size;
        if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
            return Err("Invalid default view size".to_string());
        }

        if self.logging.level.trim().is_empty() {
            return Err("Log level must not be empty".to_string());
        }

        Ok(())
    }
}
