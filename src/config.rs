//! Optional TOML configuration.
//!
//! Lookup order: an explicit `--config` path, then the central file under
//! `$XDG_CONFIG_HOME/sdump/config.toml` (or `~/.config/sdump/config.toml`),
//! then built-in defaults. Command-line flags override whatever is loaded.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::cascade::ExtractionMode;
use crate::Viewport;

/// Upper bound for the capture settle delays.
pub const MAX_SETTLE_DELAY: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub viewport: ViewportConfig,
    pub timeouts: Timeouts,
    pub extraction: ExtractionDefaults,
    pub capture: CaptureDefaults,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewportConfig {
    pub width: u32,
    pub height: u32,
    pub device_scale_factor: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        let vp = Viewport::default();
        Self {
            width: vp.width,
            height: vp.height,
            device_scale_factor: vp.device_scale_factor,
        }
    }
}

impl From<ViewportConfig> for Viewport {
    fn from(cfg: ViewportConfig) -> Self {
        Viewport {
            width: cfg.width,
            height: cfg.height,
            device_scale_factor: cfg.device_scale_factor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Timeouts {
    #[serde(with = "humantime_serde")]
    pub navigation: Duration,
    #[serde(with = "humantime_serde")]
    pub network_idle: Duration,
    #[serde(with = "humantime_serde")]
    pub process: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation: Duration::from_secs(30),
            network_idle: Duration::from_secs(10),
            process: Duration::from_secs(45),
        }
    }
}

/// Defaults for `sdump extract` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractionDefaults {
    pub mode: ExtractionMode,
    pub children: bool,
    pub pseudo: bool,
    pub use_inspected: bool,
}

impl Default for ExtractionDefaults {
    fn default() -> Self {
        Self {
            mode: ExtractionMode::All,
            children: true,
            pseudo: true,
            use_inspected: true,
        }
    }
}

/// Defaults for `sdump capture`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureDefaults {
    /// Wait after resizing for a full-page shot.
    #[serde(with = "humantime_serde")]
    pub settle_delay: Duration,
    /// Wait after scrolling to the top for a full-page shot.
    #[serde(with = "humantime_serde")]
    pub scroll_settle: Duration,
    pub output_dir: PathBuf,
}

impl Default for CaptureDefaults {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(300),
            scroll_settle: Duration::from_millis(100),
            output_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Load `path`, else the central config file, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match Self::central_config_path() {
            Some(central) if central.is_file() => Self::from_file(&central),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn central_config_path() -> Option<PathBuf> {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME")
                    .filter(|v| !v.is_empty())
                    .map(|home| PathBuf::from(home).join(".config"))
            })?;
        Some(base.join("sdump").join("config.toml"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(ConfigError::Invalid(
                "viewport width and height must be positive".to_string(),
            ));
        }
        if !(self.viewport.device_scale_factor.is_finite() && self.viewport.device_scale_factor > 0.0) {
            return Err(ConfigError::Invalid(
                "viewport.device_scale_factor must be a positive number".to_string(),
            ));
        }
        for (name, value) in [
            ("timeouts.navigation", self.timeouts.navigation),
            ("timeouts.network_idle", self.timeouts.network_idle),
            ("timeouts.process", self.timeouts.process),
        ] {
            if value.is_zero() {
                return Err(ConfigError::Invalid(format!("{} must be greater than zero", name)));
            }
        }
        for (name, value) in [
            ("capture.settle_delay", self.capture.settle_delay),
            ("capture.scroll_settle", self.capture.scroll_settle),
        ] {
            if value > MAX_SETTLE_DELAY {
                return Err(ConfigError::Invalid(format!(
                    "{} of {:?} exceeds the {:?} settle limit",
                    name, value, MAX_SETTLE_DELAY
                )));
            }
        }
        Ok(())
    }
}
