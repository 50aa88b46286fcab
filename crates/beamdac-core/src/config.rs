//! # Configuration
//!
//! YAML configuration for the beamformer: output card clocks and levels,
//! array geometry, steering, the RF tone and plot density.
//!
//! ## Configuration Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path specified via `BEAMDAC_CONFIG` environment variable
//! 2. `./beamdac.yaml` (current directory)
//! 3. `~/.config/beamdac/config.yaml` (user config)
//! 4. `/etc/beamdac/config.yaml` (system config)
//!
//! ## Example Configuration
//!
//! ```yaml
//! device:
//!   native_sample_rate: 625e6
//!   output_sample_rate: 1e9
//!   sample_count: 65536
//!   channel_count: 4
//!   levels_mv: [2000, 2000, 2000, 2000]
//!
//! array:
//!   element_spacing: 0.06
//!   carrier_frequency_hz: 3.5e9
//!
//! steering:
//!   beam_angle_deg: 15.0
//!
//! signal:
//!   rf_frequency_hz: 75e6
//!   packing:
//!     mode: round_robin
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::packer::PackingStrategy;
use crate::units::wavelength_from_frequency;
use crate::visualization::PlotSettings;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "BEAMDAC_CONFIG";

/// Error type for configuration operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("config not found: {0}")]
    NotFound(String),
    /// Failed to read or write the configuration file
    #[error("failed to read config: {0}")]
    Read(String),
    /// Failed to parse or serialize the configuration
    #[error("failed to parse config: {0}")]
    Parse(String),
    /// Invalid configuration value
    #[error("invalid config: {0}")]
    Validation(String),
}

/// Output card settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// DAC clock in Hz
    pub native_sample_rate: f64,
    /// Virtual synthesis rate in Hz
    pub output_sample_rate: f64,
    /// Samples per channel in one buffer
    pub sample_count: usize,
    /// Enabled output channels, one per array element
    pub channel_count: usize,
    /// Upper bound accepted for `levels_mv`
    pub max_level_mv: u32,
    /// Full-scale output level per channel in millivolts
    pub levels_mv: Vec<u32>,
    /// Output filter index passed through to the card (1 selects the 65 MHz filter)
    pub output_filter: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            native_sample_rate: 625e6,
            output_sample_rate: 1e9,
            sample_count: 65_536,
            channel_count: 4,
            max_level_mv: 2000,
            levels_mv: vec![2000; 4],
            output_filter: 1,
        }
    }
}

/// Uniform linear array geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrayConfig {
    /// Distance between neighbouring elements in metres
    pub element_spacing: f64,
    /// Carrier the array radiates, used to derive the wavelength
    pub carrier_frequency_hz: f64,
    /// Explicit wavelength in metres; overrides `carrier_frequency_hz`
    pub wavelength: Option<f64>,
    /// Per-element weights in [-1, 1]; empty means uniform
    pub element_amplitudes: Vec<f64>,
}

impl Default for ArrayConfig {
    fn default() -> Self {
        Self {
            element_spacing: 0.06,
            carrier_frequency_hz: 3.5e9,
            wavelength: None,
            element_amplitudes: Vec::new(),
        }
    }
}

impl ArrayConfig {
    /// Effective wavelength in metres.
    pub fn wavelength(&self) -> f64 {
        self.wavelength
            .unwrap_or_else(|| wavelength_from_frequency(self.carrier_frequency_hz))
    }

    /// Element weights expanded to `count` entries.
    pub fn amplitudes(&self, count: usize) -> Vec<f64> {
        if self.element_amplitudes.is_empty() {
            vec![1.0; count]
        } else {
            self.element_amplitudes.clone()
        }
    }
}

/// Beam direction. A beam angle, when given, wins over the raw phase step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    /// Inter-element phase step in degrees
    pub phase_step_deg: f64,
    /// Desired main-lobe direction from broadside in degrees
    pub beam_angle_deg: Option<f64>,
}

/// RF tone and buffer layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Requested tone frequency in Hz, before the sampling correction
    pub rf_frequency_hz: f64,
    pub packing: PackingStrategy,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            rf_frequency_hz: 75e6,
            packing: PackingStrategy::RoundRobin,
        }
    }
}

/// Complete beamformer configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamdacConfig {
    pub device: DeviceConfig,
    pub array: ArrayConfig,
    pub steering: SteeringConfig,
    pub signal: SignalConfig,
    pub plot: PlotSettings,
}

impl BeamdacConfig {
    /// Load configuration from standard locations.
    ///
    /// Search order:
    /// 1. `BEAMDAC_CONFIG` environment variable
    /// 2. `./beamdac.yaml`
    /// 3. `~/.config/beamdac/config.yaml`
    /// 4. `/etc/beamdac/config.yaml`
    ///
    /// Returns default config if no file is found. A `BEAMDAC_CONFIG` that
    /// points at a missing file is an error.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(ConfigError::NotFound(format!(
                    "{} points at {}",
                    CONFIG_ENV_VAR,
                    path.display()
                )));
            }
            return Self::load_from(&path);
        }

        for path in Self::config_search_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;

        debug!("Loaded config from {}", path.display());
        Self::parse(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_yaml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))
    }

    /// Get configuration search paths (after the environment variable).
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./beamdac.yaml")];

        if let Some(dirs) = directories::ProjectDirs::from("", "", "beamdac") {
            paths.push(dirs.config_dir().join("config.yaml"));
        }

        paths.push(PathBuf::from("/etc/beamdac/config.yaml"));

        paths
    }

    /// Validate the configuration.
    ///
    /// Catches what the typed constructors cannot see: cross-section
    /// consistency and device limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let device = &self.device;

        for (name, rate) in [
            ("native_sample_rate", device.native_sample_rate),
            ("output_sample_rate", device.output_sample_rate),
        ] {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(invalid(format!("{} must be positive, got {}", name, rate)));
            }
        }

        if device.sample_count == 0 {
            return Err(invalid("sample_count must be > 0"));
        }
        if device.channel_count == 0 {
            return Err(invalid("channel_count must be > 0"));
        }

        if device.levels_mv.len() != device.channel_count {
            return Err(invalid(format!(
                "{} output levels given for {} channels",
                device.levels_mv.len(),
                device.channel_count
            )));
        }
        if let Some((channel, level)) = device
            .levels_mv
            .iter()
            .enumerate()
            .find(|&(_, &mv)| mv > device.max_level_mv)
        {
            return Err(invalid(format!(
                "channel {} level {} mV exceeds {} mV",
                channel, level, device.max_level_mv
            )));
        }

        let array = &self.array;
        if !array.element_spacing.is_finite() || array.element_spacing <= 0.0 {
            return Err(invalid("element_spacing must be positive"));
        }
        let wavelength = array.wavelength();
        if !wavelength.is_finite() || wavelength <= 0.0 {
            return Err(invalid("wavelength must be positive"));
        }
        if !array.element_amplitudes.is_empty() && array.element_amplitudes.len() != device.channel_count {
            return Err(invalid(format!(
                "{} element amplitudes given for {} channels",
                array.element_amplitudes.len(),
                device.channel_count
            )));
        }
        if let Some(a) = array
            .element_amplitudes
            .iter()
            .find(|a| !a.is_finite() || !(-1.0..=1.0).contains(*a))
        {
            return Err(invalid(format!("element amplitude {} outside [-1, 1]", a)));
        }

        let steering = &self.steering;
        if !steering.phase_step_deg.is_finite() {
            return Err(invalid("phase_step_deg must be finite"));
        }
        if let Some(angle) = steering.beam_angle_deg {
            if !angle.is_finite() || !(-90.0..=90.0).contains(&angle) {
                return Err(invalid(format!("beam_angle_deg {} outside [-90, 90]", angle)));
            }
        }

        if !self.signal.rf_frequency_hz.is_finite() || self.signal.rf_frequency_hz < 0.0 {
            return Err(invalid("rf_frequency_hz must be non-negative"));
        }
        match self.signal.packing {
            PackingStrategy::Replicated { factor } if factor == 0 => {
                return Err(invalid("replication factor must be >= 1"));
            }
            PackingStrategy::Replicated { .. } if device.channel_count != 1 => {
                return Err(invalid("replicated packing drives exactly one channel"));
            }
            _ => {}
        }
        self.signal
            .packing
            .required_len(device.sample_count, device.channel_count)
            .map_err(|e| invalid(e.to_string()))?;

        if self.plot.db_floor >= 0.0 {
            return Err(invalid("plot.db_floor must be below 0 dB"));
        }

        Ok(())
    }

    /// Generate example configuration YAML.
    pub fn example_yaml() -> String {
        let config = Self {
            steering: SteeringConfig {
                phase_step_deg: 0.0,
                beam_angle_deg: Some(15.0),
            },
            ..Default::default()
        };

        serde_yaml::to_string(&config).unwrap_or_default()
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Validation(msg.into())
}
