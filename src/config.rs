use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::crops::{default_crops, CropCatalog, CropDefinition};
use crate::weather::{Weather, TEMPERATURE_MAX_F, TEMPERATURE_MIN_F};

pub const DEFAULT_MODEL_ID: &str = "anthropic.claude-3-5-sonnet-20241022-v2:0";
pub const DEFAULT_REGION: &str = "us-west-2";

fn default_rows() -> usize {
    6
}

fn default_cols() -> usize {
    6
}

fn default_day() -> u64 {
    1
}

fn default_money() -> u64 {
    1000
}

fn default_temperature() -> u32 {
    75
}

fn default_moisture() -> u32 {
    60
}

fn default_bonus() -> f64 {
    1.0
}

fn default_notification_ttl_secs() -> u64 {
    3
}

fn default_model_id() -> String {
    DEFAULT_MODEL_ID.to_string()
}

fn default_max_tokens() -> u32 {
    500
}

fn default_sampling_temperature() -> f64 {
    0.7
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("grid must have at least one row and one column")]
    EmptyGrid,
    #[error("crop catalog is empty")]
    EmptyCatalog,
    #[error("crop kind {0} is defined more than once")]
    DuplicateCrop(String),
    #[error("crop {0} must take at least one day to grow")]
    ZeroGrowthTime(String),
    #[error("crop {kind} has temp_range min {min} above max {max}")]
    InvertedTempRange { kind: String, min: u32, max: u32 },
    #[error("bonus multipliers must be finite and non-negative")]
    InvalidBonus,
    #[error("starting moisture {0}% is above 100%")]
    MoistureOutOfRange(u32),
    #[error("starting temperature {0}°F is outside the 55..=95°F weather range")]
    TemperatureOutOfRange(u32),
}

#[derive(Debug, Clone, Deserialize)]
pub struct FarmConfig {
    #[serde(default)]
    pub name: Option<String>,
    /// Fixed seed for reproducible weather. Drawn from entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub start: StartingState,
    #[serde(default = "default_notification_ttl_secs")]
    pub notification_ttl_secs: u64,
    #[serde(default)]
    pub advisor: AdvisorSettings,
    #[serde(default = "default_crops")]
    pub crops: Vec<CropDefinition>,
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            name: None,
            seed: None,
            grid: GridConfig::default(),
            start: StartingState::default(),
            notification_ttl_secs: default_notification_ttl_secs(),
            advisor: AdvisorSettings::default(),
            crops: default_crops(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_rows")]
    pub rows: usize,
    #[serde(default = "default_cols")]
    pub cols: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: default_rows(),
            cols: default_cols(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartingState {
    #[serde(default = "default_day")]
    pub day: u64,
    #[serde(default = "default_money")]
    pub money: u64,
    #[serde(default)]
    pub loans: u64,
    #[serde(default)]
    pub weather: Weather,
    #[serde(default = "default_temperature")]
    pub temperature: u32,
    #[serde(default = "default_moisture")]
    pub moisture: u32,
    #[serde(default = "default_bonus")]
    pub temp_bonus: f64,
    #[serde(default = "default_bonus")]
    pub moisture_bonus: f64,
}

impl Default for StartingState {
    fn default() -> Self {
        Self {
            day: default_day(),
            money: default_money(),
            loans: 0,
            weather: Weather::Sunny,
            temperature: default_temperature(),
            moisture: default_moisture(),
            temp_bonus: default_bonus(),
            moisture_bonus: default_bonus(),
        }
    }
}

/// Model parameters for the advisory service. Credentials and region come
/// from the environment, see [`crate::advisor::AdvisorConfig::from_env`].
#[derive(Debug, Clone, Deserialize)]
pub struct AdvisorSettings {
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_sampling_temperature")]
    pub temperature: f64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AdvisorSettings {
    fn default() -> Self {
        Self {
            model_id: default_model_id(),
            max_tokens: default_max_tokens(),
            temperature: default_sampling_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl FarmConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.rows == 0 || self.grid.cols == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        if self.crops.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }

        let mut known = HashSet::new();
        for crop in &self.crops {
            if !known.insert(crop.kind.clone()) {
                return Err(ConfigError::DuplicateCrop(crop.kind.to_string()));
            }
            if crop.growth_time == 0 {
                return Err(ConfigError::ZeroGrowthTime(crop.kind.to_string()));
            }
            if crop.temp_range.min > crop.temp_range.max {
                return Err(ConfigError::InvertedTempRange {
                    kind: crop.kind.to_string(),
                    min: crop.temp_range.min,
                    max: crop.temp_range.max,
                });
            }
        }

        if self.start.moisture > 100 {
            return Err(ConfigError::MoistureOutOfRange(self.start.moisture));
        }
        if !(TEMPERATURE_MIN_F..=TEMPERATURE_MAX_F).contains(&self.start.temperature) {
            return Err(ConfigError::TemperatureOutOfRange(self.start.temperature));
        }

        for bonus in [self.start.temp_bonus, self.start.moisture_bonus] {
            if !bonus.is_finite() || bonus < 0.0 {
                return Err(ConfigError::InvalidBonus);
            }
        }
        Ok(())
    }

    pub fn catalog(&self) -> CropCatalog {
        CropCatalog::new(self.crops.clone())
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_secs(self.notification_ttl_secs)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Smart Farm")
    }
}

pub struct FarmConfigLoader {
    base_dir: PathBuf,
}

impl FarmConfigLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<FarmConfig> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read farm config {}", path.display()))?;
        let config: FarmConfig = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid farm config {}", path.display()))?;
        Ok(config)
    }
}
