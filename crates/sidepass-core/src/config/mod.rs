//! Scenario configuration: thresholds, toggles and the stage pipeline.
//!
//! Configuration is TOML. A default pipeline is embedded in the library at
//! compile time (`side_pass.toml`) and used whenever the host supplies no
//! file of its own.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{ScenarioType, StageType};

/// Errors that can occur while loading or validating a scenario config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("scenario config is for {0}, expected side_pass")]
    WrongScenario(ScenarioType),

    #[error("scenario config must list at least one stage")]
    NoStages,

    #[error("stage {0} does not belong to the side_pass scenario")]
    ForeignStage(StageType),

    #[error("stage {0} is listed in stage_type but has no stage_config entry")]
    MissingStageConfig(StageType),

    #[error("duplicate stage_config entry for {0}")]
    DuplicateStageConfig(StageType),

    #[error("{field} must be a non-negative number, got {value}")]
    InvalidThreshold { field: &'static str, value: f64 },
}

/// Thresholds and toggles for entering and staying in a side-pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SidePassConfig {
    /// Obstacles faster than this are never considered blocking.
    pub block_obstacle_min_speed: f64,
    /// Obstacles closer than this to the leading edge are too near to pass.
    pub min_front_obstacle_distance: f64,
    /// Reject obstacles that are themselves queued behind other traffic.
    pub enable_obstacle_blocked_check: bool,
    /// Minimum gap to a signal-controlled intersection before entering.
    pub min_signal_intersection_distance: f64,
    /// Leave the maneuver once the tracked obstacle is farther than this.
    pub max_side_pass_distance: f64,
    /// Clearance required from the destination and from other overlaps.
    pub clear_distance: f64,
    /// Also veto entry near general (pnc) junctions.
    pub gate_on_pnc_junction: bool,
    pub vehicle_width: f64,
    pub static_obstacle_nudge_l_buffer: f64,
    pub side_pass_driving_width_l_buffer: f64,
}

impl Default for SidePassConfig {
    fn default() -> Self {
        Self {
            block_obstacle_min_speed: 0.1,
            min_front_obstacle_distance: 2.0,
            enable_obstacle_blocked_check: true,
            min_signal_intersection_distance: 50.0,
            max_side_pass_distance: 10.0,
            clear_distance: 15.0,
            gate_on_pnc_junction: false,
            vehicle_width: 2.11,
            static_obstacle_nudge_l_buffer: 0.3,
            side_pass_driving_width_l_buffer: 0.1,
        }
    }
}

impl SidePassConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("block_obstacle_min_speed", self.block_obstacle_min_speed),
            ("min_front_obstacle_distance", self.min_front_obstacle_distance),
            (
                "min_signal_intersection_distance",
                self.min_signal_intersection_distance,
            ),
            ("max_side_pass_distance", self.max_side_pass_distance),
            ("clear_distance", self.clear_distance),
            ("vehicle_width", self.vehicle_width),
            (
                "static_obstacle_nudge_l_buffer",
                self.static_obstacle_nudge_l_buffer,
            ),
            (
                "side_pass_driving_width_l_buffer",
                self.side_pass_driving_width_l_buffer,
            ),
        ];
        for (field, value) in fields {
            if value.is_nan() || value < 0.0 {
                return Err(ConfigError::InvalidThreshold { field, value });
            }
        }
        Ok(())
    }
}

/// Per-stage configuration handed to the stage constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    pub stage_type: StageType,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Free-form numeric tuning parameters, interpreted by the stage.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, f64>,
}

fn default_enabled() -> bool {
    true
}

impl StageConfig {
    pub fn new(stage_type: StageType) -> Self {
        Self {
            stage_type,
            enabled: true,
            params: BTreeMap::new(),
        }
    }

    /// Builder-style parameter override.
    pub fn with_param(mut self, name: &str, value: f64) -> Self {
        self.params.insert(name.to_owned(), value);
        self
    }

    /// Numeric parameter `name`, or `default` when not configured.
    pub fn param(&self, name: &str, default: f64) -> f64 {
        self.params.get(name).copied().unwrap_or(default)
    }
}

/// Complete configuration of the side-pass scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub scenario_type: ScenarioType,
    /// Stages in the order the scenario starts them.
    pub stage_type: Vec<StageType>,
    #[serde(default)]
    pub side_pass: SidePassConfig,
    #[serde(default)]
    pub stage_config: Vec<StageConfig>,
}

/// The embedded default configuration.
static DEFAULT_SCENARIO_TOML: &str = include_str!("side_pass.toml");

impl ScenarioConfig {
    /// Parse and validate a scenario config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ScenarioConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a scenario config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// The configuration embedded in the library.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed. The file ships with the
    /// crate and is covered by tests, so a built library always parses it.
    pub fn embedded() -> Self {
        Self::from_toml_str(DEFAULT_SCENARIO_TOML).expect("embedded side_pass.toml is invalid")
    }

    /// The raw embedded TOML text, for writing out as a starting point.
    pub fn embedded_toml() -> &'static str {
        DEFAULT_SCENARIO_TOML
    }

    /// Look up the configuration for a stage.
    pub fn stage_config(&self, stage_type: StageType) -> Option<&StageConfig> {
        self.stage_config.iter().find(|c| c.stage_type == stage_type)
    }

    /// The first stage of the pipeline.
    pub fn first_stage(&self) -> Option<StageType> {
        self.stage_type.first().copied()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.scenario_type != ScenarioType::SidePass {
            return Err(ConfigError::WrongScenario(self.scenario_type));
        }
        if self.stage_type.is_empty() {
            return Err(ConfigError::NoStages);
        }

        let mut seen = HashSet::new();
        for stage in &self.stage_config {
            if stage.stage_type.scenario_type() != ScenarioType::SidePass {
                return Err(ConfigError::ForeignStage(stage.stage_type));
            }
            if !seen.insert(stage.stage_type) {
                return Err(ConfigError::DuplicateStageConfig(stage.stage_type));
            }
        }

        for stage in &self.stage_type {
            if stage.scenario_type() != ScenarioType::SidePass {
                return Err(ConfigError::ForeignStage(*stage));
            }
            if !seen.contains(stage) {
                return Err(ConfigError::MissingStageConfig(*stage));
            }
        }

        self.side_pass.validate()
    }
}
