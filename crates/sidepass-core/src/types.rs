use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Top-level driving behaviour the planner can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioType {
    LaneFollow,
    SidePass,
    StopSignUnprotected,
    TrafficLightProtected,
    PullOver,
}

impl fmt::Display for ScenarioType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::LaneFollow => "lane_follow",
            Self::SidePass => "side_pass",
            Self::StopSignUnprotected => "stop_sign_unprotected",
            Self::TrafficLightProtected => "traffic_light_protected",
            Self::PullOver => "pull_over",
        };
        f.write_str(s)
    }
}

impl FromStr for ScenarioType {
    type Err = ScenarioTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lane_follow" => Ok(Self::LaneFollow),
            "side_pass" => Ok(Self::SidePass),
            "stop_sign_unprotected" => Ok(Self::StopSignUnprotected),
            "traffic_light_protected" => Ok(Self::TrafficLightProtected),
            "pull_over" => Ok(Self::PullOver),
            other => Err(ScenarioTypeParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`ScenarioType`] string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid scenario type: {0:?}")]
pub struct ScenarioTypeParseError(pub String);

// ---------------------------------------------------------------------------

/// Coarse progress of a scenario, as seen by the planner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    #[default]
    Unknown,
    Processing,
    Done,
}

impl fmt::Display for ScenarioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unknown => "unknown",
            Self::Processing => "processing",
            Self::Done => "done",
        };
        f.write_str(s)
    }
}

impl FromStr for ScenarioStatus {
    type Err = ScenarioStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unknown" => Ok(Self::Unknown),
            "processing" => Ok(Self::Processing),
            "done" => Ok(Self::Done),
            other => Err(ScenarioStatusParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`ScenarioStatus`] string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid scenario status: {0:?}")]
pub struct ScenarioStatusParseError(pub String);

// ---------------------------------------------------------------------------

/// Identifier of one ordered phase within a scenario.
///
/// The set is shared by every scenario; each variant belongs to exactly one
/// scenario (see [`StageType::scenario_type`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageType {
    LaneFollowDefault,
    SidePassDefault,
    SidePassApproachObstacle,
    SidePassDetectSafety,
    SidePassGeneratePath,
    SidePassPassObstacle,
    SidePassStopOnWaitPoint,
    SidePassBackup,
    StopSignUnprotectedPreStop,
}

impl StageType {
    /// The scenario this stage runs under.
    pub fn scenario_type(self) -> ScenarioType {
        match self {
            Self::LaneFollowDefault => ScenarioType::LaneFollow,
            Self::SidePassDefault
            | Self::SidePassApproachObstacle
            | Self::SidePassDetectSafety
            | Self::SidePassGeneratePath
            | Self::SidePassPassObstacle
            | Self::SidePassStopOnWaitPoint
            | Self::SidePassBackup => ScenarioType::SidePass,
            Self::StopSignUnprotectedPreStop => ScenarioType::StopSignUnprotected,
        }
    }
}

impl fmt::Display for StageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::LaneFollowDefault => "lane_follow_default",
            Self::SidePassDefault => "side_pass_default",
            Self::SidePassApproachObstacle => "side_pass_approach_obstacle",
            Self::SidePassDetectSafety => "side_pass_detect_safety",
            Self::SidePassGeneratePath => "side_pass_generate_path",
            Self::SidePassPassObstacle => "side_pass_pass_obstacle",
            Self::SidePassStopOnWaitPoint => "side_pass_stop_on_wait_point",
            Self::SidePassBackup => "side_pass_backup",
            Self::StopSignUnprotectedPreStop => "stop_sign_unprotected_pre_stop",
        };
        f.write_str(s)
    }
}

impl FromStr for StageType {
    type Err = StageTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lane_follow_default" => Ok(Self::LaneFollowDefault),
            "side_pass_default" => Ok(Self::SidePassDefault),
            "side_pass_approach_obstacle" => Ok(Self::SidePassApproachObstacle),
            "side_pass_detect_safety" => Ok(Self::SidePassDetectSafety),
            "side_pass_generate_path" => Ok(Self::SidePassGeneratePath),
            "side_pass_pass_obstacle" => Ok(Self::SidePassPassObstacle),
            "side_pass_stop_on_wait_point" => Ok(Self::SidePassStopOnWaitPoint),
            "side_pass_backup" => Ok(Self::SidePassBackup),
            "stop_sign_unprotected_pre_stop" => Ok(Self::StopSignUnprotectedPreStop),
            other => Err(StageTypeParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`StageType`] string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid stage type: {0:?}")]
pub struct StageTypeParseError(pub String);

// ---------------------------------------------------------------------------

/// Result of running a stage for one planning cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Error,
    Ready,
    Running,
    Finished,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Error => "error",
            Self::Ready => "ready",
            Self::Running => "running",
            Self::Finished => "finished",
        };
        f.write_str(s)
    }
}
