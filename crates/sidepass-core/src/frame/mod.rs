//! Per-cycle world snapshot consumed by the side-pass decision logic.
//!
//! A [`Frame`] is read-only for the duration of a planning cycle. It carries
//! the path candidates ([`ReferenceLineInfo`]) and the obstacles perceived
//! around the vehicle, all expressed in path (s, l) coordinates: `s` grows
//! along the direction of travel, `l` grows to the left of the path.
//!
//! Frames are plain data so recorded snapshots can be replayed from JSON.

use serde::{Deserialize, Serialize};

/// Longitudinal/lateral extent of an object projected onto the path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SlBoundary {
    pub start_s: f64,
    pub end_s: f64,
    pub start_l: f64,
    pub end_l: f64,
}

impl SlBoundary {
    pub fn new(start_s: f64, end_s: f64, start_l: f64, end_l: f64) -> Self {
        Self {
            start_s,
            end_s,
            start_l,
            end_l,
        }
    }

    /// Whether the lateral extents of `self` and `other` intersect.
    pub fn overlaps_laterally(&self, other: &SlBoundary) -> bool {
        !(other.start_l > self.end_l || other.end_l < self.start_l)
    }
}

/// Kind of map region the path runs through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapType {
    ClearArea,
    Crosswalk,
    PncJunction,
    Signal,
    StopSign,
}

impl std::fmt::Display for OverlapType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ClearArea => "clear_area",
            Self::Crosswalk => "crosswalk",
            Self::PncJunction => "pnc_junction",
            Self::Signal => "signal",
            Self::StopSign => "stop_sign",
        };
        f.write_str(s)
    }
}

/// The stretch of path covered by a map object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathOverlap {
    #[serde(default)]
    pub object_id: String,
    pub start_s: f64,
    pub end_s: f64,
}

/// The first region of a given kind encountered ahead on the path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirstEncounteredOverlap {
    pub overlap_type: OverlapType,
    pub overlap: PathOverlap,
}

/// One path candidate and the vehicle's position on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLineInfo {
    /// Footprint of the ego vehicle; `end_s` is its leading edge.
    pub adc_sl_boundary: SlBoundary,
    /// Ego speed along the path.
    #[serde(default)]
    pub adc_speed: f64,
    /// Remaining path length to the routing destination.
    pub distance_to_destination: f64,
    #[serde(default)]
    pub first_encountered_overlaps: Vec<FirstEncounteredOverlap>,
    /// Lane width to the left of the reference line.
    #[serde(default = "default_half_lane_width")]
    pub lane_left_width: f64,
    /// Lane width to the right of the reference line.
    #[serde(default = "default_half_lane_width")]
    pub lane_right_width: f64,
}

fn default_half_lane_width() -> f64 {
    1.75
}

impl ReferenceLineInfo {
    /// Leading edge of the ego vehicle along the path.
    pub fn adc_front_edge_s(&self) -> f64 {
        self.adc_sl_boundary.end_s
    }

    /// Widest free lateral gap left beside an object inside the lane.
    ///
    /// Never exceeds the full lane width.
    pub fn driving_width(&self, boundary: &SlBoundary) -> f64 {
        let left_gap = self.lane_left_width - boundary.end_l;
        let right_gap = self.lane_right_width + boundary.start_l;
        left_gap
            .max(right_gap)
            .min(self.lane_left_width + self.lane_right_width)
    }
}

/// A perceived obstacle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: String,
    /// Virtual obstacles (stop walls, fences) are planner artefacts.
    #[serde(default)]
    pub is_virtual: bool,
    pub is_static: bool,
    #[serde(default)]
    pub speed: f64,
    pub perception_sl_boundary: SlBoundary,
}

/// Read-only world snapshot for one planning cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default)]
    pub sequence_num: u32,
    pub reference_line_info: Vec<ReferenceLineInfo>,
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
}

impl Frame {
    /// Parse a frame from its JSON representation.
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// The only path candidate, or `None` when there is not exactly one.
    pub fn sole_reference_line(&self) -> Option<&ReferenceLineInfo> {
        match self.reference_line_info.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    /// Look up an obstacle by identifier.
    pub fn find(&self, id: &str) -> Option<&Obstacle> {
        self.obstacles.iter().find(|o| o.id == id)
    }
}
