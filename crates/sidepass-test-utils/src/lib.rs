//! Shared test utilities for side-pass integration tests.
//!
//! Provides a [`FrameBuilder`] for assembling planning snapshots and a few
//! obstacle constructors. Unless overridden, a built frame has exactly one
//! path candidate with the ego vehicle occupying `s` in `[0, 5]` and `l` in
//! `[-1, 1]`, stopped, 200 from the destination, in a 3.5 wide lane.

use std::sync::Arc;

use sidepass_core::config::ScenarioConfig;
use sidepass_core::frame::{
    FirstEncounteredOverlap, Frame, Obstacle, OverlapType, PathOverlap, ReferenceLineInfo,
    SlBoundary,
};
use sidepass_core::memory::{InMemoryScenarioMemory, ScenarioMemory};

/// Length of the ego footprint along the path.
pub const ADC_LENGTH: f64 = 5.0;

/// Length of obstacles created by the constructors below.
pub const OBSTACLE_LENGTH: f64 = 4.0;

/// Builder for [`Frame`] snapshots.
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    sequence_num: u32,
    line: ReferenceLineInfo,
    reference_line_count: usize,
    obstacles: Vec<Obstacle>,
}

impl Default for FrameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self {
            sequence_num: 0,
            line: ReferenceLineInfo {
                adc_sl_boundary: SlBoundary::new(0.0, ADC_LENGTH, -1.0, 1.0),
                adc_speed: 0.0,
                distance_to_destination: 200.0,
                first_encountered_overlaps: Vec::new(),
                lane_left_width: 1.75,
                lane_right_width: 1.75,
            },
            reference_line_count: 1,
            obstacles: Vec::new(),
        }
    }

    pub fn sequence(mut self, sequence_num: u32) -> Self {
        self.sequence_num = sequence_num;
        self
    }

    /// Place the ego vehicle so its leading edge sits at `end_s`.
    pub fn adc_front_edge(mut self, end_s: f64) -> Self {
        self.line.adc_sl_boundary.start_s = end_s - ADC_LENGTH;
        self.line.adc_sl_boundary.end_s = end_s;
        self
    }

    pub fn adc_speed(mut self, speed: f64) -> Self {
        self.line.adc_speed = speed;
        self
    }

    pub fn distance_to_destination(mut self, distance: f64) -> Self {
        self.line.distance_to_destination = distance;
        self
    }

    /// Add a map region of `overlap_type` starting at `start_s` on the path.
    pub fn overlap(mut self, overlap_type: OverlapType, start_s: f64) -> Self {
        let overlaps = &mut self.line.first_encountered_overlaps;
        let object_id = format!("{overlap_type}_{}", overlaps.len());
        overlaps.push(FirstEncounteredOverlap {
            overlap_type,
            overlap: PathOverlap {
                object_id,
                start_s,
                end_s: start_s + 5.0,
            },
        });
        self
    }

    pub fn obstacle(mut self, obstacle: Obstacle) -> Self {
        self.obstacles.push(obstacle);
        self
    }

    /// Number of identical path candidates in the built frame.
    pub fn reference_lines(mut self, count: usize) -> Self {
        self.reference_line_count = count;
        self
    }

    pub fn build(self) -> Frame {
        Frame {
            sequence_num: self.sequence_num,
            reference_line_info: vec![self.line; self.reference_line_count],
            obstacles: self.obstacles,
        }
    }
}

/// A stationary obstacle centred in the lane, starting at `start_s`.
pub fn parked_obstacle(id: &str, start_s: f64) -> Obstacle {
    Obstacle {
        id: id.to_owned(),
        is_virtual: false,
        is_static: true,
        speed: 0.0,
        perception_sl_boundary: SlBoundary::new(start_s, start_s + OBSTACLE_LENGTH, -1.0, 1.0),
    }
}

/// A moving obstacle centred in the lane, starting at `start_s`.
pub fn moving_obstacle(id: &str, start_s: f64, speed: f64) -> Obstacle {
    Obstacle {
        is_static: false,
        speed,
        ..parked_obstacle(id, start_s)
    }
}

/// A planner-generated virtual obstacle (for example a stop wall).
pub fn virtual_obstacle(id: &str, start_s: f64) -> Obstacle {
    Obstacle {
        is_virtual: true,
        ..parked_obstacle(id, start_s)
    }
}

/// A cross-cycle store already tracking `obstacle_id`.
pub fn memory_tracking(obstacle_id: &str) -> Arc<InMemoryScenarioMemory> {
    let memory = Arc::new(InMemoryScenarioMemory::new());
    memory.set_side_pass_front_blocking_obstacle_id(obstacle_id);
    memory
}

/// The embedded configuration with the queue check disabled, so a single
/// parked obstacle counts as blocking regardless of what stands ahead of it.
pub fn config_without_blocked_check() -> ScenarioConfig {
    let mut config = ScenarioConfig::embedded();
    config.side_pass.enable_obstacle_blocked_check = false;
    config
}
