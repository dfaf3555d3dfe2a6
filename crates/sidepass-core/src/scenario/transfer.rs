//! Scenario transfer policy: should the planner be in the side-pass this
//! cycle?
//!
//! The decision depends on which scenario is active:
//!
//! - **side_pass**: stay only while the tracked obstacle still exists, is
//!   still static, is within `max_side_pass_distance`, and the scenario is
//!   not done.
//! - **lane_follow**: enter when the vehicle is far from the destination and
//!   from intersections and a blocking obstacle sits ahead.
//! - **anything else**: never transfer; the side-pass is only entered from
//!   lane following.
//!
//! Every branch vetoes when the frame does not carry exactly one path
//! candidate.

use tracing::{debug, info, warn};

use crate::blocking::distance_between_adc_and_obstacle;
use crate::frame::{Frame, Obstacle};
use crate::types::{ScenarioStatus, ScenarioType};

use super::SidePassScenario;
use super::gate;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The scenario the planner is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentScenario {
    pub scenario_type: ScenarioType,
    pub status: ScenarioStatus,
}

impl CurrentScenario {
    pub fn new(scenario_type: ScenarioType, status: ScenarioStatus) -> Self {
        Self {
            scenario_type,
            status,
        }
    }

    pub fn lane_follow() -> Self {
        Self::new(ScenarioType::LaneFollow, ScenarioStatus::Processing)
    }
}

/// Outcome of one transfer decision.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransferVerdict {
    /// Whether the planner should be (or stay) in the side-pass.
    pub transferable: bool,
    /// Operator-facing reason, present when `transferable` is true.
    pub reason: Option<String>,
}

impl TransferVerdict {
    pub fn transfer(reason: impl Into<String>) -> Self {
        Self {
            transferable: true,
            reason: Some(reason.into()),
        }
    }

    pub fn veto() -> Self {
        Self::default()
    }
}

fn side_pass_message(obstacle_id: &str) -> String {
    format!("side pass obstacle: {obstacle_id}")
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

impl SidePassScenario {
    /// Decide whether the planner should be in the side-pass this cycle,
    /// given the scenario that is currently active.
    pub fn is_transferable(&mut self, current: CurrentScenario, frame: &Frame) -> TransferVerdict {
        self.context.refresh(self.memory.as_ref());
        if frame.sole_reference_line().is_none() {
            warn!(
                candidates = frame.reference_line_info.len(),
                "expected exactly one path candidate; not side-passing"
            );
            return TransferVerdict::veto();
        }

        match current.scenario_type {
            ScenarioType::SidePass => self.should_stay(current.status, frame),
            ScenarioType::LaneFollow => self.should_enter(frame),
            other => {
                debug!(scenario = %other, "side-pass is only entered from lane_follow");
                TransferVerdict::veto()
            }
        }
    }

    /// Re-validate the active maneuver against the current snapshot.
    fn should_stay(&mut self, status: ScenarioStatus, frame: &Frame) -> TransferVerdict {
        let obstacle_id = self.context.front_blocking_obstacle_id().to_owned();
        let Some(reference_line) = frame.sole_reference_line() else {
            return TransferVerdict::veto();
        };

        let Some(obstacle) = frame.find(&obstacle_id) else {
            info!(obstacle_id = %obstacle_id, "obstacle no longer exists; leaving side-pass");
            return TransferVerdict::veto();
        };
        if !obstacle.is_static {
            info!(obstacle_id = %obstacle_id, "obstacle started moving; leaving side-pass");
            return TransferVerdict::veto();
        }

        let distance = distance_between_adc_and_obstacle(reference_line, obstacle);
        let max_distance = self.context.config().max_side_pass_distance;
        if distance.is_nan() || distance > max_distance {
            info!(
                obstacle_id = %obstacle_id,
                distance,
                max_distance,
                "obstacle too far ahead; leaving side-pass"
            );
            return TransferVerdict::veto();
        }

        self.msg = side_pass_message(&obstacle_id);
        if status == ScenarioStatus::Done {
            debug!(obstacle_id = %obstacle_id, "side-pass scenario done");
            return TransferVerdict::veto();
        }
        TransferVerdict::transfer(self.msg.clone())
    }

    /// Decide whether to switch from lane following into the side-pass.
    fn should_enter(&mut self, frame: &Frame) -> TransferVerdict {
        debug!("checking whether to switch from lane_follow to side_pass");
        if !self.is_side_pass_scenario(frame) {
            return TransferVerdict::veto();
        }
        self.msg = side_pass_message(self.context.front_blocking_obstacle_id());
        info!(
            obstacle_id = %self.context.front_blocking_obstacle_id(),
            "entering side-pass"
        );
        TransferVerdict::transfer(self.msg.clone())
    }

    /// Entry eligibility: far from destination and intersections, slow
    /// enough, and facing a passable blocking obstacle.
    pub fn is_side_pass_scenario(&mut self, frame: &Frame) -> bool {
        if !(self.is_far_from_destination(frame)
            && self.is_far_from_intersection(frame)
            && gate::is_within_side_passing_speed(frame)
            && self.has_blocking_obstacle(frame))
        {
            return false;
        }
        frame.sole_reference_line().is_some_and(|reference_line| {
            gate::is_side_passable_obstacle(
                frame,
                reference_line,
                self.context.front_blocking_obstacle_id(),
            )
        })
    }

    pub fn is_far_from_destination(&self, frame: &Frame) -> bool {
        gate::is_far_from_destination(frame, self.context.config())
    }

    pub fn is_far_from_intersection(&self, frame: &Frame) -> bool {
        gate::is_far_from_intersection(frame, self.context.config())
    }

    /// Scan the snapshot for blocking obstacles and track the closest one.
    ///
    /// Updates the context and the cross-cycle memory with the closest
    /// blocking obstacle, or clears both when there is none. Among equally
    /// close obstacles the first in snapshot order wins. An ambiguous frame
    /// returns `false` and leaves the tracked obstacle untouched.
    pub fn has_blocking_obstacle(&mut self, frame: &Frame) -> bool {
        let Some(reference_line) = frame.sole_reference_line() else {
            return false;
        };

        let config = self.context.config();
        let mut closest: Option<(&Obstacle, f64)> = None;
        for obstacle in &frame.obstacles {
            if !self
                .blocking
                .is_blocking(frame, reference_line, obstacle, config)
            {
                continue;
            }
            let distance = distance_between_adc_and_obstacle(reference_line, obstacle);
            if closest.is_none_or(|(_, best)| distance < best) {
                closest = Some((obstacle, distance));
            }
        }

        let tracked = closest.map_or("", |(obstacle, _)| obstacle.id.as_str());
        if let Some((obstacle, distance)) = closest {
            debug!(obstacle_id = %obstacle.id, distance, "closest blocking obstacle");
        }
        self.context
            .track_front_blocking_obstacle(tracked, self.memory.as_ref());
        closest.is_some()
    }
}
