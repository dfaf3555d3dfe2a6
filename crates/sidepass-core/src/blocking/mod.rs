//! Blocking-obstacle classification.
//!
//! An obstacle "blocks" the vehicle when waiting behind it would never make
//! progress: it is stationary, close ahead, leaves no room to squeeze past
//! inside the lane, and is not simply queued behind other traffic.
//!
//! The classification sits behind the [`BlockingPredicate`] trait so hosts
//! can swap in their own analyzer; [`ObstacleBlockingAnalyzer`] is the
//! default.

use tracing::debug;

use crate::config::SidePassConfig;
use crate::frame::{Frame, Obstacle, ReferenceLineInfo};

/// Obstacles starting farther ahead than this are never candidates.
pub const MAX_BLOCKING_DISTANCE: f64 = 15.0;

/// An obstacle with another one this close in front of it is queued, not
/// blocking.
pub const QUEUE_DISTANCE: f64 = 15.0;

/// Decides whether a single obstacle blocks the vehicle's path.
pub trait BlockingPredicate: Send + Sync {
    fn is_blocking(
        &self,
        frame: &Frame,
        reference_line: &ReferenceLineInfo,
        obstacle: &Obstacle,
        config: &SidePassConfig,
    ) -> bool;
}

// Compile-time assertion: BlockingPredicate must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn BlockingPredicate) {}
};

/// Signed gap between the vehicle's leading edge and the obstacle's rear.
///
/// Negative when the obstacle starts behind the leading edge.
pub fn distance_between_adc_and_obstacle(
    reference_line: &ReferenceLineInfo,
    obstacle: &Obstacle,
) -> f64 {
    obstacle.perception_sl_boundary.start_s - reference_line.adc_front_edge_s()
}

/// Default [`BlockingPredicate`] driven by [`SidePassConfig`] thresholds.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObstacleBlockingAnalyzer;

impl ObstacleBlockingAnalyzer {
    /// Whether the lane leaves too little room beside the obstacle for the
    /// vehicle to nudge past without changing lanes.
    fn is_blocking_driving_path(
        reference_line: &ReferenceLineInfo,
        obstacle: &Obstacle,
        config: &SidePassConfig,
    ) -> bool {
        let driving_width = reference_line.driving_width(&obstacle.perception_sl_boundary);
        let required = config.vehicle_width
            + config.static_obstacle_nudge_l_buffer
            + config.side_pass_driving_width_l_buffer;
        driving_width <= required
    }

    /// Another obstacle sitting right in front of this one, in the same
    /// lateral band.
    fn obstacle_in_front_of(frame: &Frame, obstacle: &Obstacle) -> Option<String> {
        let boundary = &obstacle.perception_sl_boundary;
        frame
            .obstacles
            .iter()
            .filter(|other| other.id != obstacle.id && !other.is_virtual)
            .filter(|other| boundary.overlaps_laterally(&other.perception_sl_boundary))
            .find(|other| {
                let delta_s = other.perception_sl_boundary.start_s - boundary.end_s;
                (0.0..=QUEUE_DISTANCE).contains(&delta_s)
            })
            .map(|other| other.id.clone())
    }
}

impl BlockingPredicate for ObstacleBlockingAnalyzer {
    fn is_blocking(
        &self,
        frame: &Frame,
        reference_line: &ReferenceLineInfo,
        obstacle: &Obstacle,
        config: &SidePassConfig,
    ) -> bool {
        if obstacle.is_virtual {
            return false;
        }
        if !obstacle.is_static || obstacle.speed > config.block_obstacle_min_speed {
            return false;
        }

        let distance = distance_between_adc_and_obstacle(reference_line, obstacle);
        if distance <= 0.0 {
            // Behind or alongside the vehicle.
            return false;
        }
        if distance > MAX_BLOCKING_DISTANCE {
            return false;
        }
        if distance < config.min_front_obstacle_distance {
            return false;
        }

        if !Self::is_blocking_driving_path(reference_line, obstacle, config) {
            return false;
        }

        if config.enable_obstacle_blocked_check {
            if let Some(front_id) = Self::obstacle_in_front_of(frame, obstacle) {
                debug!(
                    obstacle_id = %obstacle.id,
                    front_obstacle_id = %front_id,
                    "obstacle is blocked by another obstacle"
                );
                return false;
            }
        }

        true
    }
}
