//! Proximity gate: keeps the side-pass out of places where steering around
//! an obstacle is unsafe (near the destination, intersections, crosswalks).
//!
//! Every gate vetoes when the frame does not carry exactly one path
//! candidate.

use tracing::debug;

use crate::config::SidePassConfig;
use crate::frame::{Frame, OverlapType, ReferenceLineInfo};

/// Whether the remaining route is long enough to complete a side-pass.
///
/// A distance exactly equal to `clear_distance` is allowed; a NaN distance
/// vetoes.
pub fn is_far_from_destination(frame: &Frame, config: &SidePassConfig) -> bool {
    let Some(reference_line) = frame.sole_reference_line() else {
        return false;
    };
    let distance = reference_line.distance_to_destination;
    if distance.is_nan() || distance < config.clear_distance {
        debug!(distance, "too close to destination; don't side-pass");
        return false;
    }
    true
}

/// Whether an overlap kind participates in the intersection gate.
fn is_gated_overlap(overlap_type: OverlapType, config: &SidePassConfig) -> bool {
    match overlap_type {
        OverlapType::ClearArea
        | OverlapType::Crosswalk
        | OverlapType::Signal
        | OverlapType::StopSign => true,
        OverlapType::PncJunction => config.gate_on_pnc_junction,
    }
}

/// Whether every relevant overlap ahead is far enough away.
///
/// Signal-controlled intersections use `min_signal_intersection_distance`;
/// every other gated kind uses `clear_distance`. An overlap whose distance
/// is NaN vetoes.
pub fn is_far_from_intersection(frame: &Frame, config: &SidePassConfig) -> bool {
    let Some(reference_line) = frame.sole_reference_line() else {
        return false;
    };
    let adc_front_edge_s = reference_line.adc_front_edge_s();

    for encountered in &reference_line.first_encountered_overlaps {
        let overlap_type = encountered.overlap_type;
        if !is_gated_overlap(overlap_type, config) {
            continue;
        }

        let distance = encountered.overlap.start_s - adc_front_edge_s;
        let min_distance = match overlap_type {
            OverlapType::Signal => config.min_signal_intersection_distance,
            _ => config.clear_distance,
        };
        if distance.is_nan() || distance < min_distance {
            debug!(
                overlap = %overlap_type,
                object_id = %encountered.overlap.object_id,
                distance,
                "too close to overlap; don't side-pass"
            );
            return false;
        }
    }
    true
}

/// Whether the vehicle is slow enough to start a side-pass.
///
/// Always true for now; entry speed is not limited.
pub fn is_within_side_passing_speed(_frame: &Frame) -> bool {
    true
}

/// Whether the chosen obstacle can actually be driven around (as opposed to
/// merely blocking).
///
/// Always true for now; every blocking obstacle is treated as passable.
pub fn is_side_passable_obstacle(
    _frame: &Frame,
    _reference_line: &ReferenceLineInfo,
    _obstacle_id: &str,
) -> bool {
    true
}
