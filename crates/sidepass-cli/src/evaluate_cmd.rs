//! `sidepass evaluate` command: one transfer decision for one snapshot.

use std::sync::Arc;

use serde::Serialize;

use sidepass_core::config::ScenarioConfig;
use sidepass_core::frame::Frame;
use sidepass_core::memory::{InMemoryScenarioMemory, ScenarioMemory};
use sidepass_core::scenario::{CurrentScenario, SidePassScenario};

/// Everything the operator needs to understand one decision.
#[derive(Debug, Serialize)]
pub struct EvaluateReport {
    pub sequence_num: u32,
    pub current: String,
    pub transferable: bool,
    pub reason: Option<String>,
    pub far_from_destination: bool,
    pub far_from_intersection: bool,
    /// Tracked blocking obstacle after the decision, empty when none.
    pub tracked_obstacle_id: String,
}

/// Evaluate the transfer decision for `frame` as if `current` were active
/// and `tracked` were the obstacle remembered from earlier cycles.
pub fn evaluate(
    config: &ScenarioConfig,
    frame: &Frame,
    current: CurrentScenario,
    tracked: Option<&str>,
) -> EvaluateReport {
    let memory = Arc::new(InMemoryScenarioMemory::new());
    if let Some(id) = tracked {
        memory.set_side_pass_front_blocking_obstacle_id(id);
    }
    let mut scenario = SidePassScenario::new(config.clone(), memory.clone());

    let verdict = scenario.is_transferable(current, frame);
    EvaluateReport {
        sequence_num: frame.sequence_num,
        current: format!("{} ({})", current.scenario_type, current.status),
        transferable: verdict.transferable,
        reason: verdict.reason,
        far_from_destination: scenario.is_far_from_destination(frame),
        far_from_intersection: scenario.is_far_from_intersection(frame),
        tracked_obstacle_id: memory.side_pass_front_blocking_obstacle_id(),
    }
}

/// Print `report` for humans.
pub fn print_report(report: &EvaluateReport) {
    let verdict = if report.transferable { "SIDE PASS" } else { "NO" };
    println!("Frame {}: {verdict}", report.sequence_num);
    println!("  current:               {}", report.current);
    if let Some(reason) = &report.reason {
        println!("  reason:                {reason}");
    }
    println!("  far from destination:  {}", report.far_from_destination);
    println!("  far from intersection: {}", report.far_from_intersection);
    let tracked = if report.tracked_obstacle_id.is_empty() {
        "-"
    } else {
        report.tracked_obstacle_id.as_str()
    };
    println!("  tracked obstacle:      {tracked}");
}
