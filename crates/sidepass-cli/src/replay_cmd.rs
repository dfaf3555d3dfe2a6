//! `sidepass replay` command: drive recorded snapshots through a minimal
//! planner loop that switches between lane following and the side-pass.
//!
//! Each cycle mirrors what the host planner does:
//!
//! - while following the lane, ask whether to transfer; on entry build a
//!   fresh scenario (it picks the tracked obstacle up from memory) and run
//!   its first stage in the same cycle;
//! - while side-passing, re-validate first and only then run the current
//!   stage; a negative verdict drops back to lane following.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use sidepass_core::config::ScenarioConfig;
use sidepass_core::frame::Frame;
use sidepass_core::memory::InMemoryScenarioMemory;
use sidepass_core::scenario::{CurrentScenario, SidePassScenario};
use sidepass_core::types::{ScenarioStatus, ScenarioType, StageType};

/// What happened in one planning cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub sequence_num: u32,
    pub scenario: ScenarioType,
    /// Side-pass status after the cycle; `None` while following the lane.
    pub status: Option<ScenarioStatus>,
    pub stage: Option<StageType>,
    pub obstacle_id: String,
    /// Transfer reason, set on the cycles that enter or stay in the
    /// side-pass.
    pub message: Option<String>,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:<4} {:<10}", self.sequence_num, self.scenario.to_string())?;
        if let Some(status) = self.status {
            write!(f, " {:<10}", status.to_string())?;
        }
        if let Some(stage) = self.stage {
            write!(f, " stage={stage}")?;
        }
        if !self.obstacle_id.is_empty() {
            write!(f, " obstacle={}", self.obstacle_id)?;
        }
        Ok(())
    }
}

/// Run every frame through the planner loop, in order.
pub fn run_replay(config: &ScenarioConfig, frames: &[Frame]) -> Vec<CycleReport> {
    let memory = Arc::new(InMemoryScenarioMemory::new());
    let mut active: Option<SidePassScenario> = None;
    let mut reports = Vec::with_capacity(frames.len());

    for frame in frames {
        let report = match active.as_mut() {
            Some(scenario) => {
                let verdict = scenario.is_transferable(scenario.current(), frame);
                if verdict.transferable {
                    let status = scenario.process(frame);
                    Some(side_pass_report(frame, scenario, status, verdict.reason))
                } else {
                    info!(sequence_num = frame.sequence_num, "back to lane_follow");
                    None
                }
            }
            None => {
                let mut probe = SidePassScenario::new(config.clone(), memory.clone());
                let verdict = probe.is_transferable(CurrentScenario::lane_follow(), frame);
                if verdict.transferable {
                    let mut scenario = SidePassScenario::new(config.clone(), memory.clone());
                    let status = scenario.process(frame);
                    let report = side_pass_report(frame, &scenario, status, verdict.reason);
                    active = Some(scenario);
                    Some(report)
                } else {
                    None
                }
            }
        };

        let report = report.unwrap_or_else(|| {
            active = None;
            CycleReport {
                sequence_num: frame.sequence_num,
                scenario: ScenarioType::LaneFollow,
                status: None,
                stage: None,
                obstacle_id: String::new(),
                message: None,
            }
        });
        reports.push(report);
    }
    reports
}

fn side_pass_report(
    frame: &Frame,
    scenario: &SidePassScenario,
    status: ScenarioStatus,
    message: Option<String>,
) -> CycleReport {
    CycleReport {
        sequence_num: frame.sequence_num,
        scenario: scenario.scenario_type(),
        status: Some(status),
        stage: scenario.current_stage_type(),
        obstacle_id: scenario.context().front_blocking_obstacle_id().to_owned(),
        message,
    }
}
