//! Integration tests for the side-pass stage lifecycle: stage creation
//! through the process-wide factory and the scenario driving loop.

use sidepass_core::config::ScenarioConfig;
use sidepass_core::frame::Frame;
use sidepass_core::scenario::SidePassScenario;
use sidepass_core::stage::stage_factory;
use sidepass_core::types::{ScenarioStatus, ScenarioType, StageType};

use sidepass_test_utils::{FrameBuilder, memory_tracking, moving_obstacle, parked_obstacle};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// The obstacle being passed occupies `s` in `[20, 24]`.
const VAN_START_S: f64 = 20.0;

fn scenario(config: ScenarioConfig) -> SidePassScenario {
    SidePassScenario::new(config, memory_tracking("van"))
}

/// Ego with its leading edge at `front`, the van, and optionally a car
/// driving through the passing corridor.
fn frame(front: f64, speed: f64, with_traffic: bool) -> Frame {
    let mut builder = FrameBuilder::new()
        .adc_front_edge(front)
        .adc_speed(speed)
        .obstacle(parked_obstacle("van", VAN_START_S));
    if with_traffic {
        builder = builder.obstacle(moving_obstacle("car", 28.0, 6.0));
    }
    builder.build()
}

/// Drive a fresh scenario from approach to the pass stage.
fn advance_to_pass(scenario: &mut SidePassScenario) {
    for _ in 0..3 {
        assert_eq!(
            scenario.process(&frame(14.0, 0.0, false)),
            ScenarioStatus::Processing
        );
    }
    assert_eq!(
        scenario.current_stage_type(),
        Some(StageType::SidePassPassObstacle)
    );
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

#[test]
fn factory_registers_every_side_pass_stage() {
    let types = stage_factory().registered_types();
    assert_eq!(types.len(), 7);
    assert!(
        types
            .iter()
            .all(|t| t.scenario_type() == ScenarioType::SidePass)
    );
    assert!(!stage_factory().contains(StageType::LaneFollowDefault));
}

// ---------------------------------------------------------------------------
// Driving loop
// ---------------------------------------------------------------------------

#[test]
fn safety_check_waits_for_traffic() {
    let mut scenario = scenario(ScenarioConfig::embedded());

    scenario.process(&frame(14.0, 0.0, false));
    assert_eq!(
        scenario.current_stage_type(),
        Some(StageType::SidePassDetectSafety)
    );

    for _ in 0..3 {
        assert_eq!(
            scenario.process(&frame(14.0, 0.0, true)),
            ScenarioStatus::Processing
        );
        assert_eq!(
            scenario.current_stage_type(),
            Some(StageType::SidePassDetectSafety)
        );
    }

    scenario.process(&frame(14.0, 0.0, false));
    assert_eq!(
        scenario.current_stage_type(),
        Some(StageType::SidePassGeneratePath)
    );
}

#[test]
fn pass_holds_at_wait_point_then_resumes() {
    let mut scenario = scenario(ScenarioConfig::embedded());
    advance_to_pass(&mut scenario);

    // Stopped alongside with traffic coming through.
    scenario.process(&frame(16.0, 0.0, true));
    assert_eq!(
        scenario.current_stage_type(),
        Some(StageType::SidePassStopOnWaitPoint)
    );
    scenario.process(&frame(16.0, 0.0, true));
    assert_eq!(
        scenario.current_stage_type(),
        Some(StageType::SidePassStopOnWaitPoint)
    );

    // Traffic gone: back to passing, then clear of the van.
    scenario.process(&frame(16.0, 0.0, false));
    assert_eq!(
        scenario.current_stage_type(),
        Some(StageType::SidePassPassObstacle)
    );
    assert_eq!(
        scenario.process(&frame(22.0, 3.0, false)),
        ScenarioStatus::Processing
    );
    assert_eq!(
        scenario.process(&frame(30.0, 3.0, false)),
        ScenarioStatus::Done
    );
    assert_eq!(scenario.current_stage_type(), None);
}

#[test]
fn wait_timeout_backs_up_and_approaches_again() {
    let mut config = ScenarioConfig::embedded();
    for stage in &mut config.stage_config {
        if stage.stage_type == StageType::SidePassStopOnWaitPoint {
            stage.params.insert("max_wait_cycles".to_owned(), 2.0);
        }
    }
    let mut scenario = scenario(config);
    advance_to_pass(&mut scenario);

    scenario.process(&frame(16.0, 0.0, true));
    scenario.process(&frame(16.0, 0.0, true));
    assert_eq!(
        scenario.current_stage_type(),
        Some(StageType::SidePassStopOnWaitPoint)
    );
    scenario.process(&frame(16.0, 0.0, true));
    assert_eq!(scenario.current_stage_type(), Some(StageType::SidePassBackup));

    // 4 behind the van is short of the 5 needed to re-approach.
    scenario.process(&frame(16.0, 0.0, true));
    assert_eq!(scenario.current_stage_type(), Some(StageType::SidePassBackup));

    scenario.process(&frame(14.0, 0.0, true));
    assert_eq!(
        scenario.current_stage_type(),
        Some(StageType::SidePassApproachObstacle)
    );
}

#[test]
fn stopping_too_close_backs_up() {
    let mut scenario = scenario(ScenarioConfig::embedded());
    advance_to_pass(&mut scenario);

    scenario.process(&frame(19.0, 0.0, false));
    assert_eq!(scenario.current_stage_type(), Some(StageType::SidePassBackup));
}

#[test]
fn single_stage_pipeline_runs_to_done() {
    let toml_str = r#"
scenario_type = "side_pass"
stage_type = ["side_pass_default"]

[[stage_config]]
stage_type = "side_pass_default"
"#;
    let mut scenario = scenario(ScenarioConfig::from_toml_str(toml_str).unwrap());

    assert_eq!(
        scenario.process(&frame(14.0, 2.0, false)),
        ScenarioStatus::Processing
    );
    assert_eq!(
        scenario.current_stage_type(),
        Some(StageType::SidePassDefault)
    );
    assert_eq!(
        scenario.process(&frame(30.0, 2.0, false)),
        ScenarioStatus::Done
    );
}

#[test]
fn vanished_obstacle_mid_maneuver_reports_unknown() {
    let mut scenario = scenario(ScenarioConfig::embedded());
    scenario.process(&frame(14.0, 0.0, false));

    let empty = FrameBuilder::new().adc_front_edge(14.0).build();
    assert_eq!(scenario.process(&empty), ScenarioStatus::Unknown);
    // The stage survives the error and resumes when the obstacle reappears.
    assert_eq!(
        scenario.process(&frame(14.0, 0.0, false)),
        ScenarioStatus::Processing
    );
}
