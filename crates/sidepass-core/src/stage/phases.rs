//! Concrete side-pass stages.
//!
//! Trajectory and speed generation belong to downstream planner tasks; the
//! stages here only judge, from the snapshot, whether their phase is complete
//! and which phase comes next.
//!
//! ```text
//! approach_obstacle -> detect_safety -> generate_path -> pass_obstacle
//!        ^                                                |     |
//!        |                                 stopped, traffic     stopped, too close
//!        |                                                v     v
//!        +------------- backup <---- timeout ---- stop_on_wait_point
//!                                                         |
//!                                                  clear -> pass_obstacle
//! ```

use tracing::{debug, info};

use crate::blocking::distance_between_adc_and_obstacle;
use crate::config::StageConfig;
use crate::context::SidePassContext;
use crate::frame::{Frame, Obstacle, ReferenceLineInfo};
use crate::types::{StageStatus, StageType};

use super::trait_def::{Stage, StageState};

const DEFAULT_MAX_STOP_SPEED: f64 = 0.3;
const DEFAULT_MAX_STOP_DISTANCE: f64 = 8.0;
const DEFAULT_CHECK_BACKWARD_DISTANCE: f64 = 20.0;
const DEFAULT_CHECK_FORWARD_DISTANCE: f64 = 10.0;
const DEFAULT_MAX_WAIT_CYCLES: f64 = 50.0;
const DEFAULT_BACKUP_CLEARANCE: f64 = 3.0;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Rebind `state` to the obstacle `context` tracks this cycle, then look up
/// the path candidate and that obstacle.
fn locate<'a>(
    state: &mut StageState,
    frame: &'a Frame,
    context: &SidePassContext,
) -> Option<(&'a ReferenceLineInfo, Option<&'a Obstacle>)> {
    state.bind(context);
    let reference_line = frame.sole_reference_line()?;
    Some((reference_line, frame.find(state.obstacle_id())))
}

fn is_adc_stopped(reference_line: &ReferenceLineInfo, max_stop_speed: f64) -> bool {
    reference_line.adc_speed.abs() <= max_stop_speed
}

/// Whether the vehicle's rear has cleared the obstacle's front.
fn has_passed(reference_line: &ReferenceLineInfo, obstacle: &Obstacle) -> bool {
    obstacle.perception_sl_boundary.end_s < reference_line.adc_sl_boundary.start_s
}

/// First moving obstacle inside the corridor the maneuver sweeps through.
///
/// The corridor spans from `backward` behind the vehicle's rear to `forward`
/// past the end of the obstacle being passed.
fn traffic_in_corridor<'a>(
    frame: &'a Frame,
    reference_line: &ReferenceLineInfo,
    target: &Obstacle,
    backward: f64,
    forward: f64,
) -> Option<&'a Obstacle> {
    let corridor_start = reference_line.adc_sl_boundary.start_s - backward;
    let corridor_end = target.perception_sl_boundary.end_s + forward;
    frame.obstacles.iter().find(|o| {
        o.id != target.id
            && !o.is_virtual
            && !o.is_static
            && o.perception_sl_boundary.end_s >= corridor_start
            && o.perception_sl_boundary.start_s <= corridor_end
    })
}

// ---------------------------------------------------------------------------
// Default (single-stage) pipeline
// ---------------------------------------------------------------------------

/// Runs the whole maneuver as one phase: finished once the obstacle is
/// behind the vehicle or gone.
#[derive(Debug)]
pub struct SidePassDefaultStage {
    state: StageState,
}

impl SidePassDefaultStage {
    pub fn new(config: &StageConfig) -> Self {
        Self {
            state: StageState::new(config),
        }
    }
}

impl Stage for SidePassDefaultStage {
    fn state(&self) -> &StageState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut StageState {
        &mut self.state
    }

    fn process(&mut self, frame: &Frame, context: &SidePassContext) -> StageStatus {
        let Some((reference_line, target)) = locate(&mut self.state, frame, context) else {
            return StageStatus::Error;
        };
        match target {
            Some(obstacle) if !has_passed(reference_line, obstacle) => StageStatus::Running,
            _ => self.state.finish(None),
        }
    }
}

// ---------------------------------------------------------------------------
// Approach
// ---------------------------------------------------------------------------

/// Creeps up behind the obstacle and stops within passing range.
#[derive(Debug)]
pub struct ApproachObstacleStage {
    state: StageState,
}

impl ApproachObstacleStage {
    pub fn new(config: &StageConfig) -> Self {
        Self {
            state: StageState::new(config),
        }
    }
}

impl Stage for ApproachObstacleStage {
    fn state(&self) -> &StageState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut StageState {
        &mut self.state
    }

    fn process(&mut self, frame: &Frame, context: &SidePassContext) -> StageStatus {
        let Some((reference_line, Some(target))) = locate(&mut self.state, frame, context) else {
            return StageStatus::Error;
        };
        let config = self.state.config();
        let max_stop_speed = config.param("max_stop_speed", DEFAULT_MAX_STOP_SPEED);
        let max_stop_distance = config.param("max_stop_distance", DEFAULT_MAX_STOP_DISTANCE);

        let distance = distance_between_adc_and_obstacle(reference_line, target);
        if is_adc_stopped(reference_line, max_stop_speed) && distance <= max_stop_distance {
            debug!(obstacle_id = %target.id, distance, "stopped behind obstacle");
            return self.state.finish(Some(StageType::SidePassDetectSafety));
        }
        StageStatus::Running
    }
}

// ---------------------------------------------------------------------------
// Safety check
// ---------------------------------------------------------------------------

/// Waits until no moving traffic occupies the corridor around the obstacle.
#[derive(Debug)]
pub struct DetectSafetyStage {
    state: StageState,
}

impl DetectSafetyStage {
    pub fn new(config: &StageConfig) -> Self {
        Self {
            state: StageState::new(config),
        }
    }
}

impl Stage for DetectSafetyStage {
    fn state(&self) -> &StageState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut StageState {
        &mut self.state
    }

    fn process(&mut self, frame: &Frame, context: &SidePassContext) -> StageStatus {
        let Some((reference_line, Some(target))) = locate(&mut self.state, frame, context) else {
            return StageStatus::Error;
        };
        let config = self.state.config();
        let backward = config.param("check_backward_distance", DEFAULT_CHECK_BACKWARD_DISTANCE);
        let forward = config.param("check_forward_distance", DEFAULT_CHECK_FORWARD_DISTANCE);

        if let Some(traffic) = traffic_in_corridor(frame, reference_line, target, backward, forward)
        {
            debug!(traffic_id = %traffic.id, "side-pass corridor occupied; waiting");
            return StageStatus::Running;
        }
        self.state.finish(Some(StageType::SidePassGeneratePath))
    }
}

// ---------------------------------------------------------------------------
// Path generation
// ---------------------------------------------------------------------------

/// Hands over to the downstream path generator once the scene is settled.
#[derive(Debug)]
pub struct GeneratePathStage {
    state: StageState,
}

impl GeneratePathStage {
    pub fn new(config: &StageConfig) -> Self {
        Self {
            state: StageState::new(config),
        }
    }
}

impl Stage for GeneratePathStage {
    fn state(&self) -> &StageState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut StageState {
        &mut self.state
    }

    fn process(&mut self, frame: &Frame, context: &SidePassContext) -> StageStatus {
        match locate(&mut self.state, frame, context) {
            Some((_, Some(_))) => self.state.finish(Some(StageType::SidePassPassObstacle)),
            _ => StageStatus::Error,
        }
    }
}

// ---------------------------------------------------------------------------
// Pass
// ---------------------------------------------------------------------------

/// Drives past the obstacle; falls back to waiting or backing up when the
/// vehicle comes to a halt.
#[derive(Debug)]
pub struct PassObstacleStage {
    state: StageState,
}

impl PassObstacleStage {
    pub fn new(config: &StageConfig) -> Self {
        Self {
            state: StageState::new(config),
        }
    }
}

impl Stage for PassObstacleStage {
    fn state(&self) -> &StageState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut StageState {
        &mut self.state
    }

    fn process(&mut self, frame: &Frame, context: &SidePassContext) -> StageStatus {
        let Some((reference_line, target)) = locate(&mut self.state, frame, context) else {
            return StageStatus::Error;
        };
        let Some(target) = target.filter(|t| !has_passed(reference_line, t)) else {
            info!(obstacle_id = %self.state.obstacle_id(), "obstacle passed");
            return self.state.finish(None);
        };

        let config = self.state.config();
        let max_stop_speed = config.param("max_stop_speed", DEFAULT_MAX_STOP_SPEED);
        if !is_adc_stopped(reference_line, max_stop_speed) {
            return StageStatus::Running;
        }

        let distance = distance_between_adc_and_obstacle(reference_line, target);
        if distance > 0.0 && distance < context.config().min_front_obstacle_distance {
            return self.state.finish(Some(StageType::SidePassBackup));
        }

        let backward = config.param("check_backward_distance", DEFAULT_CHECK_BACKWARD_DISTANCE);
        let forward = config.param("check_forward_distance", DEFAULT_CHECK_FORWARD_DISTANCE);
        if traffic_in_corridor(frame, reference_line, target, backward, forward).is_some() {
            return self.state.finish(Some(StageType::SidePassStopOnWaitPoint));
        }
        StageStatus::Running
    }
}

// ---------------------------------------------------------------------------
// Wait point
// ---------------------------------------------------------------------------

/// Holds at the wait point until the corridor clears, giving up after a
/// bounded number of cycles.
#[derive(Debug)]
pub struct StopOnWaitPointStage {
    state: StageState,
    waited_cycles: u32,
}

impl StopOnWaitPointStage {
    pub fn new(config: &StageConfig) -> Self {
        Self {
            state: StageState::new(config),
            waited_cycles: 0,
        }
    }
}

impl Stage for StopOnWaitPointStage {
    fn state(&self) -> &StageState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut StageState {
        &mut self.state
    }

    fn process(&mut self, frame: &Frame, context: &SidePassContext) -> StageStatus {
        let Some((reference_line, Some(target))) = locate(&mut self.state, frame, context) else {
            return StageStatus::Error;
        };
        let config = self.state.config();
        let backward = config.param("check_backward_distance", DEFAULT_CHECK_BACKWARD_DISTANCE);
        let forward = config.param("check_forward_distance", DEFAULT_CHECK_FORWARD_DISTANCE);
        let max_wait_cycles = config.param("max_wait_cycles", DEFAULT_MAX_WAIT_CYCLES);

        if traffic_in_corridor(frame, reference_line, target, backward, forward).is_none() {
            return self.state.finish(Some(StageType::SidePassPassObstacle));
        }

        self.waited_cycles += 1;
        if f64::from(self.waited_cycles) >= max_wait_cycles {
            info!(
                waited_cycles = self.waited_cycles,
                "gave up waiting for the corridor to clear"
            );
            return self.state.finish(Some(StageType::SidePassBackup));
        }
        StageStatus::Running
    }
}

// ---------------------------------------------------------------------------
// Backup
// ---------------------------------------------------------------------------

/// Reverses until there is enough room to approach the obstacle again.
#[derive(Debug)]
pub struct BackupStage {
    state: StageState,
}

impl BackupStage {
    pub fn new(config: &StageConfig) -> Self {
        Self {
            state: StageState::new(config),
        }
    }
}

impl Stage for BackupStage {
    fn state(&self) -> &StageState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut StageState {
        &mut self.state
    }

    fn process(&mut self, frame: &Frame, context: &SidePassContext) -> StageStatus {
        let Some((reference_line, Some(target))) = locate(&mut self.state, frame, context) else {
            return StageStatus::Error;
        };
        let clearance = self
            .state
            .config()
            .param("backup_clearance", DEFAULT_BACKUP_CLEARANCE);
        let wanted = context.config().min_front_obstacle_distance + clearance;
        if distance_between_adc_and_obstacle(reference_line, target) >= wanted {
            return self.state.finish(Some(StageType::SidePassApproachObstacle));
        }
        StageStatus::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SidePassConfig;
    use crate::frame::SlBoundary;

    const TARGET: &str = "truck";

    fn frame(adc_end_s: f64, adc_speed: f64, obstacles: Vec<Obstacle>) -> Frame {
        Frame {
            sequence_num: 0,
            reference_line_info: vec![ReferenceLineInfo {
                adc_sl_boundary: SlBoundary::new(adc_end_s - 5.0, adc_end_s, -1.0, 1.0),
                adc_speed,
                distance_to_destination: 200.0,
                first_encountered_overlaps: vec![],
                lane_left_width: 1.75,
                lane_right_width: 1.75,
            }],
            obstacles,
        }
    }

    fn target_at(start_s: f64) -> Obstacle {
        Obstacle {
            id: TARGET.to_owned(),
            is_virtual: false,
            is_static: true,
            speed: 0.0,
            perception_sl_boundary: SlBoundary::new(start_s, start_s + 6.0, -1.0, 1.0),
        }
    }

    fn car_at(id: &str, start_s: f64) -> Obstacle {
        Obstacle {
            id: id.to_owned(),
            is_virtual: false,
            is_static: false,
            speed: 8.0,
            perception_sl_boundary: SlBoundary::new(start_s, start_s + 4.5, 2.0, 3.8),
        }
    }

    fn context() -> SidePassContext {
        SidePassContext::new(SidePassConfig::default(), TARGET)
    }

    fn bound<S: Stage>(mut stage: S) -> S {
        stage.set_context(&context());
        stage
    }

    #[test]
    fn default_stage_runs_until_obstacle_passed() {
        let mut stage = bound(SidePassDefaultStage::new(&StageConfig::new(
            StageType::SidePassDefault,
        )));
        let ctx = context();
        assert_eq!(
            stage.process(&frame(10.0, 3.0, vec![target_at(15.0)]), &ctx),
            StageStatus::Running
        );
        // Rear of the vehicle (35.0) is past the obstacle's end (21.0).
        assert_eq!(
            stage.process(&frame(40.0, 3.0, vec![target_at(15.0)]), &ctx),
            StageStatus::Finished
        );
        assert_eq!(stage.next_stage(), None);
    }

    #[test]
    fn default_stage_errors_without_single_path() {
        let mut stage = bound(SidePassDefaultStage::new(&StageConfig::new(
            StageType::SidePassDefault,
        )));
        let mut f = frame(10.0, 0.0, vec![target_at(15.0)]);
        f.reference_line_info.push(f.reference_line_info[0].clone());
        assert_eq!(stage.process(&f, &context()), StageStatus::Error);
    }

    #[test]
    fn approach_finishes_when_stopped_close() {
        let mut stage = bound(ApproachObstacleStage::new(&StageConfig::new(
            StageType::SidePassApproachObstacle,
        )));
        let ctx = context();
        assert_eq!(
            stage.process(&frame(10.0, 2.0, vec![target_at(15.0)]), &ctx),
            StageStatus::Running
        );
        assert_eq!(
            stage.process(&frame(10.0, 0.0, vec![target_at(25.0)]), &ctx),
            StageStatus::Running
        );
        assert_eq!(
            stage.process(&frame(10.0, 0.0, vec![target_at(15.0)]), &ctx),
            StageStatus::Finished
        );
        assert_eq!(stage.next_stage(), Some(StageType::SidePassDetectSafety));
    }

    #[test]
    fn stage_follows_the_context_it_runs_under() {
        let mut stage = bound(ApproachObstacleStage::new(&StageConfig::new(
            StageType::SidePassApproachObstacle,
        )));
        let mut cone = target_at(15.0);
        cone.id = "cone".to_owned();
        let f = frame(10.0, 0.0, vec![cone]);

        assert_eq!(stage.process(&f, &context()), StageStatus::Error);

        let retracked = SidePassContext::new(SidePassConfig::default(), "cone");
        assert_eq!(stage.process(&f, &retracked), StageStatus::Finished);
        assert_eq!(stage.state().obstacle_id(), "cone");
    }

    #[test]
    fn approach_errors_when_obstacle_missing() {
        let mut stage = bound(ApproachObstacleStage::new(&StageConfig::new(
            StageType::SidePassApproachObstacle,
        )));
        assert_eq!(
            stage.process(&frame(10.0, 0.0, vec![]), &context()),
            StageStatus::Error
        );
    }

    #[test]
    fn detect_safety_waits_for_traffic() {
        let mut stage = bound(DetectSafetyStage::new(&StageConfig::new(
            StageType::SidePassDetectSafety,
        )));
        let ctx = context();
        let busy = frame(10.0, 0.0, vec![target_at(15.0), car_at("oncoming", 25.0)]);
        assert_eq!(stage.process(&busy, &ctx), StageStatus::Running);

        let far = frame(10.0, 0.0, vec![target_at(15.0), car_at("far", 80.0)]);
        assert_eq!(stage.process(&far, &ctx), StageStatus::Finished);
        assert_eq!(stage.next_stage(), Some(StageType::SidePassGeneratePath));
    }

    #[test]
    fn generate_path_hands_over_to_pass() {
        let mut stage = bound(GeneratePathStage::new(&StageConfig::new(
            StageType::SidePassGeneratePath,
        )));
        assert_eq!(
            stage.process(&frame(10.0, 0.0, vec![target_at(15.0)]), &context()),
            StageStatus::Finished
        );
        assert_eq!(stage.next_stage(), Some(StageType::SidePassPassObstacle));
    }

    #[test]
    fn pass_obstacle_branches() {
        let ctx = context();
        let config = StageConfig::new(StageType::SidePassPassObstacle);

        let mut moving = bound(PassObstacleStage::new(&config));
        assert_eq!(
            moving.process(&frame(10.0, 3.0, vec![target_at(15.0)]), &ctx),
            StageStatus::Running
        );

        let mut too_close = bound(PassObstacleStage::new(&config));
        assert_eq!(
            too_close.process(&frame(14.0, 0.0, vec![target_at(15.0)]), &ctx),
            StageStatus::Finished
        );
        assert_eq!(too_close.next_stage(), Some(StageType::SidePassBackup));

        let mut blocked = bound(PassObstacleStage::new(&config));
        let busy = frame(10.0, 0.0, vec![target_at(15.0), car_at("oncoming", 22.0)]);
        assert_eq!(blocked.process(&busy, &ctx), StageStatus::Finished);
        assert_eq!(blocked.next_stage(), Some(StageType::SidePassStopOnWaitPoint));

        let mut done = bound(PassObstacleStage::new(&config));
        assert_eq!(
            done.process(&frame(40.0, 3.0, vec![target_at(15.0)]), &ctx),
            StageStatus::Finished
        );
        assert_eq!(done.next_stage(), None);
    }

    #[test]
    fn wait_point_resumes_or_gives_up() {
        let ctx = context();
        let config =
            StageConfig::new(StageType::SidePassStopOnWaitPoint).with_param("max_wait_cycles", 2.0);
        let busy = frame(10.0, 0.0, vec![target_at(15.0), car_at("oncoming", 22.0)]);

        let mut stage = bound(StopOnWaitPointStage::new(&config));
        assert_eq!(stage.process(&busy, &ctx), StageStatus::Running);
        assert_eq!(stage.process(&busy, &ctx), StageStatus::Finished);
        assert_eq!(stage.next_stage(), Some(StageType::SidePassBackup));

        let mut stage = bound(StopOnWaitPointStage::new(&config));
        let clear = frame(10.0, 0.0, vec![target_at(15.0)]);
        assert_eq!(stage.process(&clear, &ctx), StageStatus::Finished);
        assert_eq!(stage.next_stage(), Some(StageType::SidePassPassObstacle));
    }

    #[test]
    fn backup_until_clearance_restored() {
        let ctx = context();
        let mut stage = bound(BackupStage::new(&StageConfig::new(StageType::SidePassBackup)));
        assert_eq!(
            stage.process(&frame(14.0, -0.5, vec![target_at(15.0)]), &ctx),
            StageStatus::Running
        );
        assert_eq!(
            stage.process(&frame(10.0, -0.5, vec![target_at(15.0)]), &ctx),
            StageStatus::Finished
        );
        assert_eq!(stage.next_stage(), Some(StageType::SidePassApproachObstacle));
    }
}
