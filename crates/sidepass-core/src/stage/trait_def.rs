//! The `Stage` trait -- one ordered phase of the side-pass maneuver.
//!
//! Every stage embeds a [`StageState`] holding what all phases share (their
//! configuration, the obstacle they were bound to and the successor they
//! picked). The trait supplies the bookkeeping methods on top of it, so a
//! concrete stage only has to implement [`Stage::process`].

use crate::config::StageConfig;
use crate::context::SidePassContext;
use crate::frame::Frame;
use crate::types::{StageStatus, StageType};

/// Bookkeeping shared by every stage implementation.
#[derive(Debug, Clone, PartialEq)]
pub struct StageState {
    config: StageConfig,
    obstacle_id: String,
    next_stage: Option<StageType>,
}

impl StageState {
    pub fn new(config: &StageConfig) -> Self {
        Self {
            config: config.clone(),
            obstacle_id: String::new(),
            next_stage: None,
        }
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    /// Obstacle taken from the context when the stage was bound, updated on
    /// every cycle the stage runs.
    pub fn obstacle_id(&self) -> &str {
        &self.obstacle_id
    }

    pub fn next_stage(&self) -> Option<StageType> {
        self.next_stage
    }

    /// Mark the stage finished and record where the scenario goes next.
    pub fn finish(&mut self, next: Option<StageType>) -> StageStatus {
        self.next_stage = next;
        StageStatus::Finished
    }

    pub(super) fn bind(&mut self, context: &SidePassContext) {
        context
            .front_blocking_obstacle_id()
            .clone_into(&mut self.obstacle_id);
    }
}

/// A phase of the side-pass maneuver.
///
/// Stages are created by the [`super::StageFactory`] and bound to the
/// scenario's [`SidePassContext`] before the scenario takes ownership of
/// them. The context is lent again on every [`Stage::process`] call and
/// stages work against the obstacle it tracks at that point; they never keep
/// a reference to it.
pub trait Stage: Send {
    fn state(&self) -> &StageState;

    fn state_mut(&mut self) -> &mut StageState;

    /// Run one planning cycle of this phase.
    ///
    /// On [`StageStatus::Finished`] the stage must have recorded its
    /// successor (or `None` to end the scenario) via [`StageState::finish`].
    fn process(&mut self, frame: &Frame, context: &SidePassContext) -> StageStatus;

    fn stage_type(&self) -> StageType {
        self.state().config().stage_type
    }

    fn config(&self) -> &StageConfig {
        self.state().config()
    }

    /// Bind the stage to the scenario context it will run under.
    fn set_context(&mut self, context: &SidePassContext) {
        self.state_mut().bind(context);
    }

    fn next_stage(&self) -> Option<StageType> {
        self.state().next_stage()
    }
}

// Compile-time assertion: Stage must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn Stage) {}
};
