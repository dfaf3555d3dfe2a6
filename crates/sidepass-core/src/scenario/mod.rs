//! The side-pass scenario: owns the maneuver context, creates stages and
//! drives them cycle by cycle.
//!
//! Whether the planner should be in this scenario at all is decided by
//! [`SidePassScenario::is_transferable`] (see [`transfer`]); the proximity
//! checks it relies on live in [`gate`].

pub mod gate;
pub mod transfer;

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::blocking::{BlockingPredicate, ObstacleBlockingAnalyzer};
use crate::config::{ScenarioConfig, StageConfig};
use crate::context::SidePassContext;
use crate::frame::Frame;
use crate::memory::ScenarioMemory;
use crate::stage::{Stage, stage_factory};
use crate::types::{ScenarioStatus, ScenarioType, StageStatus, StageType};

pub use transfer::{CurrentScenario, TransferVerdict};

/// The side-pass maneuver: steering around a stationary blocking obstacle.
pub struct SidePassScenario {
    config: ScenarioConfig,
    context: SidePassContext,
    memory: Arc<dyn ScenarioMemory>,
    blocking: Box<dyn BlockingPredicate>,
    current_stage: Option<Box<dyn Stage>>,
    status: ScenarioStatus,
    msg: String,
}

impl SidePassScenario {
    /// Create a scenario, seeding the tracked obstacle from `memory`.
    pub fn new(config: ScenarioConfig, memory: Arc<dyn ScenarioMemory>) -> Self {
        let context = SidePassContext::new(
            config.side_pass.clone(),
            memory.side_pass_front_blocking_obstacle_id(),
        );
        Self {
            config,
            context,
            memory,
            blocking: Box::new(ObstacleBlockingAnalyzer),
            current_stage: None,
            status: ScenarioStatus::Unknown,
            msg: String::new(),
        }
    }

    /// Replace the blocking-obstacle classifier.
    pub fn with_blocking_predicate(mut self, predicate: impl BlockingPredicate + 'static) -> Self {
        self.blocking = Box::new(predicate);
        self
    }

    pub fn scenario_type(&self) -> ScenarioType {
        ScenarioType::SidePass
    }

    pub fn status(&self) -> ScenarioStatus {
        self.status
    }

    /// Identity and status of this scenario, for passing back into
    /// [`Self::is_transferable`] while it is the active one.
    pub fn current(&self) -> CurrentScenario {
        CurrentScenario::new(self.scenario_type(), self.status)
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub fn context(&self) -> &SidePassContext {
        &self.context
    }

    /// Operator-facing description of the last positive transfer decision.
    pub fn message(&self) -> &str {
        &self.msg
    }

    pub fn current_stage_type(&self) -> Option<StageType> {
        self.current_stage.as_ref().map(|s| s.stage_type())
    }

    /// Create the stage described by `stage_config` and bind it to this
    /// scenario's context, refreshed from the cross-cycle memory.
    ///
    /// Returns `None` when the stage type is not registered or the stage is
    /// disabled; the caller should keep its current behaviour for the cycle.
    pub fn create_stage(&mut self, stage_config: &StageConfig) -> Option<Box<dyn Stage>> {
        self.context.refresh(self.memory.as_ref());
        if !stage_config.enabled {
            warn!(stage = %stage_config.stage_type, "stage is disabled; not creating it");
            return None;
        }
        let Some(mut stage) = stage_factory().create_or_none(stage_config.stage_type, stage_config)
        else {
            error!(?stage_config, "failed to create stage for config");
            return None;
        };
        stage.set_context(&self.context);
        Some(stage)
    }

    /// Run the current stage for one planning cycle.
    ///
    /// Starts the first configured stage on the first call and advances to
    /// the successor a stage names when it finishes. The scenario is
    /// [`ScenarioStatus::Done`] once a stage finishes without a successor.
    /// A stage error, or a successor that cannot be created, reports
    /// [`ScenarioStatus::Unknown`] for the cycle.
    pub fn process(&mut self, frame: &Frame) -> ScenarioStatus {
        if self.status == ScenarioStatus::Done {
            return self.status;
        }
        self.context.refresh(self.memory.as_ref());

        if self.current_stage.is_none() {
            let Some(first) = self.config.first_stage() else {
                error!("scenario config lists no stages");
                self.status = ScenarioStatus::Unknown;
                return self.status;
            };
            if !self.enter_stage(first) {
                self.status = ScenarioStatus::Unknown;
                return self.status;
            }
        }

        let Some(stage) = self.current_stage.as_mut() else {
            self.status = ScenarioStatus::Unknown;
            return self.status;
        };
        let stage_type = stage.stage_type();

        self.status = match stage.process(frame, &self.context) {
            StageStatus::Error => {
                error!(stage = %stage_type, "stage processing failed");
                ScenarioStatus::Unknown
            }
            StageStatus::Ready | StageStatus::Running => ScenarioStatus::Processing,
            StageStatus::Finished => match stage.next_stage() {
                None => {
                    info!(stage = %stage_type, "side-pass scenario done");
                    self.current_stage = None;
                    ScenarioStatus::Done
                }
                Some(next) => {
                    if self.enter_stage(next) {
                        ScenarioStatus::Processing
                    } else {
                        self.current_stage = None;
                        ScenarioStatus::Unknown
                    }
                }
            },
        };
        self.status
    }

    /// Create `stage_type` from config and make it the current stage.
    fn enter_stage(&mut self, stage_type: StageType) -> bool {
        let Some(stage_config) = self.config.stage_config(stage_type).cloned() else {
            error!(stage = %stage_type, "no stage_config entry for stage");
            return false;
        };
        let Some(stage) = self.create_stage(&stage_config) else {
            return false;
        };
        info!(
            from = ?self.current_stage_type(),
            to = %stage_type,
            obstacle_id = %self.context.front_blocking_obstacle_id(),
            "entering side-pass stage"
        );
        self.current_stage = Some(stage);
        true
    }
}

impl std::fmt::Debug for SidePassScenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SidePassScenario")
            .field("status", &self.status)
            .field("current_stage", &self.current_stage_type())
            .field("context", &self.context)
            .field("msg", &self.msg)
            .finish()
    }
}
