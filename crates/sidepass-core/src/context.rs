//! State shared between the side-pass scenario and the stages it creates.

use crate::config::SidePassConfig;
use crate::memory::ScenarioMemory;

/// Configuration snapshot plus the obstacle the maneuver is working against.
///
/// Owned by [`crate::scenario::SidePassScenario`]; stages only ever borrow it.
/// The tracked identifier caches the cross-cycle [`ScenarioMemory`], which
/// remains the source of truth between scenario instances. The scenario
/// refreshes the cache at the start of every decision and every cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct SidePassContext {
    config: SidePassConfig,
    front_blocking_obstacle_id: String,
}

impl SidePassContext {
    pub fn new(config: SidePassConfig, front_blocking_obstacle_id: impl Into<String>) -> Self {
        Self {
            config,
            front_blocking_obstacle_id: front_blocking_obstacle_id.into(),
        }
    }

    pub fn config(&self) -> &SidePassConfig {
        &self.config
    }

    /// The tracked blocking obstacle, empty when none.
    pub fn front_blocking_obstacle_id(&self) -> &str {
        &self.front_blocking_obstacle_id
    }

    /// Reload the tracked obstacle from `memory`, which another scenario
    /// instance may have written since this context last saw it.
    pub(crate) fn refresh(&mut self, memory: &dyn ScenarioMemory) {
        self.front_blocking_obstacle_id = memory.side_pass_front_blocking_obstacle_id();
    }

    /// Record `id` as the tracked obstacle (empty clears it), writing the
    /// store first so both always agree.
    pub(crate) fn track_front_blocking_obstacle(&mut self, id: &str, memory: &dyn ScenarioMemory) {
        memory.set_side_pass_front_blocking_obstacle_id(id);
        if self.front_blocking_obstacle_id != id {
            id.clone_into(&mut self.front_blocking_obstacle_id);
        }
    }
}
