//! Cross-cycle scenario memory.
//!
//! The planner keeps a small amount of state alive between planning cycles.
//! For the side-pass maneuver that is the identifier of the obstacle being
//! passed. The store is owned by the host planner; this crate only reads and
//! writes the one field through the [`ScenarioMemory`] trait.

use std::sync::{Mutex, PoisonError};

/// Storage for state that must survive from one planning cycle to the next.
///
/// Implementations provide their own synchronisation, so the trait takes
/// `&self` and can be shared as `Arc<dyn ScenarioMemory>`.
pub trait ScenarioMemory: Send + Sync {
    /// Identifier of the obstacle the side-pass is working against, or an
    /// empty string when none is tracked.
    fn side_pass_front_blocking_obstacle_id(&self) -> String;

    /// Replace the tracked obstacle identifier.
    fn set_side_pass_front_blocking_obstacle_id(&self, id: &str);
}

// Compile-time assertion: ScenarioMemory must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn ScenarioMemory) {}
};

/// Process-local [`ScenarioMemory`] guarded by a mutex.
#[derive(Debug, Default)]
pub struct InMemoryScenarioMemory {
    side_pass_front_blocking_obstacle_id: Mutex<String>,
}

impl InMemoryScenarioMemory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScenarioMemory for InMemoryScenarioMemory {
    fn side_pass_front_blocking_obstacle_id(&self) -> String {
        self.side_pass_front_blocking_obstacle_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_side_pass_front_blocking_obstacle_id(&self, id: &str) {
        let mut guard = self
            .side_pass_front_blocking_obstacle_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = id.to_owned();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn starts_empty() {
        let memory = InMemoryScenarioMemory::new();
        assert!(memory.side_pass_front_blocking_obstacle_id().is_empty());
    }

    #[test]
    fn write_then_read() {
        let memory = InMemoryScenarioMemory::new();
        memory.set_side_pass_front_blocking_obstacle_id("bus-3");
        assert_eq!(memory.side_pass_front_blocking_obstacle_id(), "bus-3");
        memory.set_side_pass_front_blocking_obstacle_id("");
        assert!(memory.side_pass_front_blocking_obstacle_id().is_empty());
    }

    #[test]
    fn shared_handle_sees_writes() {
        let memory: Arc<dyn ScenarioMemory> = Arc::new(InMemoryScenarioMemory::new());
        let other = Arc::clone(&memory);
        memory.set_side_pass_front_blocking_obstacle_id("van-1");
        assert_eq!(other.side_pass_front_blocking_obstacle_id(), "van-1");
    }
}
