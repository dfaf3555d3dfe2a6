//! Stage factory -- maps a [`StageType`] to the constructor for that phase.
//!
//! The scenario resolves stage types through the process-wide table returned
//! by [`stage_factory`]. The table is populated exactly once, on first use,
//! behind a [`OnceLock`], so planners running cycles on several threads race
//! safely on the first lookup.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::config::StageConfig;
use crate::types::StageType;

use super::phases;
use super::trait_def::Stage;

/// Builds an owned stage from its configuration.
pub type StageConstructor = fn(&StageConfig) -> Box<dyn Stage>;

/// A table of stage constructors, keyed by stage type.
#[derive(Default)]
pub struct StageFactory {
    producers: HashMap<StageType, StageConstructor>,
}

impl StageFactory {
    /// Create an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor for `stage_type`.
    ///
    /// Returns `false` and keeps the existing entry when the type is already
    /// registered.
    pub fn register(&mut self, stage_type: StageType, constructor: StageConstructor) -> bool {
        if self.producers.contains_key(&stage_type) {
            return false;
        }
        self.producers.insert(stage_type, constructor);
        true
    }

    /// Whether a constructor is registered for `stage_type`.
    pub fn contains(&self, stage_type: StageType) -> bool {
        self.producers.contains_key(&stage_type)
    }

    /// Construct the stage registered for `stage_type`, or `None` if the type
    /// is unknown.
    pub fn create_or_none(
        &self,
        stage_type: StageType,
        config: &StageConfig,
    ) -> Option<Box<dyn Stage>> {
        self.producers.get(&stage_type).map(|produce| produce(config))
    }

    /// Registered stage types, sorted.
    pub fn registered_types(&self) -> Vec<StageType> {
        let mut types: Vec<StageType> = self.producers.keys().copied().collect();
        types.sort();
        types
    }

    /// Return the number of registered stage types.
    pub fn len(&self) -> usize {
        self.producers.len()
    }

    /// Return `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.producers.is_empty()
    }
}

impl std::fmt::Debug for StageFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageFactory")
            .field("producers", &self.registered_types())
            .finish()
    }
}

/// Populate `factory` with every side-pass stage.
///
/// Whole-table bootstrap: does nothing if the factory already holds any
/// entry.
pub fn register_stages(factory: &mut StageFactory) {
    if !factory.is_empty() {
        return;
    }
    factory.register(StageType::SidePassDefault, |config| {
        Box::new(phases::SidePassDefaultStage::new(config))
    });
    factory.register(StageType::SidePassApproachObstacle, |config| {
        Box::new(phases::ApproachObstacleStage::new(config))
    });
    factory.register(StageType::SidePassDetectSafety, |config| {
        Box::new(phases::DetectSafetyStage::new(config))
    });
    factory.register(StageType::SidePassGeneratePath, |config| {
        Box::new(phases::GeneratePathStage::new(config))
    });
    factory.register(StageType::SidePassPassObstacle, |config| {
        Box::new(phases::PassObstacleStage::new(config))
    });
    factory.register(StageType::SidePassStopOnWaitPoint, |config| {
        Box::new(phases::StopOnWaitPointStage::new(config))
    });
    factory.register(StageType::SidePassBackup, |config| {
        Box::new(phases::BackupStage::new(config))
    });
}

static STAGE_FACTORY: OnceLock<StageFactory> = OnceLock::new();

/// The process-wide side-pass stage factory, populated on first call.
pub fn stage_factory() -> &'static StageFactory {
    STAGE_FACTORY.get_or_init(|| {
        let mut factory = StageFactory::new();
        register_stages(&mut factory);
        factory
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SidePassContext;
    use crate::frame::Frame;
    use crate::stage::trait_def::StageState;
    use crate::types::StageStatus;

    struct FakeStage {
        state: StageState,
    }

    impl Stage for FakeStage {
        fn state(&self) -> &StageState {
            &self.state
        }

        fn state_mut(&mut self) -> &mut StageState {
            &mut self.state
        }

        fn process(&mut self, _frame: &Frame, _context: &SidePassContext) -> StageStatus {
            StageStatus::Running
        }
    }

    fn fake(config: &StageConfig) -> Box<dyn Stage> {
        Box::new(FakeStage {
            state: StageState::new(config),
        })
    }

    #[test]
    fn factory_starts_empty() {
        let factory = StageFactory::new();
        assert!(factory.is_empty());
        assert_eq!(factory.len(), 0);
        assert!(factory.registered_types().is_empty());
    }

    #[test]
    fn register_and_create() {
        let mut factory = StageFactory::new();
        assert!(factory.register(StageType::SidePassDefault, fake));

        let config = StageConfig::new(StageType::SidePassDefault);
        let stage = factory
            .create_or_none(StageType::SidePassDefault, &config)
            .unwrap();
        assert_eq!(stage.stage_type(), StageType::SidePassDefault);
    }

    #[test]
    fn register_keeps_existing_entry() {
        let mut factory = StageFactory::new();
        assert!(factory.register(StageType::SidePassDefault, fake));
        assert!(!factory.register(StageType::SidePassDefault, fake));
        assert_eq!(factory.len(), 1);
    }

    #[test]
    fn create_missing_returns_none() {
        let factory = StageFactory::new();
        let config = StageConfig::new(StageType::LaneFollowDefault);
        assert!(
            factory
                .create_or_none(StageType::LaneFollowDefault, &config)
                .is_none()
        );
    }

    #[test]
    fn bootstrap_registers_every_side_pass_stage() {
        let mut factory = StageFactory::new();
        register_stages(&mut factory);
        assert_eq!(
            factory.registered_types(),
            vec![
                StageType::SidePassDefault,
                StageType::SidePassApproachObstacle,
                StageType::SidePassDetectSafety,
                StageType::SidePassGeneratePath,
                StageType::SidePassPassObstacle,
                StageType::SidePassStopOnWaitPoint,
                StageType::SidePassBackup,
            ]
        );
        assert!(!factory.contains(StageType::LaneFollowDefault));
    }

    #[test]
    fn bootstrap_is_a_no_op_on_populated_factory() {
        let mut factory = StageFactory::new();
        factory.register(StageType::SidePassBackup, fake);
        register_stages(&mut factory);
        assert_eq!(factory.len(), 1);
    }

    #[test]
    fn global_factory_is_initialised_once() {
        let first = stage_factory();
        let second = stage_factory();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.len(), 7);
    }

    #[test]
    fn global_factory_survives_concurrent_first_use() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| stage_factory().len()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 7);
        }
    }

    #[test]
    fn factory_debug_shows_types() {
        let mut factory = StageFactory::new();
        factory.register(StageType::SidePassBackup, fake);
        let debug = format!("{factory:?}");
        assert!(debug.contains("SidePassBackup"));
    }
}
