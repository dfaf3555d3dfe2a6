//! Side-pass scenario decisions for a motion planner.
//!
//! Each planning cycle the host planner hands this crate a read-only
//! [`frame::Frame`] and asks two questions:
//!
//! 1. Should the vehicle be in the side-pass maneuver at all?
//!    ([`scenario::SidePassScenario::is_transferable`])
//! 2. If so, which stage of the maneuver runs now?
//!    ([`scenario::SidePassScenario::process`])
//!
//! The obstacle being passed is remembered across cycles through a
//! [`memory::ScenarioMemory`] owned by the host.

pub mod blocking;
pub mod config;
pub mod context;
pub mod frame;
pub mod memory;
pub mod scenario;
pub mod stage;
pub mod types;

pub use config::{ConfigError, ScenarioConfig, SidePassConfig, StageConfig};
pub use frame::Frame;
pub use memory::{InMemoryScenarioMemory, ScenarioMemory};
pub use scenario::{CurrentScenario, SidePassScenario, TransferVerdict};
pub use types::{ScenarioStatus, ScenarioType, StageStatus, StageType};
