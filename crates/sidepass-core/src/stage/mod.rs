//! Side-pass stages and the factory that creates them.
//!
//! # Architecture
//!
//! ```text
//! SidePassScenario::create_stage(config)
//!     |
//!     v
//! stage_factory() --create_or_none(stage_type)--> Box<dyn Stage>
//!     |                                                |
//!     |   set_context(&context) -----------------------+
//!     |        |
//!     |   process(frame, &context) -> StageStatus
//!     |   next_stage()
//! ```

pub mod factory;
pub mod phases;
pub mod trait_def;

pub use factory::{StageConstructor, StageFactory, register_stages, stage_factory};
pub use trait_def::{Stage, StageState};
