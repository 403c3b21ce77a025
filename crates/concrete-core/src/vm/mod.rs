//! Execution of tapes: frames, capture analysis, resolution and the
//! stepwise engine with its run driver

pub mod capture;
pub mod closures;
pub mod engine;
pub mod errors;
pub mod executor;
pub mod frame;
pub mod resolution;
pub mod runner;
pub mod snapshot;
pub mod value;

pub use closures::ClosureStore;
pub use engine::{Engine, Notification, RunState, State};
pub use errors::{EngineError, Failure};
pub use executor::{Activation, Command, Executor, ExecutorContext, FnExecutor, Registry, Script};
pub use frame::Frame;
pub use runner::{Mode, Outcome, Runner};
pub use snapshot::EngineSnapshot;
pub use value::{ConversionError, HostValue};

/// Steps allowed per program run before the engine gives up
pub const DEFAULT_STEP_BUDGET: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub step_budget: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            step_budget: DEFAULT_STEP_BUDGET,
        }
    }
}
