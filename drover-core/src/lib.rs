//! Drover core — plugin contracts, target model, and the graph engine.
//!
//! - [`contract`] — [`Check`]/[`Action`] capability traits and policies
//! - [`spec`] — serde model for target bodies
//! - [`registry`] — selector → factory plugin registry
//! - [`target`] — [`Target`] and the id-keyed [`TargetTable`]
//! - [`engine`] — dependency-aware execution and [`RunOutcome`]

pub mod contract;
pub mod engine;
pub mod error;
pub mod registry;
pub mod spec;
pub mod target;

pub use contract::{effective, Action, ActionPolicy, Check, CheckPolicy};
pub use engine::{run, RunOutcome};
pub use error::{DuplicateTarget, EngineError, PluginError};
pub use registry::PluginRegistry;
pub use spec::{ActionSpec, CheckSpec, TargetConfig, TargetSpec};
pub use target::{Target, TargetSummary, TargetTable};

/// Cooperative cancellation primitive threaded through every fetch and
/// plugin execution. Re-exported so downstream crates share one type.
pub use tokio_util::sync::CancellationToken;
