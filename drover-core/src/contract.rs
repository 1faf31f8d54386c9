//! Capability contracts implemented by check and action plugins.
//!
//! The engine neither knows nor cares how a plugin produces its outcome or
//! side effect, only that it conforms to these traits.

use std::fmt;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::error::PluginError;

/// A gate evaluated before a target's actions run.
///
/// [`Check::execute`] performs the probe and must observe the cancellation
/// token before doing work. An `Err` from it is an execution failure, always
/// fatal to the run. The boolean outcome is read afterwards through
/// [`Check::result`]; the engine applies the policy's `invert` flag on top,
/// so implementations report the raw outcome.
pub trait Check: Send {
    fn execute(&mut self, cancel: &CancellationToken) -> Result<(), PluginError>;

    /// Raw outcome of the last `execute`, before inversion.
    fn result(&self) -> bool;

    fn policy(&self) -> &CheckPolicy;
}

/// A side-effecting step run once all of a target's checks have passed.
pub trait Action: Send {
    fn execute(&mut self, cancel: &CancellationToken) -> Result<(), PluginError>;

    fn policy(&self) -> &ActionPolicy;
}

impl fmt::Debug for dyn Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check").finish()
    }
}

impl fmt::Debug for dyn Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action").finish()
    }
}

/// Per-check policy. `None` means "unset, defer to the target default" and
/// is distinct from an explicit `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckPolicy {
    pub invert: bool,
    pub cancel_on_failure: Option<bool>,
    pub exit_on_failure: Option<bool>,
}

/// Per-action policy. Same override semantics as [`CheckPolicy`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionPolicy {
    pub cancel_on_failure: Option<bool>,
    pub exit_on_failure: Option<bool>,
}

/// Resolve an effective policy flag: item override if set, else the target
/// default if set, else off.
pub fn effective(item: Option<bool>, target_default: Option<bool>) -> bool {
    item.or(target_default).unwrap_or(false)
}
