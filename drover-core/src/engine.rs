//! Target graph engine.
//!
//! Depth-first dependency execution with cycle breaking via the lineage set,
//! plus the check/action failure-policy state machine. Strictly sequential:
//! dependencies of a target run before its own body, and no two targets,
//! checks, or actions ever run concurrently.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::contract::effective;
use crate::error::EngineError;
use crate::target::{Target, TargetTable};

/// Result of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The target and its dependency closure completed (or soft-stopped).
    Completed,
    /// An exit-on-failure policy fired; the caller should terminate the
    /// process with a failing status without running anything further.
    Terminate,
}

/// Run `root` and everything it transitively depends on, each at most once.
///
/// The lineage set lives for this call only; cycles are broken silently (the
/// revisited target is skipped, not reported).
pub fn run(
    table: &TargetTable,
    root: &str,
    cancel: &CancellationToken,
) -> Result<RunOutcome, EngineError> {
    let mut lineage = HashSet::new();
    run_target(table, root, &mut lineage, cancel)
}

fn run_target(
    table: &TargetTable,
    id: &str,
    lineage: &mut HashSet<String>,
    cancel: &CancellationToken,
) -> Result<RunOutcome, EngineError> {
    if cancel.is_cancelled() {
        return Err(EngineError::Cancelled);
    }

    let slot = table
        .get(id)
        .ok_or_else(|| EngineError::UnknownTarget(id.to_string()))?;

    if lineage.contains(id) {
        debug!(target_id = id, "target already on the active path, skipping to break cycle");
        return Ok(RunOutcome::Completed);
    }
    if lock(slot).cleared {
        debug!(target_id = id, "target already cleared, skipping");
        return Ok(RunOutcome::Completed);
    }

    lineage.insert(id.to_string());

    let dependencies = lock(slot).dependencies.clone();
    for dependency in &dependencies {
        match run_target(table, dependency, lineage, cancel)? {
            RunOutcome::Terminate => return Ok(RunOutcome::Terminate),
            RunOutcome::Completed => {}
        }
    }

    run_body(&mut lock(slot), cancel)
}

fn lock(slot: &Mutex<Target>) -> MutexGuard<'_, Target> {
    match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Run one target's own checks and actions under its lock.
///
/// `cleared` is set on every exit path except a fatal or cancelling error.
fn run_body(target: &mut Target, cancel: &CancellationToken) -> Result<RunOutcome, EngineError> {
    debug!(target_id = %target.id, "running target");

    if target.cleared {
        debug!(target_id = %target.id, "target already cleared, skipping");
        return Ok(RunOutcome::Completed);
    }
    if cancel.is_cancelled() {
        return Err(EngineError::Cancelled);
    }

    let config = target.config.clone();

    for index in 0..target.checks.len() {
        if let Err(source) = target.checks[index].execute(cancel) {
            // An execution failure is always fatal, regardless of policy.
            return Err(EngineError::CheckExecution {
                target: target.id.clone(),
                source,
            });
        }
        let policy = target.checks[index].policy().clone();
        let passed = target.checks[index].result() != policy.invert;
        if passed {
            continue;
        }

        debug!(target_id = %target.id, check = index, "check failed");
        if effective(policy.exit_on_failure, config.exit_on_check_failure) {
            warn!(target_id = %target.id, check = index, "check failed with exit policy set, terminating");
            return Ok(RunOutcome::Terminate);
        }
        if effective(policy.cancel_on_failure, config.cancel_on_check_failure) {
            debug!(target_id = %target.id, check = index, "check failed with cancel policy set, cancelling run");
            return Err(EngineError::CheckCancelled {
                target: target.id.clone(),
            });
        }
        debug!(target_id = %target.id, "check failed with no cancel or exit policy, skipping target");
        target.cleared = true;
        return Ok(RunOutcome::Completed);
    }

    debug!(target_id = %target.id, "all checks passed, executing actions");
    for index in 0..target.actions.len() {
        let Err(source) = target.actions[index].execute(cancel) else {
            continue;
        };
        let policy = target.actions[index].policy().clone();
        if effective(policy.exit_on_failure, config.exit_on_action_failure) {
            warn!(target_id = %target.id, action = index, error = %source, "action failed with exit policy set, terminating");
            return Ok(RunOutcome::Terminate);
        }
        if effective(policy.cancel_on_failure, config.cancel_on_action_failure) {
            return Err(EngineError::ActionCancelled {
                target: target.id.clone(),
                source,
            });
        }
        warn!(target_id = %target.id, action = index, error = %source, "action failed with no cancel or exit policy, marking target cleared");
        target.cleared = true;
        return Ok(RunOutcome::Completed);
    }

    debug!(target_id = %target.id, "target complete, marking cleared");
    target.cleared = true;
    Ok(RunOutcome::Completed)
}
