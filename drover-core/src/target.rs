//! Target model and the id-keyed target table.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::contract::{Action, Check};
use crate::error::{DuplicateTarget, PluginError};
use crate::registry::PluginRegistry;
use crate::spec::{TargetConfig, TargetSpec};

/// A named unit of work: ordered checks, ordered actions, dependency ids,
/// and failure-policy defaults.
///
/// `cleared` marks completion (ran or gracefully skipped) within the current
/// orchestrator instance. It is monotonic: once set it never reverts, and a
/// fresh table is built for every daemon iteration, so it cannot leak across
/// runs.
#[derive(Debug)]
pub struct Target {
    pub id: String,
    pub config: TargetConfig,
    pub dependencies: Vec<String>,
    pub checks: Vec<Box<dyn Check>>,
    pub actions: Vec<Box<dyn Action>>,
    pub cleared: bool,
}

impl Target {
    /// Instantiate a target from its parsed spec, building every check and
    /// action through the registry. Unknown selectors fail here, at load
    /// time, before anything executes.
    pub fn from_spec(
        id: impl Into<String>,
        spec: TargetSpec,
        registry: &PluginRegistry,
    ) -> Result<Target, PluginError> {
        let mut checks = Vec::with_capacity(spec.checks.len());
        for check_spec in &spec.checks {
            checks.push(registry.build_check(check_spec)?);
        }
        let mut actions = Vec::with_capacity(spec.actions.len());
        for action_spec in &spec.actions {
            actions.push(registry.build_action(action_spec)?);
        }
        Ok(Target {
            id: id.into(),
            config: spec.config,
            dependencies: spec.dependencies,
            checks,
            actions,
            cleared: false,
        })
    }
}

/// One row of [`TargetTable::summaries`], for listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSummary {
    pub id: String,
    pub checks: usize,
    pub actions: usize,
    pub dependencies: Vec<String>,
}

/// The id → target table for one orchestrator instance.
///
/// Each slot carries its own lock; the engine acquires it only around a
/// target's run body, never across dependency recursion.
#[derive(Default)]
#[derive(Debug)]
pub struct TargetTable {
    targets: HashMap<String, Mutex<Target>>,
}

impl TargetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a target. A duplicate id is a hard error, never a silent
    /// overwrite.
    pub fn insert(&mut self, target: Target) -> Result<(), DuplicateTarget> {
        if self.targets.contains_key(&target.id) {
            return Err(DuplicateTarget(target.id));
        }
        self.targets.insert(target.id.clone(), Mutex::new(target));
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Mutex<Target>> {
        self.targets.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.targets.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// All target ids, sorted for stable output.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.targets.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    /// Listing rows, sorted by id.
    pub fn summaries(&self) -> Vec<TargetSummary> {
        let mut rows: Vec<TargetSummary> = self
            .targets
            .values()
            .map(|slot| {
                let target = match slot.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                TargetSummary {
                    id: target.id.clone(),
                    checks: target.checks.len(),
                    actions: target.actions.len(),
                    dependencies: target.dependencies.clone(),
                }
            })
            .collect();
        rows.sort_unstable_by(|a, b| a.id.cmp(&b.id));
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_target(id: &str) -> Target {
        Target {
            id: id.to_string(),
            config: TargetConfig::default(),
            dependencies: vec![],
            checks: vec![],
            actions: vec![],
            cleared: false,
        }
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut table = TargetTable::new();
        table.insert(bare_target("deploy")).expect("first insert");
        let err = table.insert(bare_target("deploy")).unwrap_err();
        assert_eq!(err.0, "deploy");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn ids_are_sorted() {
        let mut table = TargetTable::new();
        for id in ["zeta", "alpha", "mid"] {
            table.insert(bare_target(id)).expect("insert");
        }
        assert_eq!(table.ids(), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn from_spec_rejects_unknown_selector() {
        let spec: TargetSpec =
            serde_yaml::from_str("checks:\n  - type: bogus\n").expect("parse");
        let registry = PluginRegistry::new();
        let err = Target::from_spec("t", spec, &registry).unwrap_err();
        assert!(matches!(
            err,
            crate::error::PluginError::UnknownCheckType(tag) if tag == "bogus"
        ));
    }
}
