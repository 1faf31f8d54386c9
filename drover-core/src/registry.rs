//! Plugin registry: selector strings mapped to check/action factories.
//!
//! Built-ins are registered by the plugins crate at process start; embedders
//! may register additional factories before resolution begins. There is no
//! global registry — an instance is passed explicitly wherever targets are
//! built, so tests and embedders never share mutable state.

use std::collections::HashMap;
use std::fmt;

use crate::contract::{Action, Check};
use crate::error::PluginError;
use crate::spec::{ActionSpec, CheckSpec};

type CheckFactory = Box<dyn Fn(&CheckSpec) -> Result<Box<dyn Check>, PluginError> + Send + Sync>;
type ActionFactory = Box<dyn Fn(&ActionSpec) -> Result<Box<dyn Action>, PluginError> + Send + Sync>;

/// Maps a descriptor's `type` tag to the factory that builds its plugin.
#[derive(Default)]
pub struct PluginRegistry {
    checks: HashMap<String, CheckFactory>,
    actions: HashMap<String, ActionFactory>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a check factory under `type_tag`, replacing any previous one.
    pub fn register_check<F>(&mut self, type_tag: impl Into<String>, factory: F)
    where
        F: Fn(&CheckSpec) -> Result<Box<dyn Check>, PluginError> + Send + Sync + 'static,
    {
        self.checks.insert(type_tag.into(), Box::new(factory));
    }

    /// Register an action factory under `type_tag`, replacing any previous one.
    pub fn register_action<F>(&mut self, type_tag: impl Into<String>, factory: F)
    where
        F: Fn(&ActionSpec) -> Result<Box<dyn Action>, PluginError> + Send + Sync + 'static,
    {
        self.actions.insert(type_tag.into(), Box::new(factory));
    }

    /// Build a check from its descriptor. Unknown selector fails here, at
    /// load time, before anything executes.
    pub fn build_check(&self, spec: &CheckSpec) -> Result<Box<dyn Check>, PluginError> {
        match self.checks.get(&spec.type_tag) {
            Some(factory) => factory(spec),
            None => Err(PluginError::UnknownCheckType(spec.type_tag.clone())),
        }
    }

    /// Build an action from its descriptor.
    pub fn build_action(&self, spec: &ActionSpec) -> Result<Box<dyn Action>, PluginError> {
        match self.actions.get(&spec.type_tag) {
            Some(factory) => factory(spec),
            None => Err(PluginError::UnknownActionType(spec.type_tag.clone())),
        }
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut checks: Vec<&str> = self.checks.keys().map(String::as_str).collect();
        let mut actions: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        checks.sort_unstable();
        actions.sort_unstable();
        f.debug_struct("PluginRegistry")
            .field("checks", &checks)
            .field("actions", &actions)
            .finish()
    }
}
