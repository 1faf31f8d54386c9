//! A no-op action.

use drover_core::{Action, ActionPolicy, ActionSpec, CancellationToken, PluginError};

pub struct DummyAction {
    policy: ActionPolicy,
}

impl DummyAction {
    pub fn from_spec(spec: &ActionSpec) -> Result<DummyAction, PluginError> {
        Ok(DummyAction {
            policy: spec.config.clone(),
        })
    }
}

impl Action for DummyAction {
    fn execute(&mut self, cancel: &CancellationToken) -> Result<(), PluginError> {
        if cancel.is_cancelled() {
            return Err(PluginError::Cancelled);
        }
        Ok(())
    }

    fn policy(&self) -> &ActionPolicy {
        &self.policy
    }
}
