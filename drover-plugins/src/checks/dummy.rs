//! A check that always passes (until inverted). Useful for wiring tests and
//! for targets that gate purely on policy.

use drover_core::{CancellationToken, Check, CheckPolicy, CheckSpec, PluginError};

pub struct DummyCheck {
    outcome: bool,
    policy: CheckPolicy,
}

impl DummyCheck {
    pub fn from_spec(spec: &CheckSpec) -> Result<DummyCheck, PluginError> {
        Ok(DummyCheck {
            outcome: false,
            policy: spec.config.clone(),
        })
    }
}

impl Check for DummyCheck {
    fn execute(&mut self, cancel: &CancellationToken) -> Result<(), PluginError> {
        if cancel.is_cancelled() {
            return Err(PluginError::Cancelled);
        }
        self.outcome = true;
        Ok(())
    }

    fn result(&self) -> bool {
        self.outcome
    }

    fn policy(&self) -> &CheckPolicy {
        &self.policy
    }
}
