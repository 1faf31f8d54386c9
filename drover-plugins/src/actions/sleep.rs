//! Pauses the run for a fixed number of seconds, racing the cancellation
//! token.

use std::time::Duration;

use serde::Deserialize;

use drover_core::{Action, ActionPolicy, ActionSpec, CancellationToken, PluginError};

use crate::params::{parse_params, wait_cancellable};

const TYPE_TAG: &str = "sleep";

#[derive(Debug, Clone, Deserialize)]
struct SleepParams {
    seconds: u64,
}

#[derive(Debug)]
pub struct SleepAction {
    policy: ActionPolicy,
    duration: Duration,
}

impl SleepAction {
    pub fn from_spec(spec: &ActionSpec) -> Result<SleepAction, PluginError> {
        let params: SleepParams = parse_params(TYPE_TAG, &spec.params)?;
        Ok(SleepAction {
            policy: spec.config.clone(),
            duration: Duration::from_secs(params.seconds),
        })
    }
}

impl Action for SleepAction {
    fn execute(&mut self, cancel: &CancellationToken) -> Result<(), PluginError> {
        if cancel.is_cancelled() {
            return Err(PluginError::Cancelled);
        }
        if !wait_cancellable(self.duration, cancel) {
            return Err(PluginError::Cancelled);
        }
        Ok(())
    }

    fn policy(&self) -> &ActionPolicy {
        &self.policy
    }
}
