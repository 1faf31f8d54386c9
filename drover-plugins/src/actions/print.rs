//! Prints a message to stdout.

use serde::Deserialize;

use drover_core::{Action, ActionPolicy, ActionSpec, CancellationToken, PluginError};

use crate::params::parse_params;

const TYPE_TAG: &str = "print";

#[derive(Debug, Clone, Default, Deserialize)]
struct PrintParams {
    #[serde(default)]
    message: String,
}

pub struct PrintAction {
    policy: ActionPolicy,
    params: PrintParams,
}

impl PrintAction {
    pub fn from_spec(spec: &ActionSpec) -> Result<PrintAction, PluginError> {
        Ok(PrintAction {
            policy: spec.config.clone(),
            params: parse_params(TYPE_TAG, &spec.params)?,
        })
    }
}

impl Action for PrintAction {
    fn execute(&mut self, cancel: &CancellationToken) -> Result<(), PluginError> {
        if cancel.is_cancelled() {
            return Err(PluginError::Cancelled);
        }
        println!("{}", self.params.message);
        Ok(())
    }

    fn policy(&self) -> &ActionPolicy {
        &self.policy
    }
}
