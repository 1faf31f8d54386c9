//! Writes (or wipes) the on-disk state read by the localstate check.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::debug;

use drover_core::{Action, ActionPolicy, ActionSpec, CancellationToken, PluginError};

use crate::checks::localstate::{default_id_prefix, default_state_dir};
use crate::params::parse_params;

const TYPE_TAG: &str = "localstate";

#[derive(Debug, Clone, Deserialize)]
struct LocalStateParams {
    #[serde(default = "default_state_dir")]
    path: PathBuf,
    #[serde(default = "default_id_prefix")]
    id_prefix: String,
    id: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    wipe_state: bool,
}

pub struct LocalStateAction {
    policy: ActionPolicy,
    params: LocalStateParams,
}

impl LocalStateAction {
    pub fn from_spec(spec: &ActionSpec) -> Result<LocalStateAction, PluginError> {
        Ok(LocalStateAction {
            policy: spec.config.clone(),
            params: parse_params(TYPE_TAG, &spec.params)?,
        })
    }

    fn state_path(&self) -> PathBuf {
        self.params
            .path
            .join(format!("{}{}", self.params.id_prefix, self.params.id))
    }
}

impl Action for LocalStateAction {
    fn execute(&mut self, cancel: &CancellationToken) -> Result<(), PluginError> {
        if cancel.is_cancelled() {
            return Err(PluginError::Cancelled);
        }

        let path = self.state_path();
        if self.params.wipe_state {
            debug!(path = %path.display(), "removing state file");
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(PluginError::execution(
                        TYPE_TAG,
                        format!("failed to remove state file {}: {source}", path.display()),
                    ));
                }
            }
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| {
                PluginError::execution(
                    TYPE_TAG,
                    format!("failed to create state directory {}: {source}", parent.display()),
                )
            })?;
        }
        debug!(path = %path.display(), "writing state file");
        fs::write(&path, &self.params.state).map_err(|source| {
            PluginError::execution(
                TYPE_TAG,
                format!("failed to write state file {}: {source}", path.display()),
            )
        })
    }

    fn policy(&self) -> &ActionPolicy {
        &self.policy
    }
}
