//! On-disk state gate, the read side of the localstate action.
//!
//! With `matches` empty this is a null-state probe: it passes only when the
//! state file does not exist. Otherwise the trimmed file content must equal
//! one of the `matches` entries exactly.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::debug;

use drover_core::{CancellationToken, Check, CheckPolicy, CheckSpec, PluginError};

use crate::params::parse_params;

const TYPE_TAG: &str = "localstate";

pub(crate) fn default_state_dir() -> PathBuf {
    PathBuf::from("/var/lib/drover/state")
}

pub(crate) fn default_id_prefix() -> String {
    "_state_".to_string()
}

#[derive(Debug, Clone, Deserialize)]
struct LocalStateParams {
    #[serde(default = "default_state_dir")]
    path: PathBuf,
    #[serde(default = "default_id_prefix")]
    id_prefix: String,
    id: String,
    #[serde(default)]
    matches: Vec<String>,
}

pub struct LocalStateCheck {
    outcome: bool,
    policy: CheckPolicy,
    params: LocalStateParams,
}

impl LocalStateCheck {
    pub fn from_spec(spec: &CheckSpec) -> Result<LocalStateCheck, PluginError> {
        Ok(LocalStateCheck {
            outcome: false,
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

impl Check for LocalStateCheck {
    fn execute(&mut self, cancel: &CancellationToken) -> Result<(), PluginError> {
        if cancel.is_cancelled() {
            return Err(PluginError::Cancelled);
        }
        self.outcome = false;

        let path = self.state_path();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if self.params.matches.is_empty() && err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "state file absent, null state satisfied");
                self.outcome = true;
                return Ok(());
            }
            Err(source) => {
                return Err(PluginError::execution(
                    TYPE_TAG,
                    format!("failed to read state file {}: {source}", path.display()),
                ));
            }
        };

        if self.params.matches.is_empty() {
            debug!(path = %path.display(), "state file exists, null state not satisfied");
            return Ok(());
        }

        let contents = contents.trim();
        if self.params.matches.iter().any(|m| m == contents) {
            self.outcome = true;
        }
        Ok(())
    }

    fn result(&self) -> bool {
        self.outcome
    }

    fn policy(&self) -> &CheckPolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn check(dir: &TempDir, id: &str, matches: &str) -> LocalStateCheck {
        let spec: CheckSpec = serde_yaml::from_str(&format!(
            "type: localstate\nparams:\n  path: {}\n  id: {id}\n  matches: {matches}\n",
            dir.path().display()
        ))
        .expect("spec");
        LocalStateCheck::from_spec(&spec).expect("build")
    }

    fn execute(check: &mut LocalStateCheck) -> bool {
        check.execute(&CancellationToken::new()).expect("execute");
        check.result()
    }

    #[test]
    fn null_state_passes_when_file_absent() {
        let dir = TempDir::new().expect("tempdir");
        let mut probe = check(&dir, "install", "[]");
        assert!(execute(&mut probe));
    }

    #[test]
    fn null_state_fails_when_file_present() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("_state_install"), "done").expect("write");
        let mut probe = check(&dir, "install", "[]");
        assert!(!execute(&mut probe));
    }

    #[test]
    fn content_match_with_trimming() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("_state_install"), "done\n").expect("write");
        let mut probe = check(&dir, "install", "[done]");
        assert!(execute(&mut probe));
    }

    #[test]
    fn content_mismatch_fails() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("_state_install"), "pending").expect("write");
        let mut probe = check(&dir, "install", "[done]");
        assert!(!execute(&mut probe));
    }

    #[test]
    fn missing_file_with_matches_is_an_execution_error() {
        let dir = TempDir::new().expect("tempdir");
        let mut probe = check(&dir, "install", "[done]");
        let err = probe.execute(&CancellationToken::new()).unwrap_err();
        assert!(err.to_string().contains("failed to read state file"));
    }
}
