//! File inspection gate: existence, content substrings, and metadata.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use drover_core::{CancellationToken, Check, CheckPolicy, CheckSpec, PluginError};

use crate::params::{default_true, parse_params};

const TYPE_TAG: &str = "file";

#[derive(Debug, Clone, Deserialize)]
struct FileParams {
    path: PathBuf,
    #[serde(default = "default_true")]
    exists: bool,
    #[serde(default, rename = "match")]
    matches: Vec<String>,
    #[serde(default)]
    no_match: Vec<String>,
    /// Recognized keys: `owner`, `group` (numeric ids), `mode` (octal bit
    /// subset), `size` (minimum bytes), `modified_since` (seconds).
    #[serde(default)]
    metadata: HashMap<String, String>,
}

#[derive(Debug)]
pub struct FileCheck {
    outcome: bool,
    policy: CheckPolicy,
    params: FileParams,
}

impl FileCheck {
    pub fn from_spec(spec: &CheckSpec) -> Result<FileCheck, PluginError> {
        Ok(FileCheck {
            outcome: false,
            policy: spec.config.clone(),
            params: parse_params(TYPE_TAG, &spec.params)?,
        })
    }

    fn metadata_matches(&self, metadata: &fs::Metadata) -> bool {
        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;

            if let Some(owner) = non_empty(&self.params.metadata, "owner") {
                if metadata.uid().to_string() != owner {
                    return false;
                }
            }
            if let Some(group) = non_empty(&self.params.metadata, "group") {
                if metadata.gid().to_string() != group {
                    return false;
                }
            }
            if let Some(mode) = non_empty(&self.params.metadata, "mode") {
                let Ok(bits) = u32::from_str_radix(mode, 8) else {
                    return false;
                };
                if metadata.mode() & bits != bits {
                    return false;
                }
            }
        }

        if let Some(size) = non_empty(&self.params.metadata, "size") {
            let Ok(minimum) = size.parse::<u64>() else {
                return false;
            };
            if metadata.len() < minimum {
                return false;
            }
        }
        if let Some(window) = non_empty(&self.params.metadata, "modified_since") {
            let Ok(seconds) = window.parse::<u64>() else {
                return false;
            };
            let recent = metadata
                .modified()
                .ok()
                .and_then(|modified| modified.elapsed().ok())
                .map(|age| age <= Duration::from_secs(seconds))
                .unwrap_or(false);
            if !recent {
                return false;
            }
        }

        true
    }
}

fn non_empty<'a>(map: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    map.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

impl Check for FileCheck {
    fn execute(&mut self, cancel: &CancellationToken) -> Result<(), PluginError> {
        if cancel.is_cancelled() {
            return Err(PluginError::Cancelled);
        }
        self.outcome = false;

        let metadata = match fs::metadata(&self.params.path) {
            Ok(metadata) => Some(metadata),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(source) => {
                return Err(PluginError::execution(
                    TYPE_TAG,
                    format!("failed to stat {}: {source}", self.params.path.display()),
                ))
            }
        };

        if self.params.exists != metadata.is_some() {
            return Ok(());
        }
        let Some(metadata) = metadata else {
            // Absent and expected absent: nothing further to inspect.
            self.outcome = true;
            return Ok(());
        };

        if !self.params.matches.is_empty() || !self.params.no_match.is_empty() {
            let contents = fs::read_to_string(&self.params.path).map_err(|source| {
                PluginError::execution(
                    TYPE_TAG,
                    format!("failed to read {}: {source}", self.params.path.display()),
                )
            })?;
            for needle in &self.params.matches {
                if !contents.contains(needle) {
                    return Ok(());
                }
            }
            for needle in &self.params.no_match {
                if contents.contains(needle) {
                    return Ok(());
                }
            }
        }

        if !self.metadata_matches(&metadata) {
            return Ok(());
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
