//! Shell command action.
//!
//! A non-zero exit is logged, not failed: only spawn failure, timeout, or
//! cancellation count as errors. When the command is a `/bin/*sh` shell,
//! `-c` is prepended to the args so bare script strings work.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use drover_core::{Action, ActionPolicy, ActionSpec, CancellationToken, PluginError};

use crate::checks::shell::{default_command, default_timeout};
use crate::params::parse_params;
use crate::process::{self, CommandSpec};

const TYPE_TAG: &str = "shell";

#[derive(Debug, Clone, Deserialize)]
struct ShellActionParams {
    #[serde(default = "default_command")]
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default = "default_timeout")]
    timeout: u64,
    #[serde(default)]
    env: HashMap<String, String>,
    #[serde(default)]
    no_inherit_env: bool,
    #[serde(default)]
    dir: Option<PathBuf>,
    #[serde(default)]
    echo: bool,
}

pub struct ShellAction {
    policy: ActionPolicy,
    spec: CommandSpec,
    echo: bool,
}

impl ShellAction {
    pub fn from_spec(spec: &ActionSpec) -> Result<ShellAction, PluginError> {
        let params: ShellActionParams = parse_params(TYPE_TAG, &spec.params)?;

        let mut args = params.args;
        if params.command.starts_with("/bin/") && params.command.ends_with("sh") {
            args.insert(0, "-c".to_string());
        }

        Ok(ShellAction {
            policy: spec.config.clone(),
            spec: CommandSpec {
                command: params.command,
                args,
                env: params.env,
                inherit_env: !params.no_inherit_env,
                dir: params.dir,
                timeout: Duration::from_secs(params.timeout),
            },
            echo: params.echo,
        })
    }
}

impl Action for ShellAction {
    fn execute(&mut self, cancel: &CancellationToken) -> Result<(), PluginError> {
        if cancel.is_cancelled() {
            return Err(PluginError::Cancelled);
        }

        debug!(command = %self.spec.command, "executing action command");
        let output = process::run(TYPE_TAG, &self.spec, cancel)?;

        if self.echo && !output.output.is_empty() {
            print!("{}", output.output);
        }
        if output.exit_code != 0 {
            debug!(
                command = %self.spec.command,
                exit_code = output.exit_code,
                "command exited with non-zero status"
            );
        }
        Ok(())
    }

    fn policy(&self) -> &ActionPolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn action(params: &str) -> ShellAction {
        let spec: ActionSpec =
            serde_yaml::from_str(&format!("type: shell\nparams:\n{params}")).expect("spec");
        ShellAction::from_spec(&spec).expect("build")
    }

    #[test]
    fn shell_command_gets_dash_c_prepended() {
        let dir = TempDir::new().expect("tempdir");
        let marker = dir.path().join("ran");
        let mut run = action(&format!("  args: [\"touch {}\"]\n", marker.display()));
        run.execute(&CancellationToken::new()).expect("execute");
        assert!(marker.exists());
    }

    #[test]
    fn nonzero_exit_is_not_a_failure() {
        let mut run = action("  args: [\"exit 7\"]\n");
        run.execute(&CancellationToken::new()).expect("execute");
    }

    #[test]
    fn explicit_binary_keeps_args_untouched() {
        let run = action("  command: /usr/bin/env\n  args: [\"true\"]\n");
        assert_eq!(run.spec.args, vec!["true"]);
    }

    #[test]
    fn timeout_is_a_failure() {
        let mut run = action("  args: [\"sleep 30\"]\n  timeout: 1\n");
        let err = run.execute(&CancellationToken::new()).unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
