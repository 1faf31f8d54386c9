//! Shell command gate: exit code and output matching.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use drover_core::{CancellationToken, Check, CheckPolicy, CheckSpec, PluginError};

use crate::params::parse_params;
use crate::process::{self, CommandSpec};

const TYPE_TAG: &str = "shell";

pub(crate) fn default_command() -> String {
    "/bin/sh".to_string()
}

pub(crate) fn default_timeout() -> u64 {
    20
}

#[derive(Debug, Clone, Deserialize)]
struct ShellCheckParams {
    #[serde(default = "default_command")]
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    exit_code: i32,
    #[serde(default)]
    regex_match: Vec<String>,
    #[serde(default)]
    regex_no_match: Vec<String>,
    #[serde(default = "default_timeout")]
    timeout: u64,
    #[serde(default)]
    env: HashMap<String, String>,
    #[serde(default)]
    no_inherit_env: bool,
    #[serde(default)]
    dir: Option<PathBuf>,
}

#[derive(Debug)]
pub struct ShellCheck {
    outcome: bool,
    policy: CheckPolicy,
    spec: CommandSpec,
    exit_code: i32,
    regex_match: Vec<Regex>,
    regex_no_match: Vec<Regex>,
}

impl ShellCheck {
    pub fn from_spec(spec: &CheckSpec) -> Result<ShellCheck, PluginError> {
        let params: ShellCheckParams = parse_params(TYPE_TAG, &spec.params)?;
        Ok(ShellCheck {
            outcome: false,
            policy: spec.config.clone(),
            spec: CommandSpec {
                command: params.command,
                args: params.args,
                env: params.env,
                inherit_env: !params.no_inherit_env,
                dir: params.dir,
                timeout: Duration::from_secs(params.timeout),
            },
            exit_code: params.exit_code,
            regex_match: compile_all(&params.regex_match)?,
            regex_no_match: compile_all(&params.regex_no_match)?,
        })
    }
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>, PluginError> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| {
                PluginError::config(TYPE_TAG, format!("invalid regex '{pattern}': {source}"))
            })
        })
        .collect()
}

fn matches_any_line(regex: &Regex, output: &str) -> bool {
    output.lines().any(|line| regex.is_match(line))
}

impl Check for ShellCheck {
    fn execute(&mut self, cancel: &CancellationToken) -> Result<(), PluginError> {
        if cancel.is_cancelled() {
            return Err(PluginError::Cancelled);
        }
        self.outcome = false;

        debug!(command = %self.spec.command, "executing check command");
        let output = process::run(TYPE_TAG, &self.spec, cancel)?;

        if output.exit_code != self.exit_code {
            debug!(
                command = %self.spec.command,
                exit_code = output.exit_code,
                expected = self.exit_code,
                "command exited with unexpected code"
            );
            return Ok(());
        }
        for regex in &self.regex_match {
            if !matches_any_line(regex, &output.output) {
                debug!(regex = %regex, "required output pattern not found");
                return Ok(());
            }
        }
        for regex in &self.regex_no_match {
            if matches_any_line(regex, &output.output) {
                debug!(regex = %regex, "forbidden output pattern found");
                return Ok(());
            }
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
