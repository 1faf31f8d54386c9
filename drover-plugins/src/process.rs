//! Killable child-process execution shared by the shell plugins.
//!
//! The wait races three things: process completion, the configured timeout,
//! and the cancellation token. Whichever loses gets the child killed, so no
//! shell step can block an orchestrator run indefinitely.

use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use drover_core::{CancellationToken, PluginError};

use crate::params::POLL_INTERVAL;

#[derive(Debug, Clone)]
pub(crate) struct CommandSpec {
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub inherit_env: bool,
    pub dir: Option<PathBuf>,
    pub timeout: Duration,
}

#[derive(Debug)]
pub(crate) struct ProcessOutput {
    pub exit_code: i32,
    /// Captured stdout followed by stderr.
    pub output: String,
}

pub(crate) fn run(
    type_tag: &str,
    spec: &CommandSpec,
    cancel: &CancellationToken,
) -> Result<ProcessOutput, PluginError> {
    let mut command = Command::new(&spec.command);
    command
        .args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if !spec.inherit_env {
        command.env_clear();
    }
    command.envs(&spec.env);
    if let Some(dir) = &spec.dir {
        command.current_dir(dir);
    }

    let mut child = command.spawn().map_err(|source| {
        PluginError::execution(
            type_tag,
            format!("failed to spawn '{}': {source}", spec.command),
        )
    })?;

    // Drain pipes on their own threads so a chatty child can't deadlock
    // against a full pipe while we poll for exit.
    let stdout_reader = spawn_reader(child.stdout.take());
    let stderr_reader = spawn_reader(child.stderr.take());

    let deadline = Instant::now() + spec.timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {}
            Err(source) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(PluginError::execution(
                    type_tag,
                    format!("failed to wait for '{}': {source}", spec.command),
                ));
            }
        }
        if cancel.is_cancelled() {
            let _ = child.kill();
            let _ = child.wait();
            return Err(PluginError::Cancelled);
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(PluginError::execution(
                type_tag,
                format!(
                    "'{}' timed out after {}s",
                    spec.command,
                    spec.timeout.as_secs()
                ),
            ));
        }
        thread::sleep(POLL_INTERVAL);
    };

    let mut output = join_reader(stdout_reader);
    output.push_str(&join_reader(stderr_reader));
    Ok(ProcessOutput {
        exit_code: status.code().unwrap_or(-1),
        output,
    })
}

fn spawn_reader<R: Read + Send + 'static>(source: Option<R>) -> Option<JoinHandle<String>> {
    source.map(|mut reader| {
        thread::spawn(move || {
            let mut buffer = String::new();
            let _ = reader.read_to_string(&mut buffer);
            buffer
        })
    })
}

fn join_reader(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}
