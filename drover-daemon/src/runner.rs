//! The repeated-run driver: Idle → Running → {Sleeping → Running}* →
//! Terminated.
//!
//! Each Running phase resolves a fresh target table and executes the engine
//! on a blocking worker; the Sleeping phase races cancellation, a one-shot
//! overall deadline, and the fixed iteration interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, info};

use drover_core::{engine, CancellationToken, PluginRegistry, RunOutcome};
use drover_resolver::Resolver;

use crate::error::RunnerError;

/// What to run each iteration: which documents, which target, which plugins.
#[derive(Clone)]
pub struct RunRequest {
    pub files: Vec<String>,
    pub target: String,
    pub registry: Arc<PluginRegistry>,
}

/// Daemon-mode controls.
#[derive(Debug, Clone)]
pub struct DaemonSettings {
    pub enabled: bool,
    /// Pause between iterations.
    pub interval: Duration,
    /// Overall deadline, armed once at the first sleep. `None` = no limit.
    pub timeout: Option<Duration>,
    /// Running-phase limit. `None` = no limit.
    pub iterations: Option<u32>,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        DaemonSettings {
            enabled: false,
            interval: Duration::from_secs(60),
            timeout: None,
            iterations: None,
        }
    }
}

/// Build a runtime, install a ctrl-c handler that cancels the token, and
/// drive [`run`] to completion on the current thread.
pub fn start_blocking(
    request: RunRequest,
    settings: DaemonSettings,
) -> Result<RunOutcome, RunnerError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(RunnerError::Runtime)?;
    runtime.block_on(async {
        let cancel = CancellationToken::new();
        let signal_cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("received interrupt, cancelling run");
                signal_cancel.cancel();
            }
        });
        run(request, settings, cancel).await
    })
}

/// Run once, or repeatedly under daemon control.
///
/// Each iteration builds a fresh resolver pass and target table, so no
/// cleared state survives between iterations. A terminate outcome or any
/// error stops the loop immediately; cancellation and the overall deadline
/// end it gracefully.
pub async fn run(
    request: RunRequest,
    settings: DaemonSettings,
    cancel: CancellationToken,
) -> Result<RunOutcome, RunnerError> {
    let mut completed_iterations: u32 = 0;
    let mut deadline: Option<Instant> = None;

    loop {
        if cancel.is_cancelled() {
            info!("cancellation observed, terminating");
            return Ok(RunOutcome::Completed);
        }

        let outcome = iteration(&request, &cancel).await?;
        if outcome == RunOutcome::Terminate {
            return Ok(RunOutcome::Terminate);
        }
        if !settings.enabled {
            return Ok(RunOutcome::Completed);
        }

        // Armed on first entry to the sleep phase only, never re-armed.
        if deadline.is_none() {
            deadline = settings.timeout.map(|timeout| Instant::now() + timeout);
        }

        debug!(
            interval_secs = settings.interval.as_secs(),
            "run complete, sleeping until next iteration"
        );
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("cancellation observed while sleeping, terminating");
                return Ok(RunOutcome::Completed);
            }
            _ = sleep_until_deadline(deadline) => {
                info!("daemon timeout reached, terminating");
                return Ok(RunOutcome::Completed);
            }
            _ = time::sleep(settings.interval) => {
                completed_iterations += 1;
                if let Some(limit) = settings.iterations {
                    if completed_iterations >= limit {
                        info!(iterations = completed_iterations, "iteration limit reached, terminating");
                        return Ok(RunOutcome::Completed);
                    }
                }
            }
        }
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn iteration(
    request: &RunRequest,
    cancel: &CancellationToken,
) -> Result<RunOutcome, RunnerError> {
    let files = request.files.clone();
    let target = request.target.clone();
    let registry = request.registry.clone();
    let cancel = cancel.clone();

    tokio::task::spawn_blocking(move || -> Result<RunOutcome, RunnerError> {
        let table = Resolver::new(registry).resolve(&files, &cancel)?;
        debug!(targets = table.len(), "target table resolved");
        Ok(engine::run(&table, &target, &cancel)?)
    })
    .await
    .map_err(|err| RunnerError::Join(err.to_string()))?
}
