//! Daemon loop semantics under paused time: iteration counting, one-shot
//! deadline arming, cancellation, and terminate propagation.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use drover_core::{CancellationToken, RunOutcome};
use drover_daemon::{run, DaemonSettings, RunRequest};
use drover_plugins::builtin_registry;

fn request(files: Vec<String>) -> RunRequest {
    RunRequest {
        files,
        target: "default".to_string(),
        registry: Arc::new(builtin_registry()),
    }
}

/// A document whose default target appends one line per Running phase.
fn counting_doc(dir: &TempDir, log: &Path) -> String {
    let doc = format!(
        "default:\n  actions:\n    - type: shell\n      params:\n        args: [\"echo run >> {}\"]\n",
        log.display()
    );
    let path = dir.path().join("count.drover");
    fs::write(&path, doc).expect("write document");
    path.to_string_lossy().into_owned()
}

fn phases(log: &Path) -> usize {
    fs::read_to_string(log)
        .map(|contents| contents.lines().count())
        .unwrap_or(0)
}

#[tokio::test(start_paused = true)]
async fn disabled_daemon_runs_exactly_once() {
    let dir = TempDir::new().expect("tempdir");
    let log = dir.path().join("log");
    let doc = counting_doc(&dir, &log);

    let outcome = run(
        request(vec![doc]),
        DaemonSettings::default(),
        CancellationToken::new(),
    )
    .await
    .expect("run");

    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(phases(&log), 1);
}

#[tokio::test(start_paused = true)]
async fn iteration_limit_is_exact_regardless_of_interval() {
    let dir = TempDir::new().expect("tempdir");
    let log = dir.path().join("log");
    let doc = counting_doc(&dir, &log);

    let settings = DaemonSettings {
        enabled: true,
        interval: Duration::from_secs(60),
        timeout: None,
        iterations: Some(3),
    };
    let outcome = run(request(vec![doc]), settings, CancellationToken::new())
        .await
        .expect("run");

    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(phases(&log), 3, "iterations=3 must mean exactly 3 Running phases");
}

#[tokio::test(start_paused = true)]
async fn timeout_is_armed_once_and_wins_over_later_intervals() {
    let dir = TempDir::new().expect("tempdir");
    let log = dir.path().join("log");
    let doc = counting_doc(&dir, &log);

    // interval=60, timeout=90: the interval fires at t=60 (second run), the
    // deadline at t=90 beats the next interval at t=120. Were the deadline
    // re-armed per sleep it would sit at t=150 and a third run would happen.
    let settings = DaemonSettings {
        enabled: true,
        interval: Duration::from_secs(60),
        timeout: Some(Duration::from_secs(90)),
        iterations: None,
    };
    let outcome = run(request(vec![doc]), settings, CancellationToken::new())
        .await
        .expect("run");

    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(phases(&log), 2);
}

#[tokio::test(start_paused = true)]
async fn pre_cancelled_token_performs_zero_phases() {
    let dir = TempDir::new().expect("tempdir");
    let log = dir.path().join("log");
    let doc = counting_doc(&dir, &log);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let settings = DaemonSettings {
        enabled: true,
        interval: Duration::from_secs(1),
        timeout: None,
        iterations: None,
    };
    let outcome = run(request(vec![doc]), settings, cancel)
        .await
        .expect("run");

    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(phases(&log), 0);
}

#[tokio::test(start_paused = true)]
async fn cancellation_during_sleep_terminates_gracefully() {
    let dir = TempDir::new().expect("tempdir");
    let log = dir.path().join("log");
    let doc = counting_doc(&dir, &log);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(30)).await;
        trigger.cancel();
    });

    let settings = DaemonSettings {
        enabled: true,
        interval: Duration::from_secs(60),
        timeout: None,
        iterations: None,
    };
    let outcome = run(request(vec![doc]), settings, cancel)
        .await
        .expect("run");

    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(phases(&log), 1, "cancel at t=30 lands inside the first sleep");
}

#[tokio::test(start_paused = true)]
async fn terminate_outcome_stops_the_loop_immediately() {
    let dir = TempDir::new().expect("tempdir");
    let doc_path = dir.path().join("exit.drover");
    fs::write(
        &doc_path,
        "default:\n  checks:\n    - type: dummy\n      config:\n        invert: true\n        exitOnFailure: true\n",
    )
    .expect("write document");

    let settings = DaemonSettings {
        enabled: true,
        interval: Duration::from_secs(1),
        timeout: None,
        iterations: Some(100),
    };
    let outcome = run(
        request(vec![doc_path.to_string_lossy().into_owned()]),
        settings,
        CancellationToken::new(),
    )
    .await
    .expect("run");

    assert_eq!(outcome, RunOutcome::Terminate);
}

#[tokio::test(start_paused = true)]
async fn resolution_error_aborts_the_run() {
    let dir = TempDir::new().expect("tempdir");
    let missing = dir.path().join("absent.drover");

    let err = run(
        request(vec![missing.to_string_lossy().into_owned()]),
        DaemonSettings::default(),
        CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, drover_daemon::RunnerError::Resolve(_)));
}
