//! Level-triggered job monitoring.
//!
//! The platform pushes nothing; the monitor polls every still-live job
//! handle on a fixed interval until the live set drains, the optional
//! deadline expires, or the cancellation token fires. Stopping the loop
//! never cancels remote work: jobs keep running server-side and are
//! reported as unresolved.
//!
//! A failed status query is treated as transient, not as a job failure:
//! the job stays live and is retried on later rounds. Only after
//! [`MAX_POLL_FAILURES`] consecutive query failures is the job given up
//! on and reported as failed locally.

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use bgfa_core::JobState;
use bgfa_platform::ExportPlatform;

use crate::submit::SubmittedJob;

/// Consecutive status-query failures after which a job is abandoned.
/// A successful poll resets the counter.
pub const MAX_POLL_FAILURES: u32 = 5;

/// Monitoring parameters.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Interval between poll rounds.
    pub poll_interval: Duration,
    /// Optional upper bound on total monitoring time.
    pub max_wait: Option<Duration>,
}

/// Why the monitoring loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorOutcome {
    /// Every job reached a terminal state.
    Drained,
    /// `max_wait` elapsed with jobs still live.
    DeadlineExpired,
    /// The cancellation token fired with jobs still live.
    Cancelled,
}

/// Final accounting of a monitoring run.
#[derive(Debug)]
pub struct MonitorReport {
    pub outcome: MonitorOutcome,
    pub completed: Vec<SubmittedJob>,
    pub failed: Vec<SubmittedJob>,
    pub cancelled: Vec<SubmittedJob>,
    /// Jobs still non-terminal when the loop stopped early. Empty when
    /// the outcome is [`MonitorOutcome::Drained`].
    pub unresolved: Vec<SubmittedJob>,
    /// Number of poll rounds executed.
    pub rounds: u32,
    pub elapsed: Duration,
}

/// A job handle plus its consecutive-poll-failure count.
struct LiveJob {
    job: SubmittedJob,
    poll_failures: u32,
}

/// Poll all jobs to a terminal state.
///
/// Level-triggered: each round queries every live handle, reports and
/// removes the terminal ones, and sleeps until the next tick. The first
/// round runs immediately.
pub async fn monitor_jobs<P: ExportPlatform>(
    platform: &P,
    jobs: Vec<SubmittedJob>,
    config: &MonitorConfig,
    cancel: &CancellationToken,
) -> MonitorReport {
    let started = std::time::Instant::now();
    let deadline = config
        .max_wait
        .map(|wait| tokio::time::Instant::now() + wait);

    let mut live: Vec<LiveJob> = jobs
        .into_iter()
        .map(|job| LiveJob {
            job,
            poll_failures: 0,
        })
        .collect();

    let mut report = MonitorReport {
        outcome: MonitorOutcome::Drained,
        completed: Vec::new(),
        failed: Vec::new(),
        cancelled: Vec::new(),
        unresolved: Vec::new(),
        rounds: 0,
        elapsed: Duration::ZERO,
    };

    let mut ticker = tokio::time::interval(config.poll_interval);

    let outcome = loop {
        if live.is_empty() {
            break MonitorOutcome::Drained;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(live = live.len(), "Monitoring cancelled");
                break MonitorOutcome::Cancelled;
            }
            _ = wait_for_deadline(deadline) => {
                tracing::warn!(live = live.len(), "Monitoring deadline expired");
                break MonitorOutcome::DeadlineExpired;
            }
            _ = ticker.tick() => {}
        }

        report.rounds += 1;
        live = poll_round(platform, live, &mut report).await;
    };

    report.outcome = outcome;
    report.unresolved = live.into_iter().map(|entry| entry.job).collect();
    report.elapsed = started.elapsed();
    report
}

/// Sleep until the deadline, or forever when there is none.
async fn wait_for_deadline(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// One poll round: query every live job, file the terminal ones into
/// the report, and return the jobs that remain live.
async fn poll_round<P: ExportPlatform>(
    platform: &P,
    live: Vec<LiveJob>,
    report: &mut MonitorReport,
) -> Vec<LiveJob> {
    let mut still_live = Vec::with_capacity(live.len());

    for mut entry in live {
        match platform.job_status(&entry.job.handle).await {
            Ok(status) => {
                entry.poll_failures = 0;
                if status.state.is_terminal() {
                    let runtime_secs =
                        (Utc::now() - entry.job.handle.submitted_at).num_seconds();
                    tracing::info!(
                        job = %entry.job.handle.name,
                        cell = entry.job.cell_index,
                        state = status.state.as_str(),
                        detail = status.detail.as_deref().unwrap_or(""),
                        runtime_secs,
                        "Export job finished",
                    );
                } else {
                    tracing::debug!(
                        job = %entry.job.handle.name,
                        state = status.state.as_str(),
                        "Export job still in progress",
                    );
                }
                match status.state {
                    JobState::Completed => report.completed.push(entry.job),
                    JobState::Failed => report.failed.push(entry.job),
                    JobState::Cancelled => report.cancelled.push(entry.job),
                    JobState::Pending | JobState::Running => still_live.push(entry),
                }
            }
            Err(e) => {
                entry.poll_failures += 1;
                if entry.poll_failures >= MAX_POLL_FAILURES {
                    tracing::error!(
                        job = %entry.job.handle.name,
                        cell = entry.job.cell_index,
                        error = %e,
                        failures = entry.poll_failures,
                        "Giving up on job after repeated status failures",
                    );
                    report.failed.push(entry.job);
                } else {
                    tracing::warn!(
                        job = %entry.job.handle.name,
                        error = %e,
                        failures = entry.poll_failures,
                        "Status query failed, will retry next round",
                    );
                    still_live.push(entry);
                }
            }
        }
    }

    still_live
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{mock_job, status, MockPlatform};
    use bgfa_core::JobState::{Completed, Failed, Pending, Running};

    fn fast_config() -> MonitorConfig {
        MonitorConfig {
            poll_interval: Duration::from_millis(5),
            max_wait: None,
        }
    }

    #[tokio::test]
    async fn drains_in_rounds_bounded_by_slowest_job() {
        let platform = MockPlatform::new();
        let jobs = vec![
            mock_job(0, "job-a"),
            mock_job(1, "job-b"),
            mock_job(2, "job-c"),
        ];
        platform.script_status("job-a", [status(Running), status(Running), status(Completed)]);
        platform.script_status("job-b", [status(Running), status(Failed)]);
        platform.script_status("job-c", [status(Completed)]);

        let cancel = CancellationToken::new();
        let report = monitor_jobs(&platform, jobs, &fast_config(), &cancel).await;

        assert_eq!(report.outcome, MonitorOutcome::Drained);
        assert_eq!(report.rounds, 3);
        assert_eq!(report.completed.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert!(report.cancelled.is_empty());
        assert!(report.unresolved.is_empty());

        // Each terminal transition is observed exactly once: no queries
        // after a job leaves the live set.
        assert_eq!(platform.status_calls("job-a"), 3);
        assert_eq!(platform.status_calls("job-b"), 2);
        assert_eq!(platform.status_calls("job-c"), 1);
    }

    #[tokio::test]
    async fn transient_poll_errors_keep_job_live() {
        let platform = MockPlatform::new();
        let jobs = vec![mock_job(0, "job-a")];
        platform.script_status(
            "job-a",
            [
                Err(()),
                Err(()),
                status(Running),
                Err(()),
                status(Completed),
            ],
        );

        let cancel = CancellationToken::new();
        let report = monitor_jobs(&platform, jobs, &fast_config(), &cancel).await;

        assert_eq!(report.outcome, MonitorOutcome::Drained);
        assert_eq!(report.completed.len(), 1);
        assert!(report.failed.is_empty());
        assert_eq!(platform.status_calls("job-a"), 5);
    }

    #[tokio::test]
    async fn repeated_poll_failures_abandon_job() {
        let platform = MockPlatform::new();
        let jobs = vec![mock_job(0, "job-a")];
        // Nothing but errors: the monitor should give up after
        // MAX_POLL_FAILURES consecutive failures.
        platform.script_status("job-a", std::iter::repeat(Err(())).take(10));

        let cancel = CancellationToken::new();
        let report = monitor_jobs(&platform, jobs, &fast_config(), &cancel).await;

        assert_eq!(report.outcome, MonitorOutcome::Drained);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(
            platform.status_calls("job-a"),
            MAX_POLL_FAILURES,
            "no further queries after the job is abandoned"
        );
    }

    #[tokio::test]
    async fn deadline_stops_polling_and_reports_unresolved() {
        let platform = MockPlatform::new();
        let jobs = vec![mock_job(0, "job-a")];
        platform.script_status("job-a", std::iter::repeat(status(Pending)).take(100));

        let config = MonitorConfig {
            poll_interval: Duration::from_millis(5),
            max_wait: Some(Duration::from_millis(12)),
        };
        let cancel = CancellationToken::new();
        let report = monitor_jobs(&platform, jobs, &config, &cancel).await;

        assert_eq!(report.outcome, MonitorOutcome::DeadlineExpired);
        assert_eq!(report.unresolved.len(), 1);
        assert!(report.completed.is_empty());
    }

    #[tokio::test]
    async fn cancellation_stops_polling_before_first_round() {
        let platform = MockPlatform::new();
        let jobs = vec![
            mock_job(0, "job-a"),
            mock_job(1, "job-b"),
        ];

        let cancel = CancellationToken::new();
        cancel.cancel();
        let report = monitor_jobs(&platform, jobs, &fast_config(), &cancel).await;

        assert_eq!(report.outcome, MonitorOutcome::Cancelled);
        assert_eq!(report.rounds, 0);
        assert_eq!(report.unresolved.len(), 2);
        assert_eq!(platform.status_calls("job-a"), 0);
    }

    #[tokio::test]
    async fn empty_job_list_drains_immediately() {
        let platform = MockPlatform::new();
        let cancel = CancellationToken::new();
        let report = monitor_jobs(&platform, Vec::new(), &fast_config(), &cancel).await;

        assert_eq!(report.outcome, MonitorOutcome::Drained);
        assert_eq!(report.rounds, 0);
    }
}
