//! Scripted stand-in for the analytics platform, used by the
//! submission and monitoring tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use bgfa_core::JobState;
use bgfa_platform::{
    ExportPlatform, ExportRequest, JobHandle, JobStatusReport, PlatformApiError,
};

use crate::submit::SubmittedJob;

/// Shorthand for a successful status observation.
pub fn status(state: JobState) -> Result<JobStatusReport, ()> {
    Ok(JobStatusReport {
        state,
        detail: None,
    })
}

/// Build a job as if it had been submitted, without going through the
/// submission path.
pub fn mock_job(cell_index: usize, name: &str) -> SubmittedJob {
    SubmittedJob {
        cell_index,
        handle: JobHandle {
            id: format!("id-{name}"),
            name: name.to_string(),
            submitted_at: Utc::now(),
        },
    }
}

/// In-flight submission accounting.
#[derive(Default)]
struct InFlight {
    current: usize,
    peak: usize,
}

/// Scripted [`ExportPlatform`] implementation.
///
/// Submissions succeed unless the request name was registered with
/// [`fail_submission`](Self::fail_submission). Status queries pop the
/// per-job script registered with [`script_status`](Self::script_status);
/// an exhausted script reports `COMPLETED`.
#[derive(Default)]
pub struct MockPlatform {
    submit_delay: Option<Duration>,
    fail_names: Mutex<HashSet<String>>,
    submitted: Mutex<Vec<ExportRequest>>,
    scripts: Mutex<HashMap<String, VecDeque<Result<JobStatusReport, ()>>>>,
    status_counts: Mutex<HashMap<String, u32>>,
    in_flight: Mutex<InFlight>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay each submission, so concurrency limits become observable.
    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = Some(delay);
        self
    }

    /// Reject any submission with this request name.
    pub fn fail_submission(&self, name: &str) {
        self.fail_names.lock().unwrap().insert(name.to_string());
    }

    /// Script the sequence of status observations for a job name.
    /// `Err(())` entries simulate a failed status query.
    pub fn script_status<I>(&self, name: &str, statuses: I)
    where
        I: IntoIterator<Item = Result<JobStatusReport, ()>>,
    {
        self.scripts
            .lock()
            .unwrap()
            .insert(name.to_string(), statuses.into_iter().collect());
    }

    /// Names of every submission observed, in arrival order.
    pub fn submitted_names(&self) -> Vec<String> {
        self.submitted
            .lock()
            .unwrap()
            .iter()
            .map(|request| request.name.clone())
            .collect()
    }

    /// Highest number of submissions that were in flight at once.
    pub fn peak_in_flight(&self) -> usize {
        self.in_flight.lock().unwrap().peak
    }

    /// How many status queries a job name has received.
    pub fn status_calls(&self, name: &str) -> u32 {
        self.status_counts
            .lock()
            .unwrap()
            .get(name)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl ExportPlatform for MockPlatform {
    async fn submit_export(
        &self,
        request: &ExportRequest,
    ) -> Result<JobHandle, PlatformApiError> {
        {
            let mut in_flight = self.in_flight.lock().unwrap();
            in_flight.current += 1;
            in_flight.peak = in_flight.peak.max(in_flight.current);
        }

        if let Some(delay) = self.submit_delay {
            tokio::time::sleep(delay).await;
        }

        self.submitted.lock().unwrap().push(request.clone());

        let result = if self.fail_names.lock().unwrap().contains(&request.name) {
            Err(PlatformApiError::Api {
                status: 503,
                body: "submission rejected".to_string(),
            })
        } else {
            Ok(JobHandle {
                id: format!("id-{}", request.name),
                name: request.name.clone(),
                submitted_at: Utc::now(),
            })
        };

        self.in_flight.lock().unwrap().current -= 1;
        result
    }

    async fn job_status(
        &self,
        handle: &JobHandle,
    ) -> Result<JobStatusReport, PlatformApiError> {
        *self
            .status_counts
            .lock()
            .unwrap()
            .entry(handle.name.clone())
            .or_insert(0) += 1;

        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&handle.name)
            .and_then(|script| script.pop_front());

        match next {
            Some(Ok(report)) => Ok(report),
            Some(Err(())) => Err(PlatformApiError::Api {
                status: 500,
                body: "status query failed".to_string(),
            }),
            None => Ok(JobStatusReport {
                state: JobState::Completed,
                detail: None,
            }),
        }
    }
}
