//! REST API client for the platform's export endpoints.
//!
//! Wraps the two HTTP calls the exporter consumes (job submission,
//! status retrieval) using [`reqwest`], and defines the
//! [`ExportPlatform`] trait so orchestration code can run against a
//! scripted stand-in instead of a live platform.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bgfa_core::JobState;

use crate::request::ExportRequest;
use crate::session::Session;

/// Opaque reference to a submitted export job.
///
/// Created by the platform on submission; held locally only for the
/// duration of monitoring and used purely as a polling key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobHandle {
    /// Platform-assigned job id.
    pub id: String,
    /// The name the job was submitted under.
    pub name: String,
    /// When the submission was accepted, local clock.
    pub submitted_at: DateTime<Utc>,
}

/// One status observation for a job.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusReport {
    pub state: JobState,
    /// Optional human-readable detail (error message, progress note).
    pub detail: Option<String>,
}

/// Response returned by the `/v1/exports` endpoint after accepting a
/// submission.
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    /// Platform-assigned identifier for the queued job.
    job_id: String,
    /// Initial state, normally `PENDING`.
    state: JobState,
}

/// Errors from the platform REST layer.
#[derive(Debug, thiserror::Error)]
pub enum PlatformApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The platform returned a non-2xx status code.
    #[error("Platform API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

/// The two remote operations the exporter consumes.
///
/// Implemented by [`PlatformApi`] for the live platform and by scripted
/// mocks in orchestrator tests.
#[async_trait]
pub trait ExportPlatform: Send + Sync {
    /// Submit a computation description as an asynchronous export job.
    ///
    /// Resubmitting under an already-used name is not guaranteed to be
    /// idempotent on the platform side; callers must assign names that
    /// are unique per cell.
    async fn submit_export(&self, request: &ExportRequest)
        -> Result<JobHandle, PlatformApiError>;

    /// Query the current state of a previously submitted job.
    async fn job_status(&self, handle: &JobHandle)
        -> Result<JobStatusReport, PlatformApiError>;
}

/// HTTP client for the platform's export API.
pub struct PlatformApi {
    client: reqwest::Client,
    session: Session,
}

impl PlatformApi {
    /// Create a new API client bound to an authenticated session.
    pub fn new(session: Session) -> Self {
        Self {
            client: reqwest::Client::new(),
            session,
        }
    }

    /// Create an API client reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling across clients).
    pub fn with_client(client: reqwest::Client, session: Session) -> Self {
        Self { client, session }
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`PlatformApiError::Api`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, PlatformApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(PlatformApiError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PlatformApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ExportPlatform for PlatformApi {
    /// Submit an export job.
    ///
    /// Sends a `POST /v1/exports` request with the computation
    /// description. Returns a [`JobHandle`] for status polling.
    async fn submit_export(
        &self,
        request: &ExportRequest,
    ) -> Result<JobHandle, PlatformApiError> {
        let response = self
            .client
            .post(format!("{}/v1/exports", self.session.base_url()))
            .bearer_auth(self.session.token())
            .header("x-client-id", self.session.client_id())
            .query(&[("project", self.session.project())])
            .json(request)
            .send()
            .await?;

        let accepted: SubmitResponse = Self::parse_response(response).await?;

        tracing::debug!(
            job_id = %accepted.job_id,
            name = %request.name,
            state = accepted.state.as_str(),
            "Export job accepted",
        );

        Ok(JobHandle {
            id: accepted.job_id,
            name: request.name.clone(),
            submitted_at: Utc::now(),
        })
    }

    /// Query job status.
    ///
    /// Sends a `GET /v1/exports/{id}` request. The platform owns the
    /// state machine; this is a read-only observation.
    async fn job_status(
        &self,
        handle: &JobHandle,
    ) -> Result<JobStatusReport, PlatformApiError> {
        let response = self
            .client
            .get(format!(
                "{}/v1/exports/{}",
                self.session.base_url(),
                handle.id
            ))
            .bearer_auth(self.session.token())
            .send()
            .await?;

        Self::parse_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_response_deserializes() {
        let response: SubmitResponse =
            serde_json::from_str(r#"{"job_id": "j-42", "state": "PENDING"}"#).unwrap();
        assert_eq!(response.job_id, "j-42");
        assert_eq!(response.state, JobState::Pending);
    }

    #[test]
    fn status_report_deserializes_with_detail() {
        let report: JobStatusReport =
            serde_json::from_str(r#"{"state": "FAILED", "detail": "quota exceeded"}"#).unwrap();
        assert_eq!(report.state, JobState::Failed);
        assert_eq!(report.detail.as_deref(), Some("quota exceeded"));
    }

    #[test]
    fn status_report_detail_is_optional() {
        let report: JobStatusReport = serde_json::from_str(r#"{"state": "RUNNING"}"#).unwrap();
        assert_eq!(report.state, JobState::Running);
        assert!(report.detail.is_none());
    }

    #[test]
    fn job_handle_round_trips() {
        let handle = JobHandle {
            id: "j-7".to_string(),
            name: "buildings-part-7".to_string(),
            submitted_at: Utc::now(),
        };
        let json = serde_json::to_string(&handle).unwrap();
        let back: JobHandle = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, handle.id);
        assert_eq!(back.name, handle.name);
    }
}
