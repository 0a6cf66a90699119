//! Explicit authentication against the analytics platform.
//!
//! [`Session::authenticate`] exchanges an API key for a bearer token
//! scoped to one project. Every subsequent API call carries that token.
//! The generated `client_id` (UUID v4) lets the platform attribute
//! concurrent submissions from the same credential to one process.

use serde::Deserialize;

/// An authenticated session with the analytics platform.
///
/// Cheap to clone; holds no live connection, only the credentials and
/// identifiers the API client attaches to each request.
#[derive(Debug, Clone)]
pub struct Session {
    base_url: String,
    token: String,
    project: String,
    client_id: String,
}

/// Errors from the authentication step.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("Authentication request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The platform rejected the credentials.
    #[error("Authentication rejected ({status}): {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

/// Response returned by the platform's session endpoint.
#[derive(Debug, Deserialize)]
struct SessionResponse {
    token: String,
}

impl Session {
    /// Authenticate against the platform and open a session.
    ///
    /// Sends a `POST /v1/auth/sessions` request with the API key and
    /// project id. On success the returned [`Session`] carries the
    /// bearer token for all later calls.
    pub async fn authenticate(
        base_url: &str,
        api_key: &str,
        project: &str,
    ) -> Result<Session, AuthError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let client_id = uuid::Uuid::new_v4().to_string();

        let body = serde_json::json!({
            "api_key": api_key,
            "project": project,
            "client_id": client_id,
        });

        let response = reqwest::Client::new()
            .post(format!("{base_url}/v1/auth/sessions"))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let session: SessionResponse = response.json().await?;

        tracing::info!(
            project,
            client_id = %client_id,
            "Authenticated with analytics platform",
        );

        Ok(Session {
            base_url,
            token: session.token,
            project: project.to_string(),
            client_id,
        })
    }

    /// Base HTTP URL of the platform (no trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Bearer token attached to every API request.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Project the session is scoped to.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Unique client ID generated for this process.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Build a session from already-known parts, bypassing the network.
    ///
    /// Intended for tests and for tooling that manages tokens itself.
    pub fn from_parts(base_url: &str, token: &str, project: &str) -> Session {
        Session {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            project: project.to_string(),
            client_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_parts_strips_trailing_slash() {
        let session = Session::from_parts("http://localhost:8080/", "tok", "demo");
        assert_eq!(session.base_url(), "http://localhost:8080");
        assert_eq!(session.token(), "tok");
        assert_eq!(session.project(), "demo");
    }

    #[test]
    fn client_ids_are_unique_per_session() {
        let a = Session::from_parts("http://localhost:8080", "tok", "demo");
        let b = Session::from_parts("http://localhost:8080", "tok", "demo");
        assert_ne!(a.client_id(), b.client_id());
    }

    #[tokio::test]
    #[ignore] // Requires a live platform instance and PLATFORM_API_KEY.
    async fn authenticate_against_live_platform() {
        let api_key = std::env::var("PLATFORM_API_KEY").expect("PLATFORM_API_KEY must be set");
        let session = Session::authenticate("http://localhost:8080", &api_key, "building-analysis")
            .await
            .expect("authentication should succeed");
        assert!(!session.token().is_empty());
    }
}
