//! Client for the remote Earth-observation analytics platform.
//!
//! The platform runs the actual computation (feature filtering, derived
//! metrics, aggregation, export to cloud storage); this crate only
//! covers the two narrow interfaces the exporter consumes: submit an
//! export description and get back a handle, and poll a handle for its
//! state. Authentication is an explicit step ([`Session::authenticate`])
//! rather than a side effect, so it can fail loudly and be mocked in
//! tests.

pub mod api;
pub mod request;
pub mod session;

pub use api::{ExportPlatform, JobHandle, JobStatusReport, PlatformApi, PlatformApiError};
pub use request::{selectors_for_years, ExportDestination, ExportFormat, ExportRequest};
pub use session::{AuthError, Session};
