//! Replicate predictions client and image generation job controller.
//!
//! Provides typed request/response messages for the `/predictions` API,
//! an HTTP client behind the [`api::PredictionBackend`] seam, a rotating
//! credential pool, and [`controller::GenerationJobController`], which
//! drives one generation from creation through bounded polling.

pub mod api;
pub mod controller;
pub mod credentials;
pub mod error;
pub mod messages;

pub use api::{PredictionBackend, RawResponse, ReplicateApi, ReplicateApiError};
pub use controller::{GenerationJob, GenerationJobController, JobState};
pub use credentials::{CredentialPool, CredentialPoolError};
pub use error::GenerationError;
