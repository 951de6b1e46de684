/// Terminal outcomes of a generation other than success.
///
/// Only quota responses at creation are retried locally (by rotating the
/// credential). Everything else is surfaced to the caller unchanged.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The request failed validation before any network call.
    #[error("Invalid generation request: {0}")]
    InvalidRequest(String),

    /// The remote answered 403. Needs human re-authorization; never retried.
    #[error("Access to the generation API was revoked")]
    AccessRevoked,

    /// Every credential in the pool answered 429 or 402.
    #[error("All {attempts} API credentials are rate limited or out of quota")]
    AllCredentialsExhausted { attempts: usize },

    /// Unexpected non-2xx status.
    #[error("Generation API returned HTTP {status}")]
    RemoteError { status: u16 },

    /// No response was obtained at all.
    #[error("Generation API unreachable: {0}")]
    NetworkUnavailable(String),

    /// The job did not reach a terminal state within the poll budget.
    #[error("Timed out waiting for image generation after {attempts} status checks")]
    Timeout { attempts: u32 },

    /// The remote reported that the job itself failed.
    #[error("Image generation failed: {detail}")]
    RemoteFailure { detail: String },

    /// A 2xx body did not match the expected shape or carried an
    /// unrecognized status.
    #[error("Unexpected response from generation API: {0}")]
    UnexpectedPayload(String),

    /// The caller abandoned the job.
    #[error("Generation cancelled")]
    Cancelled,
}

impl GenerationError {
    /// Whether a human could reasonably retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::AllCredentialsExhausted { .. }
                | GenerationError::NetworkUnavailable(_)
                | GenerationError::Timeout { .. }
                | GenerationError::RemoteError { .. }
        )
    }
}

impl From<convertx_core::error::CoreError> for GenerationError {
    fn from(err: convertx_core::error::CoreError) -> Self {
        match err {
            convertx_core::error::CoreError::Validation(msg) => GenerationError::InvalidRequest(msg),
            other => GenerationError::InvalidRequest(other.to_string()),
        }
    }
}
