//! Image generation job controller.
//!
//! [`GenerationJobController`] creates a prediction (rotating credentials
//! on quota errors), then polls it on a fixed interval until it reaches a
//! terminal state, the poll budget runs out, or the caller cancels.
//!
//! ```text
//! Created -(2xx)-> Polling -(succeeded)-> Succeeded
//!                  Polling -(failed)----> Failed
//!                  Polling -(attempt>60)-> TimedOut
//! Created -(429/402, credentials left)-> Created   (rotate + retry)
//! Created|Polling -(403)-> AccessRevoked
//! ```

use std::sync::Arc;
use std::time::Duration;

use convertx_core::generation::GenerationRequest;
use convertx_core::history::{HistoryEntry, HistoryLog};
use tokio_util::sync::CancellationToken;

use crate::api::{PredictionBackend, RawResponse};
use crate::credentials::CredentialPool;
use crate::error::GenerationError;
use crate::messages::{
    parse_create_response, parse_status_response, PredictionRequest, PredictionStatus,
};

/// Wait between consecutive status checks.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Maximum number of status checks per job (~120 s at [`POLL_INTERVAL`]).
pub const MAX_POLL_ATTEMPTS: u32 = 60;

/// Detail recorded when the remote fails a job without saying why.
const UNKNOWN_FAILURE: &str = "Unknown error";

const STATUS_FORBIDDEN: u16 = 403;
const STATUS_PAYMENT_REQUIRED: u16 = 402;
const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Lifecycle state of a [`GenerationJob`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Created,
    Polling,
    Succeeded,
    Failed,
    TimedOut,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::TimedOut
        )
    }
}

/// One remote prediction, in flight or finished.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationJob {
    /// Remote prediction id; `None` until creation succeeds.
    pub id: Option<String>,
    pub state: JobState,
    /// Status checks performed so far.
    pub attempt: u32,
    /// Pool index of the credential that created the job.
    pub credential_index: usize,
    pub result_url: Option<String>,
    pub error_detail: Option<String>,
}

impl GenerationJob {
    fn new(credential_index: usize) -> Self {
        Self {
            id: None,
            state: JobState::Created,
            attempt: 0,
            credential_index,
            result_url: None,
            error_detail: None,
        }
    }

    /// Completion fraction in `[0, 1]` derived from the attempt count.
    pub fn progress(&self) -> f64 {
        match self.state {
            JobState::Succeeded => 1.0,
            _ => f64::from(self.attempt) / f64::from(MAX_POLL_ATTEMPTS),
        }
    }
}

/// Drives image generation jobs against a [`PredictionBackend`].
///
/// Cheap to share behind an `Arc`; the credential cursor is the only
/// mutable state and is updated atomically.
pub struct GenerationJobController {
    backend: Arc<dyn PredictionBackend>,
    credentials: Arc<CredentialPool>,
    history: Option<HistoryLog>,
}

impl GenerationJobController {
    pub fn new(backend: Arc<dyn PredictionBackend>, credentials: Arc<CredentialPool>) -> Self {
        Self {
            backend,
            credentials,
            history: None,
        }
    }

    /// Record successful submissions in `history`.
    pub fn with_history(mut self, history: HistoryLog) -> Self {
        self.history = Some(history);
        self
    }

    pub fn credentials(&self) -> &CredentialPool {
        &self.credentials
    }

    /// Create the remote prediction.
    ///
    /// On 429/402 the credential cursor is rotated and creation retried,
    /// at most once per credential in the pool. On success the job is in
    /// [`JobState::Polling`] and, when `user_email` is given, a history
    /// entry is prepended to that user's log.
    pub async fn submit(
        &self,
        request: &GenerationRequest,
        user_email: Option<&str>,
    ) -> Result<GenerationJob, GenerationError> {
        request.validate()?;

        let body = PredictionRequest::from_generation(request);
        let pool_size = self.credentials.len();
        let mut job = GenerationJob::new(self.credentials.cursor());

        for attempt in 1..=pool_size {
            let index = self.credentials.cursor();
            job.credential_index = index;

            let reply = self
                .backend
                .create_prediction(self.credentials.credential(index), &body)
                .await
                .map_err(|e| {
                    tracing::warn!(credential_index = index, error = %e, "Prediction create failed");
                    GenerationError::NetworkUnavailable(e.to_string())
                })?;

            match reply.status {
                STATUS_FORBIDDEN => {
                    tracing::warn!(credential_index = index, "Generation API access revoked");
                    return Err(GenerationError::AccessRevoked);
                }
                STATUS_TOO_MANY_REQUESTS | STATUS_PAYMENT_REQUIRED => {
                    let next = self.credentials.rotate_from(index);
                    tracing::warn!(
                        credential_index = index,
                        next_credential_index = next,
                        status = reply.status,
                        attempt,
                        "Credential rate limited or out of quota, rotating",
                    );
                }
                _ if reply.is_success() => {
                    let created = parse_create_response(&reply.body)
                        .map_err(|e| GenerationError::UnexpectedPayload(e.to_string()))?;
                    tracing::info!(
                        job_id = %created.id,
                        credential_index = index,
                        remote_status = ?created.status,
                        "Prediction created",
                    );
                    job.id = Some(created.id);
                    job.state = JobState::Polling;

                    self.record_history(request, user_email).await;
                    return Ok(job);
                }
                status => {
                    tracing::error!(credential_index = index, status, "Prediction create rejected");
                    return Err(GenerationError::RemoteError { status });
                }
            }
        }

        tracing::error!(attempts = pool_size, "Every credential exhausted");
        Err(GenerationError::AllCredentialsExhausted {
            attempts: pool_size,
        })
    }

    /// Poll a submitted job until it finishes.
    ///
    /// The first check is immediate, then one every [`POLL_INTERVAL`], at
    /// most [`MAX_POLL_ATTEMPTS`] times. `on_progress` receives
    /// `attempt / MAX_POLL_ATTEMPTS` after every non-terminal check and
    /// `1.0` on success, so values never reach 1 before success.
    ///
    /// Returns the first output URL on success. A job that ends as
    /// succeeded, failed or timed out carries that state. A job abandoned
    /// for any other reason (revoked access, transport or protocol errors,
    /// cancellation) stays in [`JobState::Polling`] with `error_detail`
    /// set to the reason.
    pub async fn await_completion<F>(
        &self,
        job: &mut GenerationJob,
        on_progress: F,
        cancel: &CancellationToken,
    ) -> Result<String, GenerationError>
    where
        F: FnMut(f64) + Send,
    {
        let prediction_id = match (&job.id, job.state) {
            (Some(id), JobState::Polling) => id.clone(),
            (_, state) => {
                return Err(GenerationError::InvalidRequest(format!(
                    "Job cannot be polled in state {state:?}"
                )))
            }
        };

        let result = self
            .poll_until_done(job, &prediction_id, on_progress, cancel)
            .await;
        if let Err(e) = &result {
            if !job.state.is_terminal() {
                job.error_detail = Some(e.to_string());
            }
        }
        result
    }

    /// Submit and poll in one call, returning the finished job.
    pub async fn generate<F>(
        &self,
        request: &GenerationRequest,
        user_email: Option<&str>,
        on_progress: F,
        cancel: &CancellationToken,
    ) -> Result<GenerationJob, GenerationError>
    where
        F: FnMut(f64) + Send,
    {
        let mut job = self.submit(request, user_email).await?;
        self.await_completion(&mut job, on_progress, cancel).await?;
        Ok(job)
    }

    // ---- private helpers ----

    async fn poll_until_done<F>(
        &self,
        job: &mut GenerationJob,
        prediction_id: &str,
        mut on_progress: F,
        cancel: &CancellationToken,
    ) -> Result<String, GenerationError>
    where
        F: FnMut(f64) + Send,
    {
        let credential = self.credentials.credential(job.credential_index);

        loop {
            if job.attempt >= MAX_POLL_ATTEMPTS {
                job.state = JobState::TimedOut;
                job.error_detail = Some(format!(
                    "No terminal status after {} checks",
                    job.attempt
                ));
                tracing::warn!(job_id = %prediction_id, attempts = job.attempt, "Prediction timed out");
                return Err(GenerationError::Timeout {
                    attempts: job.attempt,
                });
            }
            if cancel.is_cancelled() {
                return Err(Self::cancelled(prediction_id, job));
            }

            job.attempt += 1;

            let reply = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Self::cancelled(prediction_id, job)),
                reply = self.backend.get_prediction(credential, prediction_id) => reply,
            };
            let reply = reply.map_err(|e| {
                tracing::warn!(job_id = %prediction_id, attempt = job.attempt, error = %e, "Status check failed");
                GenerationError::NetworkUnavailable(e.to_string())
            })?;

            let status = Self::check_status_reply(prediction_id, job.attempt, &reply)?;

            match status.status {
                PredictionStatus::Succeeded => {
                    let url = status.first_output().map(str::to_string).ok_or_else(|| {
                        GenerationError::UnexpectedPayload(
                            "prediction succeeded without output".to_string(),
                        )
                    })?;
                    job.state = JobState::Succeeded;
                    job.result_url = Some(url.clone());
                    on_progress(1.0);
                    tracing::info!(job_id = %prediction_id, attempts = job.attempt, "Prediction succeeded");
                    return Ok(url);
                }
                PredictionStatus::Failed | PredictionStatus::Canceled => {
                    let detail = status
                        .error_message()
                        .unwrap_or_else(|| UNKNOWN_FAILURE.to_string());
                    job.state = JobState::Failed;
                    job.error_detail = Some(detail.clone());
                    tracing::error!(job_id = %prediction_id, detail = %detail, "Prediction failed");
                    return Err(GenerationError::RemoteFailure { detail });
                }
                PredictionStatus::Starting | PredictionStatus::Processing => {
                    tracing::debug!(
                        job_id = %prediction_id,
                        attempt = job.attempt,
                        status = ?status.status,
                        "Prediction still running",
                    );
                    if job.attempt < MAX_POLL_ATTEMPTS {
                        on_progress(job.progress());
                    }
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Self::cancelled(prediction_id, job)),
                _ = tokio::time::sleep(POLL_INTERVAL) => {}
            }
        }
    }

    /// Classify a status-check reply. 403 ends the job as revoked; any
    /// other non-2xx (including 429/402, which are not rotated while
    /// polling) ends it as a remote error.
    fn check_status_reply(
        prediction_id: &str,
        attempt: u32,
        reply: &RawResponse,
    ) -> Result<crate::messages::PredictionStatusResponse, GenerationError> {
        if reply.status == STATUS_FORBIDDEN {
            tracing::warn!(job_id = %prediction_id, attempt, "Generation API access revoked while polling");
            return Err(GenerationError::AccessRevoked);
        }
        if !reply.is_success() {
            tracing::error!(job_id = %prediction_id, attempt, status = reply.status, "Status check rejected");
            return Err(GenerationError::RemoteError {
                status: reply.status,
            });
        }
        parse_status_response(&reply.body)
            .map_err(|e| GenerationError::UnexpectedPayload(e.to_string()))
    }

    fn cancelled(prediction_id: &str, job: &GenerationJob) -> GenerationError {
        tracing::info!(job_id = %prediction_id, attempt = job.attempt, "Prediction polling cancelled");
        GenerationError::Cancelled
    }

    /// Append to the user's history off the async runtime; the store may
    /// do blocking file I/O. Failures are logged and swallowed.
    async fn record_history(&self, request: &GenerationRequest, user_email: Option<&str>) {
        let (Some(history), Some(user)) = (&self.history, user_email) else {
            return;
        };
        let history = history.clone();
        let owner = user.to_string();
        let entry = HistoryEntry::image_generation(request.prompt());

        match tokio::task::spawn_blocking(move || history.append(&owner, entry)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(user = %user, error = %e, "Failed to record generation history");
            }
            Err(e) => {
                tracing::warn!(user = %user, error = %e, "History task failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!JobState::Created.is_terminal());
        assert!(!JobState::Polling.is_terminal());
        assert!(JobState::Succeeded.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(JobState::TimedOut.is_terminal());
    }

    #[test]
    fn progress_stays_below_one_until_success() {
        let mut job = GenerationJob::new(0);
        job.state = JobState::Polling;
        job.attempt = MAX_POLL_ATTEMPTS - 1;
        assert!(job.progress() < 1.0);

        job.state = JobState::Succeeded;
        assert_eq!(job.progress(), 1.0);
    }

    #[test]
    fn poll_budget_is_two_minutes() {
        assert_eq!(POLL_INTERVAL * MAX_POLL_ATTEMPTS, Duration::from_secs(120));
    }
}
