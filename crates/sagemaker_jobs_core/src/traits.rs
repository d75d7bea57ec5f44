use crate::error::*;
use crate::job::*;

use futures::stream::BoxStream;

/// A trait for injecting the cloud session into the [`JobSubmitter`](crate::submitter::JobSubmitter).
pub trait SessionProvider: Send + Sync + 'static {
    type Backend: TrainingBackend;

    /// Establishes an authenticated session scoped to `region`.
    fn session(
        &self,
        region: &str,
    ) -> impl Future<Output = Result<Self::Backend, TrainingError>> + Send;
}

/// A trait for the platform's job submission API.
pub trait TrainingBackend: Send + Sync + 'static {
    /// Builds the platform job from `spec` and submits it with `input_path` as training data.
    ///
    /// With [`WaitMode::Block`] this only returns once the platform reports a terminal state.
    fn submit(
        &self,
        spec: TrainingJobSpec,
        input_path: &str,
        wait: WaitMode,
    ) -> impl Future<Output = Result<JobHandle, TrainingError>> + Send;

    /// Fetches the current status of a submitted job.
    fn status(&self, job_name: &str)
    -> impl Future<Output = Result<JobStatus, TrainingError>> + Send;

    /// Optional: Streams the training logs of a submitted job.
    fn attach(
        &self,
        _job_name: &str,
    ) -> impl Future<
        Output = Result<BoxStream<'static, Result<LogOutput, TrainingError>>, TrainingError>,
    > + Send {
        async {
            Err(TrainingError::platform(
                "Log streaming not supported by this backend",
            ))
        }
    }
}
