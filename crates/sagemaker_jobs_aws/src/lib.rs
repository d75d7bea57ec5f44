//! # sagemaker_jobs AWS
//! [![Crates.io](https://img.shields.io/crates/v/sagemaker_jobs_aws.svg)](https://crates.io/crates/sagemaker_jobs_aws)
//! [![Docs](https://docs.rs/sagemaker_jobs_aws/badge.svg)](https://docs.rs/sagemaker_jobs_aws/)
//!
//! Amazon SageMaker implementation of the [`SessionProvider`] and [`TrainingBackend`] traits.
//!
//! Credentials are resolved by `aws-config` (environment, profile, instance metadata, ...).
//!
//! ## Usage
//!
//! ```no_run
//! use sagemaker_jobs_aws::AwsSessionProvider;
//! use sagemaker_jobs_core::prelude::*;
//!
//! async fn run() -> Result<(), TrainingError> {
//!     let submitter = JobSubmitter::new(AwsSessionProvider::new());
//!     let req = TrainingJobRequest::new(
//!         "123456789012.dkr.ecr.us-east-1.amazonaws.com/decision-trees:latest",
//!         "arn:aws:iam::123456789012:role/SageMakerRole",
//!         "sagemaker-artifacts",
//!         "input-data",
//!     );
//!     let handle = submitter.submit_training_job(req).await?;
//!     println!("{} finished with {:?}", handle.name, handle.status);
//!     Ok(())
//! }
//! ```

mod error;
mod logs;
mod options;
mod request;

pub use error::SageMakerError;
pub use logs::LOG_GROUP;
pub use options::{JobOptions, TagOption};
pub use request::{TRAINING_CHANNEL, TrainingJobParts, base_name_from_image, job_name, s3_uri};

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_cloudwatchlogs::Client as LogsClient;
use aws_sdk_sagemaker::Client as SageMakerClient;
use aws_sdk_sagemaker::error::SdkError;
use aws_sdk_sagemaker::operation::describe_training_job::DescribeTrainingJobOutput;
use aws_sdk_sagemaker::types::{SecondaryStatus, TrainingJobStatus};
use chrono::Utc;
use futures::stream::BoxStream;
use sagemaker_jobs_core::prelude::*;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
const LOG_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_TRANSIENT_ERRORS: u32 = 15;

/// Opens SageMaker sessions from the default AWS credential chain.
#[derive(Clone, Debug)]
pub struct AwsSessionProvider {
    profile: Option<String>,
    poll_interval: Duration,
}

impl Default for AwsSessionProvider {
    fn default() -> Self {
        Self {
            profile: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl AwsSessionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a named profile from the shared AWS config files.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// How often a blocking submission polls the job status.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

impl SessionProvider for AwsSessionProvider {
    type Backend = SageMakerBackend;

    async fn session(&self, region: &str) -> Result<SageMakerBackend, TrainingError> {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));
        if let Some(profile) = &self.profile {
            loader = loader.profile_name(profile);
        }

        let config = loader.load().await;
        resolve_credentials(&config, region).await?;

        debug!(region, "Opened AWS session");
        Ok(SageMakerBackend::new(&config).with_poll_interval(self.poll_interval))
    }
}

/// Fails the session when no credentials can be resolved, before any job is built.
async fn resolve_credentials(config: &SdkConfig, region: &str) -> Result<(), SageMakerError> {
    let provider = config
        .credentials_provider()
        .ok_or_else(|| SageMakerError::MissingCredentials(region.to_string()))?;

    provider
        .provide_credentials()
        .await
        .map_err(|source| SageMakerError::Credentials {
            region: region.to_string(),
            source,
        })?;
    Ok(())
}

#[derive(Clone, Debug)]
pub struct SageMakerBackend {
    sagemaker: SageMakerClient,
    logs: LogsClient,
    poll_interval: Duration,
}

impl SageMakerBackend {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            sagemaker: SageMakerClient::new(config),
            logs: LogsClient::new(config),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    async fn create(&self, parts: TrainingJobParts) -> Result<(), SageMakerError> {
        let TrainingJobParts {
            job_name,
            role_arn,
            algorithm,
            input,
            output,
            resources,
            stopping,
            use_spot_instances,
            vpc,
            hyperparameters,
            environment,
            tags,
            checkpoint,
            retry,
            enable_network_isolation,
        } = parts;

        self.sagemaker
            .create_training_job()
            .training_job_name(job_name)
            .role_arn(role_arn)
            .algorithm_specification(algorithm)
            .input_data_config(input)
            .output_data_config(output)
            .resource_config(resources)
            .stopping_condition(stopping)
            .enable_managed_spot_training(use_spot_instances)
            .enable_network_isolation(enable_network_isolation)
            .set_vpc_config(vpc)
            .set_hyper_parameters(hyperparameters)
            .set_environment(environment)
            .set_tags(tags)
            .set_checkpoint_config(checkpoint)
            .set_retry_strategy(retry)
            .send()
            .await?;

        Ok(())
    }

    async fn describe(&self, job_name: &str) -> Result<JobStatus, SageMakerError> {
        let output = self
            .sagemaker
            .describe_training_job()
            .training_job_name(job_name)
            .send()
            .await?;
        Ok(status_from_aws(&output))
    }

    /// Polls until the job is `Completed` or `Stopped`. `Failed` is returned as an error.
    async fn wait_for_completion(&self, job_name: &str) -> Result<JobStatus, SageMakerError> {
        let mut last: Option<JobStatus> = None;
        let mut error_count = 0;

        loop {
            match self.describe(job_name).await {
                Ok(status) => {
                    error_count = 0;
                    if last.as_ref() != Some(&status) {
                        info!(job = job_name, status = ?status, "Training job status changed");
                        last = Some(status.clone());
                    }

                    match status {
                        JobStatus::Failed(reason) => {
                            return Err(SageMakerError::JobFailed {
                                name: job_name.to_string(),
                                reason,
                            });
                        }
                        status if status.is_terminal() => return Ok(status),
                        _ => {}
                    }
                }
                Err(SageMakerError::Describe(e))
                    if matches!(e, SdkError::DispatchFailure(_) | SdkError::TimeoutError(_)) =>
                {
                    error_count += 1;
                    if error_count > MAX_TRANSIENT_ERRORS {
                        return Err(SageMakerError::TooManyTransientErrors(job_name.to_string()));
                    }
                    warn!(job = job_name, "Transient error while polling training job: {e}");
                }
                Err(e) => return Err(e),
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

impl TrainingBackend for SageMakerBackend {
    async fn submit(
        &self,
        spec: TrainingJobSpec,
        input_path: &str,
        wait: WaitMode,
    ) -> Result<JobHandle, TrainingError> {
        let parts = TrainingJobParts::build(&spec, input_path, Utc::now())?;
        let name = parts.job_name.clone();

        self.create(parts).await?;
        info!(job = %name, "Created training job");

        let status = match wait {
            WaitMode::Detach => JobStatus::Pending,
            WaitMode::Block => self.wait_for_completion(&name).await?,
        };

        Ok(JobHandle { name, status })
    }

    async fn status(&self, job_name: &str) -> Result<JobStatus, TrainingError> {
        Ok(self.describe(job_name).await?)
    }

    async fn attach(
        &self,
        job_name: &str,
    ) -> Result<BoxStream<'static, Result<LogOutput, TrainingError>>, TrainingError> {
        // Fail early on unknown jobs instead of polling forever.
        self.describe(job_name).await?;
        info!(job = job_name, "Attached to training job logs");

        Ok(logs::log_stream(
            self.sagemaker.clone(),
            self.logs.clone(),
            job_name,
            LOG_POLL_INTERVAL,
        ))
    }
}

pub(crate) fn status_from_aws(output: &DescribeTrainingJobOutput) -> JobStatus {
    map_status(
        output.training_job_status(),
        output.secondary_status(),
        output.failure_reason(),
    )
}

fn map_status(
    status: Option<&TrainingJobStatus>,
    secondary: Option<&SecondaryStatus>,
    failure_reason: Option<&str>,
) -> JobStatus {
    match status {
        Some(TrainingJobStatus::Completed) => JobStatus::Completed,
        Some(TrainingJobStatus::Stopped) => JobStatus::Stopped,
        Some(TrainingJobStatus::Failed) => {
            JobStatus::Failed(failure_reason.unwrap_or("unknown reason").to_string())
        }
        Some(TrainingJobStatus::InProgress) => match secondary {
            Some(SecondaryStatus::Starting) | None => JobStatus::Pending,
            Some(_) => JobStatus::Running,
        },
        Some(TrainingJobStatus::Stopping) => JobStatus::Running,
        _ => JobStatus::Pending,
    }
}
