use aws_sdk_cloudwatchlogs::operation::describe_log_streams::DescribeLogStreamsError;
use aws_sdk_cloudwatchlogs::operation::get_log_events::GetLogEventsError;
use aws_credential_types::provider::error::CredentialsError;
use aws_sdk_sagemaker::error::{DisplayErrorContext, SdkError};
use aws_sdk_sagemaker::operation::create_training_job::CreateTrainingJobError;
use aws_sdk_sagemaker::operation::describe_training_job::DescribeTrainingJobError;
use sagemaker_jobs_core::prelude::TrainingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SageMakerError {
    /// The AWS session has no credentials provider configured.
    #[error("No AWS credentials provider for region {0}")]
    MissingCredentials(String),

    /// The credentials provider failed (no profile, expired SSO session, ...).
    #[error("Failed to resolve AWS credentials for region {region}: {}", DisplayErrorContext(.source))]
    Credentials {
        region: String,
        source: CredentialsError,
    },

    /// An extra option is unknown or has the wrong type.
    #[error("Invalid extra options: {0}")]
    InvalidOptions(#[from] serde_json::Error),

    /// Only one of subnets and security groups was supplied.
    #[error("Invalid VPC config: {0}")]
    InvalidVpcConfig(String),

    /// A value does not fit the SageMaker API (e.g., timeouts above `i32::MAX`).
    #[error("Value out of range for {0}")]
    OutOfRange(&'static str),

    #[error("CreateTrainingJob failed: {}", DisplayErrorContext(.0))]
    Create(#[from] SdkError<CreateTrainingJobError>),

    #[error("DescribeTrainingJob failed: {}", DisplayErrorContext(.0))]
    Describe(#[from] SdkError<DescribeTrainingJobError>),

    #[error("DescribeLogStreams failed: {}", DisplayErrorContext(.0))]
    DescribeLogStreams(#[from] aws_sdk_cloudwatchlogs::error::SdkError<DescribeLogStreamsError>),

    #[error("GetLogEvents failed: {}", DisplayErrorContext(.0))]
    GetLogEvents(#[from] aws_sdk_cloudwatchlogs::error::SdkError<GetLogEventsError>),

    /// The job reached the `Failed` state.
    #[error("Training job {name} failed: {reason}")]
    JobFailed { name: String, reason: String },

    #[error("Too many transient errors while polling job {0}")]
    TooManyTransientErrors(String),
}

impl From<SageMakerError> for TrainingError {
    fn from(err: SageMakerError) -> Self {
        TrainingError::platform(err)
    }
}
