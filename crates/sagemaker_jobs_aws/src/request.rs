use crate::error::SageMakerError;
use crate::options::JobOptions;

use aws_sdk_sagemaker::types::{
    AlgorithmSpecification, Channel, CheckpointConfig, DataSource, OutputDataConfig,
    ResourceConfig, RetryStrategy, S3DataDistribution, S3DataSource, S3DataType,
    StoppingCondition, Tag, TrainingInputMode, TrainingInstanceType, VpcConfig,
};
use chrono::{DateTime, Utc};
use sagemaker_jobs_core::prelude::TrainingJobSpec;
use std::collections::HashMap;

/// Name of the single input channel.
pub const TRAINING_CHANNEL: &str = "training";

const MAX_JOB_NAME_LEN: usize = 63;
/// `-yyyy-mm-dd-HH-MM-SS-mmm`
const TIMESTAMP_LEN: usize = 24;

/// The `CreateTrainingJob` request members built from a [`TrainingJobSpec`].
#[derive(Debug, Clone)]
pub struct TrainingJobParts {
    pub job_name: String,
    pub role_arn: String,
    pub algorithm: AlgorithmSpecification,
    pub input: Channel,
    pub output: OutputDataConfig,
    pub resources: ResourceConfig,
    pub stopping: StoppingCondition,
    pub use_spot_instances: bool,
    pub vpc: Option<VpcConfig>,
    pub hyperparameters: Option<HashMap<String, String>>,
    pub environment: Option<HashMap<String, String>>,
    pub tags: Option<Vec<Tag>>,
    pub checkpoint: Option<CheckpointConfig>,
    pub retry: Option<RetryStrategy>,
    pub enable_network_isolation: bool,
}

impl TrainingJobParts {
    pub fn build(
        spec: &TrainingJobSpec,
        input_path: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, SageMakerError> {
        let opts = JobOptions::from_extra(&spec.extra_options)?;

        let base = opts
            .base_job_name
            .clone()
            .unwrap_or_else(|| base_name_from_image(&spec.image));
        let job_name = job_name(&base, now);

        let input_mode = opts
            .input_mode
            .as_deref()
            .map(TrainingInputMode::from)
            .unwrap_or(TrainingInputMode::File);

        let algorithm = AlgorithmSpecification::builder()
            .training_image(&spec.image)
            .training_input_mode(input_mode)
            .build();

        let s3_source = S3DataSource::builder()
            .s3_data_type(S3DataType::S3Prefix)
            .s3_uri(s3_uri(input_path))
            .s3_data_distribution_type(S3DataDistribution::FullyReplicated)
            .build();

        let input = Channel::builder()
            .channel_name(TRAINING_CHANNEL)
            .data_source(DataSource::builder().s3_data_source(s3_source).build())
            .build();

        let output = OutputDataConfig::builder()
            .s3_output_path(s3_uri(&spec.output_path))
            .set_kms_key_id(opts.output_kms_key.clone())
            .build();

        let resources = ResourceConfig::builder()
            .instance_type(TrainingInstanceType::from(spec.instance_type.as_str()))
            .instance_count(to_i32(spec.instance_count, "instance_count")?)
            .volume_size_in_gb(to_i32(spec.volume_size_gb, "volume_size_gb")?)
            .set_volume_kms_key_id(opts.volume_kms_key.clone())
            .build();

        // Max wait is only accepted together with managed spot training.
        let max_wait = if spec.use_spot_instances {
            Some(to_i32(spec.max_wait_seconds, "max_wait_seconds")?)
        } else {
            None
        };

        let stopping = StoppingCondition::builder()
            .max_runtime_in_seconds(to_i32(spec.max_run_seconds, "max_run_seconds")?)
            .set_max_wait_time_in_seconds(max_wait)
            .build();

        let vpc = vpc_config(spec)?;

        let tags = if opts.tags.is_empty() {
            None
        } else {
            let tags = opts
                .tags
                .iter()
                .map(|t| Tag::builder().key(&t.key).value(&t.value).build())
                .collect::<Vec<_>>();
            Some(tags)
        };

        let checkpoint = match &opts.checkpoint_s3_uri {
            Some(uri) => Some(
                CheckpointConfig::builder()
                    .s3_uri(s3_uri(uri))
                    .set_local_path(opts.checkpoint_local_path.clone())
                    .build(),
            ),
            None => None,
        };

        let retry = match opts.max_retry_attempts {
            Some(attempts) => Some(
                RetryStrategy::builder()
                    .maximum_retry_attempts(to_i32(attempts, "max_retry_attempts")?)
                    .build(),
            ),
            None => None,
        };

        let environment = (!opts.environment.is_empty()).then(|| opts.environment.clone());

        Ok(Self {
            job_name,
            role_arn: spec.role.clone(),
            algorithm,
            input,
            output,
            resources,
            stopping,
            use_spot_instances: spec.use_spot_instances,
            vpc,
            hyperparameters: opts.hyperparameters(),
            environment,
            tags,
            checkpoint,
            retry,
            enable_network_isolation: opts.enable_network_isolation,
        })
    }
}

/// Builds the VPC config when network isolation was requested with both subnets and security groups.
///
/// A single list is rejected rather than silently dropping the VPC config.
fn vpc_config(spec: &TrainingJobSpec) -> Result<Option<VpcConfig>, SageMakerError> {
    let subnets = spec.subnets.clone().unwrap_or_default();
    let groups = spec.security_group_ids.clone().unwrap_or_default();

    match (subnets.is_empty(), groups.is_empty()) {
        (true, true) => Ok(None),
        (false, false) => Ok(Some(
            VpcConfig::builder()
                .set_subnets(Some(subnets))
                .set_security_group_ids(Some(groups))
                .build(),
        )),
        (true, false) => Err(SageMakerError::InvalidVpcConfig(
            "security groups were passed without subnets".into(),
        )),
        (false, true) => Err(SageMakerError::InvalidVpcConfig(
            "subnets were passed without security groups".into(),
        )),
    }
}

fn to_i32(value: u32, field: &'static str) -> Result<i32, SageMakerError> {
    i32::try_from(value).map_err(|_| SageMakerError::OutOfRange(field))
}

/// Prefixes `path` with `s3://` unless it already carries a scheme.
pub fn s3_uri(path: &str) -> String {
    if path.contains("://") {
        path.to_string()
    } else {
        format!("s3://{path}")
    }
}

/// Repository name of an image reference, e.g. `decision-trees` for
/// `123456789012.dkr.ecr.us-east-1.amazonaws.com/decision-trees:latest`.
pub fn base_name_from_image(image: &str) -> String {
    let repo = image.rsplit('/').next().unwrap_or(image);
    let repo = repo.split(['@', ':']).next().unwrap_or(repo);
    repo.to_string()
}

/// `<base>-<yyyy-mm-dd-HH-MM-SS-mmm>`, sanitized and truncated to the 63 characters SageMaker allows.
pub fn job_name(base: &str, now: DateTime<Utc>) -> String {
    let mut base: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let trimmed = base.trim_matches('-');
    base = if trimmed.is_empty() {
        "training".to_string()
    } else {
        trimmed.to_string()
    };
    base.truncate(MAX_JOB_NAME_LEN - TIMESTAMP_LEN);

    format!("{}-{}", base.trim_end_matches('-'), now.format("%Y-%m-%d-%H-%M-%S-%3f"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sagemaker_jobs_core::prelude::*;
    use serde_json::json;

    const IMAGE: &str = "123456789012.dkr.ecr.us-east-1.amazonaws.com/sagemaker-decision-trees:latest";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap()
    }

    fn request() -> TrainingJobRequest {
        TrainingJobRequest::new(
            IMAGE,
            "arn:aws:iam::123456789012:role/SageMakerRole",
            "sagemaker-artifacts",
            "input-data",
        )
    }

    fn parts(req: &TrainingJobRequest) -> Result<TrainingJobParts, SageMakerError> {
        let spec = req.build_spec().unwrap();
        TrainingJobParts::build(&spec, &req.resolved_input_path(), now())
    }

    #[test]
    fn uri() {
        assert_eq!(s3_uri("bucket/output"), "s3://bucket/output");
        assert_eq!(s3_uri("s3://bucket/output"), "s3://bucket/output");
    }

    #[test]
    fn image_base_name() {
        assert_eq!(base_name_from_image(IMAGE), "sagemaker-decision-trees");
        assert_eq!(base_name_from_image("trees"), "trees");
        assert_eq!(base_name_from_image("repo/trees@sha256:abc"), "trees");
        assert_eq!(base_name_from_image("localhost:5000/trees:1.0"), "trees");
    }

    #[test]
    fn names() {
        assert_eq!(
            job_name("sagemaker-decision-trees", now()),
            "sagemaker-decision-trees-2026-03-04-05-06-07-000"
        );
        assert_eq!(job_name("my_job.v2", now()), "my-job-v2-2026-03-04-05-06-07-000");
        assert_eq!(job_name("__", now()), "training-2026-03-04-05-06-07-000");

        let long = job_name(&"a".repeat(100), now());
        assert_eq!(long.len(), MAX_JOB_NAME_LEN);
    }

    #[test]
    fn defaults() {
        let parts = parts(&request()).unwrap();

        assert_eq!(parts.job_name, "sagemaker-decision-trees-2026-03-04-05-06-07-000");
        assert_eq!(parts.role_arn, "arn:aws:iam::123456789012:role/SageMakerRole");
        assert_eq!(parts.resources.instance_count(), Some(1));
        assert_eq!(
            parts.resources.instance_type().map(|t| t.as_str()),
            Some("ml.m5.4xlarge")
        );
        assert_eq!(parts.stopping.max_runtime_in_seconds(), Some(86400));
        assert_eq!(parts.stopping.max_wait_time_in_seconds(), Some(86401));
        assert!(parts.use_spot_instances);
        assert!(parts.vpc.is_none());
        assert!(parts.hyperparameters.is_none());
        assert!(parts.environment.is_none());
        assert!(parts.tags.is_none());
        assert!(parts.checkpoint.is_none());
        assert!(!parts.enable_network_isolation);
    }

    #[test]
    fn no_max_wait_without_spot() {
        let parts = parts(&request().with_spot_instances(false)).unwrap();
        assert_eq!(parts.stopping.max_wait_time_in_seconds(), None);
        assert!(!parts.use_spot_instances);
    }

    #[test]
    fn vpc_with_network_isolation() {
        let req = request()
            .with_network_isolation(true)
            .with_subnets(["subnet-1"])
            .with_security_group_ids(["sg-1"]);
        assert!(parts(&req).unwrap().vpc.is_some());

        // Nothing to attach.
        let req = request().with_network_isolation(true);
        assert!(parts(&req).unwrap().vpc.is_none());
    }

    #[test]
    fn vpc_needs_both_lists() {
        let req = request()
            .with_network_isolation(true)
            .with_subnets(["subnet-1"]);
        assert!(matches!(
            parts(&req).unwrap_err(),
            SageMakerError::InvalidVpcConfig(_)
        ));
    }

    #[test]
    fn extra_options() {
        let req = request()
            .with_extra_option("base_job_name", "trees")
            .with_extra_option("hyperparameters", json!({ "max_depth": 5 }))
            .with_extra_option("environment", json!({ "MODE": "fast" }))
            .with_extra_option("tags", json!([{ "Key": "team", "Value": "ml" }]))
            .with_extra_option("checkpoint_s3_uri", "sagemaker-artifacts/checkpoints")
            .with_extra_option("enable_network_isolation", true);
        let parts = parts(&req).unwrap();

        assert_eq!(parts.job_name, "trees-2026-03-04-05-06-07-000");
        assert_eq!(parts.hyperparameters.unwrap()["max_depth"], "5");
        assert_eq!(parts.environment.unwrap()["MODE"], "fast");
        assert_eq!(parts.tags.map(|t| t.len()), Some(1));
        assert!(parts.checkpoint.is_some());
        assert!(parts.retry.is_none());
        assert!(parts.enable_network_isolation);
    }

    #[test]
    fn retry_attempts_option() {
        let req = request().with_extra_option("max_retry_attempts", 3);
        let retry = parts(&req).unwrap().retry.unwrap();
        assert_eq!(retry.maximum_retry_attempts(), Some(3));
    }

    #[test]
    fn unknown_extra_option() {
        let req = request().with_extra_option("distribution", json!({ "mpi": {} }));
        assert!(matches!(
            parts(&req).unwrap_err(),
            SageMakerError::InvalidOptions(_)
        ));
    }

    #[test]
    fn timeout_out_of_range() {
        let req = request().with_max_run_seconds(u32::MAX);
        assert!(matches!(
            parts(&req).unwrap_err(),
            SageMakerError::OutOfRange("max_run_seconds")
        ));
    }
}
