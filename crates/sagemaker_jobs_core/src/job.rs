use crate::constants::{INSTANCE_COUNT, OUTPUT_PREFIX, defaults};
use crate::error::TrainingError;
use serde::{Deserialize, Serialize};

/// Additional submission parameters, forwarded opaquely to the [`TrainingBackend`](crate::traits::TrainingBackend).
///
/// The submitter never validates or interprets these.
pub type ExtraOptions = serde_json::Map<String, serde_json::Value>;

/// A request to run a single training job.
///
/// Built once per call and discarded after submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingJobRequest {
    /// The container image to run, e.g. an ECR image URI.
    pub docker_image_ref: String,
    /// The role the platform assumes to run the job.
    pub execution_role_ref: String,
    /// Bucket holding the input data and receiving the output artifacts.
    pub artifact_bucket: String,
    /// Location of the input data, relative to the bucket root.
    pub input_path: String,
    /// Location of the output data, relative to the bucket's `output` prefix.
    ///
    /// Empty writes straight into the `output` prefix.
    #[serde(default)]
    pub output_path: String,
    #[serde(default = "default_instance_type")]
    pub instance_type: String,
    #[serde(default)]
    pub subnets: Vec<String>,
    #[serde(default)]
    pub security_group_ids: Vec<String>,
    #[serde(default = "default_volume_size_gb")]
    pub volume_size_gb: u32,
    /// Training timeout, enforced by the platform.
    #[serde(default = "default_max_run_seconds")]
    pub max_run_seconds: u32,
    /// Timeout waiting for spot capacity, enforced by the platform.
    ///
    /// Must be greater than [`max_run_seconds`](Self::max_run_seconds) when spot instances are used.
    #[serde(default = "default_max_wait_seconds")]
    pub max_wait_seconds: u32,
    #[serde(default = "default_use_spot_instances")]
    pub use_spot_instances: bool,
    #[serde(default = "default_region")]
    pub region: String,
    /// Run the job inside the given subnets and security groups.
    #[serde(default)]
    pub use_network_isolation: bool,
    #[serde(default)]
    pub extra_options: ExtraOptions,
}

fn default_instance_type() -> String {
    defaults::INSTANCE_TYPE.to_string()
}

fn default_volume_size_gb() -> u32 {
    defaults::VOLUME_SIZE_GB
}

fn default_max_run_seconds() -> u32 {
    defaults::MAX_RUN_SECONDS
}

fn default_max_wait_seconds() -> u32 {
    defaults::MAX_WAIT_SECONDS
}

fn default_use_spot_instances() -> bool {
    defaults::USE_SPOT_INSTANCES
}

fn default_region() -> String {
    defaults::REGION.to_string()
}

impl TrainingJobRequest {
    pub fn new(
        docker_image_ref: impl Into<String>,
        execution_role_ref: impl Into<String>,
        artifact_bucket: impl Into<String>,
        input_path: impl Into<String>,
    ) -> Self {
        Self {
            docker_image_ref: docker_image_ref.into(),
            execution_role_ref: execution_role_ref.into(),
            artifact_bucket: artifact_bucket.into(),
            input_path: input_path.into(),
            output_path: String::new(),
            instance_type: default_instance_type(),
            subnets: Vec::new(),
            security_group_ids: Vec::new(),
            volume_size_gb: defaults::VOLUME_SIZE_GB,
            max_run_seconds: defaults::MAX_RUN_SECONDS,
            max_wait_seconds: defaults::MAX_WAIT_SECONDS,
            use_spot_instances: defaults::USE_SPOT_INSTANCES,
            region: default_region(),
            use_network_isolation: defaults::USE_NETWORK_ISOLATION,
            extra_options: ExtraOptions::new(),
        }
    }

    /// Parses a request from JSON. Missing optional fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, TrainingError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_output_path(mut self, path: impl Into<String>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn with_instance_type(mut self, instance_type: impl Into<String>) -> Self {
        self.instance_type = instance_type.into();
        self
    }

    pub fn with_subnets<I, T>(mut self, subnets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.subnets = subnets.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_security_group_ids<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.security_group_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_volume_size_gb(mut self, size: u32) -> Self {
        self.volume_size_gb = size;
        self
    }

    pub fn with_max_run_seconds(mut self, seconds: u32) -> Self {
        self.max_run_seconds = seconds;
        self
    }

    pub fn with_max_wait_seconds(mut self, seconds: u32) -> Self {
        self.max_wait_seconds = seconds;
        self
    }

    pub fn with_spot_instances(mut self, enabled: bool) -> Self {
        self.use_spot_instances = enabled;
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_network_isolation(mut self, enabled: bool) -> Self {
        self.use_network_isolation = enabled;
        self
    }

    pub fn with_extra_option(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.extra_options.insert(key.into(), value.into());
        self
    }

    /// `<bucket>/<input_path>`
    pub fn resolved_input_path(&self) -> String {
        format!("{}/{}", self.artifact_bucket, self.input_path)
    }

    /// `<bucket>/output`, followed by `/<output_path>` if one was given.
    pub fn resolved_output_path(&self) -> String {
        let base = format!("{}/{OUTPUT_PREFIX}", self.artifact_bucket);
        if self.output_path.is_empty() {
            base
        } else {
            format!("{base}/{}", self.output_path)
        }
    }
}

/// The platform job specification built from a validated [`TrainingJobRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingJobSpec {
    pub image: String,
    pub role: String,
    /// Always [`INSTANCE_COUNT`].
    pub instance_count: u32,
    pub instance_type: String,
    pub output_path: String,
    pub volume_size_gb: u32,
    pub use_spot_instances: bool,
    pub max_run_seconds: u32,
    pub max_wait_seconds: u32,
    /// [`Some`] exactly when network isolation was requested, even if no subnets were supplied.
    pub subnets: Option<Vec<String>>,
    /// [`Some`] exactly when network isolation was requested, even if no security groups were supplied.
    pub security_group_ids: Option<Vec<String>>,
    pub extra_options: ExtraOptions,
}

impl TrainingJobSpec {
    pub(crate) fn from_request(req: &TrainingJobRequest) -> Self {
        let (subnets, security_group_ids) = if req.use_network_isolation {
            (
                Some(req.subnets.clone()),
                Some(req.security_group_ids.clone()),
            )
        } else {
            (None, None)
        };

        Self {
            image: req.docker_image_ref.clone(),
            role: req.execution_role_ref.clone(),
            instance_count: INSTANCE_COUNT,
            instance_type: req.instance_type.clone(),
            output_path: req.resolved_output_path(),
            volume_size_gb: req.volume_size_gb,
            use_spot_instances: req.use_spot_instances,
            max_run_seconds: req.max_run_seconds,
            max_wait_seconds: req.max_wait_seconds,
            subnets,
            security_group_ids,
            extra_options: req.extra_options.clone(),
        }
    }

    pub fn uses_network_isolation(&self) -> bool {
        self.subnets.is_some() || self.security_group_ids.is_some()
    }
}

/// How long [`TrainingBackend::submit`](crate::traits::TrainingBackend::submit) blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitMode {
    /// Return once the job reached a terminal state.
    #[default]
    Block,
    /// Return as soon as the platform accepted the job.
    Detach,
}

/// A submitted training job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobHandle {
    /// The platform's name for the job.
    pub name: String,
    /// The status at the time the submit call returned.
    pub status: JobStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Stopped,
    Failed(String),
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Stopped | Self::Failed(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogOutput {
    /// RFC3339 timestamp string ,e.g., "2026-01-01T01:00:00Z".
    pub timestamp: Option<String>,
    pub message: String,
}
