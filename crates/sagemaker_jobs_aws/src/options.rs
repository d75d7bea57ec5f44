use crate::error::SageMakerError;
use sagemaker_jobs_core::prelude::ExtraOptions;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// The extra options understood by the SageMaker backend.
///
/// Keys follow the SageMaker Python SDK estimator arguments. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobOptions {
    /// Prefix of the generated job name. Derived from the image name if missing.
    pub base_job_name: Option<String>,
    /// Passed to the container as strings; non-string values are JSON-encoded.
    #[serde(default)]
    pub hyperparameters: HashMap<String, Value>,
    #[serde(default)]
    pub environment: HashMap<String, String>,
    #[serde(default)]
    pub tags: Vec<TagOption>,
    /// `File`, `Pipe` or `FastFile`. Defaults to `File`.
    pub input_mode: Option<String>,
    /// Blocks all outbound traffic from the training container.
    #[serde(default)]
    pub enable_network_isolation: bool,
    pub checkpoint_s3_uri: Option<String>,
    pub checkpoint_local_path: Option<String>,
    pub volume_kms_key: Option<String>,
    pub output_kms_key: Option<String>,
    /// Retries of the whole job after an internal platform error.
    pub max_retry_attempts: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TagOption {
    #[serde(alias = "Key")]
    pub key: String,
    #[serde(alias = "Value")]
    pub value: String,
}

impl JobOptions {
    pub fn from_extra(extra: &ExtraOptions) -> Result<Self, SageMakerError> {
        Ok(serde_json::from_value(Value::Object(extra.clone()))?)
    }

    pub fn hyperparameters(&self) -> Option<HashMap<String, String>> {
        if self.hyperparameters.is_empty() {
            return None;
        }

        let params = self
            .hyperparameters
            .iter()
            .map(|(k, v)| {
                let v = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), v)
            })
            .collect();
        Some(params)
    }
}
