use crate::error::*;
use crate::job::*;
use crate::traits::*;

use tracing::{debug, info, warn};

/// Validates [`TrainingJobRequest`]s and submits them through a [`SessionProvider`].
///
/// Holds no state between calls: submitting the same request twice runs two jobs.
#[derive(Clone, Debug)]
pub struct JobSubmitter<P> {
    provider: P,
    wait: WaitMode,
}

impl<P: SessionProvider> JobSubmitter<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            wait: WaitMode::default(),
        }
    }

    pub fn with_wait_mode(mut self, wait: WaitMode) -> Self {
        self.wait = wait;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Validates `req`, opens a session in its region and submits exactly one training job.
    ///
    /// Validation errors are returned before any external call. Session and submission
    /// errors are returned as [`TrainingError::Platform`], unchanged.
    pub async fn submit_training_job(
        &self,
        req: TrainingJobRequest,
    ) -> Result<JobHandle, TrainingError> {
        let spec = req.build_spec()?;
        let input_path = req.resolved_input_path();

        let backend = self.provider.session(&req.region).await?;

        info!(
            region = %req.region,
            image = %spec.image,
            instance_type = %spec.instance_type,
            input = %input_path,
            output = %spec.output_path,
            network_isolation = spec.uses_network_isolation(),
            "Submitting training job"
        );

        let handle = backend.submit(spec, &input_path, self.wait).await?;
        info!(job = %handle.name, status = ?handle.status, "Training job submitted");
        Ok(handle)
    }
}

impl TrainingJobRequest {
    /// Validates the request and builds the job specification, without any side effects.
    pub fn build_spec(&self) -> Result<TrainingJobSpec, TrainingError> {
        if !self.use_network_isolation
            && !self.subnets.is_empty()
            && !self.security_group_ids.is_empty()
        {
            return Err(TrainingError::ConfigurationConflict(
                "subnets and security groups were passed but network isolation is disabled, \
                 enable network isolation to run the job inside them"
                    .into(),
            ));
        }

        if !self.use_network_isolation
            && (!self.subnets.is_empty() || !self.security_group_ids.is_empty())
        {
            debug!("Network isolation disabled, ignoring partial network configuration");
        }

        // Not enforced here, the platform rejects it.
        if self.use_spot_instances && self.max_wait_seconds <= self.max_run_seconds {
            warn!(
                max_wait = self.max_wait_seconds,
                max_run = self.max_run_seconds,
                "max_wait_seconds should be greater than max_run_seconds for spot training"
            );
        }

        Ok(TrainingJobSpec::from_request(self))
    }
}
