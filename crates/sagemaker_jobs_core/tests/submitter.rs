use sagemaker_jobs_core::prelude::*;

use std::fmt;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct Submission {
    spec: TrainingJobSpec,
    input_path: String,
    wait: WaitMode,
}

#[derive(Debug, Default)]
struct Recorded {
    sessions: Vec<String>,
    submissions: Vec<Submission>,
}

/// External error raised by the fake platform.
#[derive(Debug, PartialEq)]
struct QuotaExceeded(&'static str);

impl fmt::Display for QuotaExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "quota exceeded: {}", self.0)
    }
}

impl std::error::Error for QuotaExceeded {}

#[derive(Debug, Clone, Default)]
struct RecordingProvider {
    recorded: Arc<Mutex<Recorded>>,
    fail_session: bool,
    fail_submit: bool,
}

impl RecordingProvider {
    fn sessions(&self) -> Vec<String> {
        self.recorded.lock().unwrap().sessions.clone()
    }

    fn submissions(&self) -> Vec<Submission> {
        self.recorded.lock().unwrap().submissions.clone()
    }
}

impl SessionProvider for RecordingProvider {
    type Backend = RecordingBackend;

    async fn session(&self, region: &str) -> Result<RecordingBackend, TrainingError> {
        if self.fail_session {
            return Err(TrainingError::platform(QuotaExceeded("session")));
        }
        self.recorded
            .lock()
            .unwrap()
            .sessions
            .push(region.to_string());
        Ok(RecordingBackend {
            recorded: self.recorded.clone(),
            fail_submit: self.fail_submit,
        })
    }
}

#[derive(Debug, Clone)]
struct RecordingBackend {
    recorded: Arc<Mutex<Recorded>>,
    fail_submit: bool,
}

impl TrainingBackend for RecordingBackend {
    async fn submit(
        &self,
        spec: TrainingJobSpec,
        input_path: &str,
        wait: WaitMode,
    ) -> Result<JobHandle, TrainingError> {
        if self.fail_submit {
            return Err(TrainingError::platform(QuotaExceeded("ml.m5.4xlarge")));
        }
        let mut recorded = self.recorded.lock().unwrap();
        recorded.submissions.push(Submission {
            spec,
            input_path: input_path.to_string(),
            wait,
        });
        let status = match wait {
            WaitMode::Block => JobStatus::Completed,
            WaitMode::Detach => JobStatus::Pending,
        };
        Ok(JobHandle {
            name: format!("job-{}", recorded.submissions.len()),
            status,
        })
    }

    async fn status(&self, _job_name: &str) -> Result<JobStatus, TrainingError> {
        Ok(JobStatus::Running)
    }
}

fn request() -> TrainingJobRequest {
    TrainingJobRequest::new(
        "123456789012.dkr.ecr.us-east-1.amazonaws.com/sagemaker-decision-trees:latest",
        "arn:aws:iam::123456789012:role/SageMakerRole",
        "sagemaker-artifacts",
        "input-data",
    )
}

#[tokio::test]
async fn submits_without_network_config() {
    let provider = RecordingProvider::default();
    let submitter = JobSubmitter::new(provider.clone());

    let handle = submitter.submit_training_job(request()).await.unwrap();
    assert_eq!(handle.status, JobStatus::Completed);

    let submissions = provider.submissions();
    assert_eq!(submissions.len(), 1);

    let submission = &submissions[0];
    assert_eq!(submission.input_path, "sagemaker-artifacts/input-data");
    assert_eq!(submission.spec.output_path, "sagemaker-artifacts/output");
    assert_eq!(submission.spec.subnets, None);
    assert_eq!(submission.spec.security_group_ids, None);
    assert_eq!(submission.wait, WaitMode::Block);
    assert_eq!(provider.sessions(), vec!["us-east-1".to_string()]);
}

#[tokio::test]
async fn conflict_without_network_isolation() {
    let provider = RecordingProvider::default();
    let submitter = JobSubmitter::new(provider.clone());

    let req = request()
        .with_subnets(["subnet-1"])
        .with_security_group_ids(["sg-1"]);
    let err = submitter.submit_training_job(req).await.unwrap_err();

    assert!(err.is_conflict());
    assert!(provider.sessions().is_empty());
    assert!(provider.submissions().is_empty());
}

#[tokio::test]
async fn partial_network_config_is_not_a_conflict() {
    let provider = RecordingProvider::default();
    let submitter = JobSubmitter::new(provider.clone());

    submitter
        .submit_training_job(request().with_subnets(["subnet-1"]))
        .await
        .unwrap();
    submitter
        .submit_training_job(request().with_security_group_ids(["sg-1"]))
        .await
        .unwrap();

    let submissions = provider.submissions();
    assert_eq!(submissions.len(), 2);
    assert!(submissions.iter().all(|s| s.spec.subnets.is_none()));
    assert!(submissions.iter().all(|s| s.spec.security_group_ids.is_none()));
}

#[tokio::test]
async fn network_isolation_attaches_network_fields() {
    let provider = RecordingProvider::default();
    let submitter = JobSubmitter::new(provider.clone());

    let req = request()
        .with_network_isolation(true)
        .with_subnets(["subnet-09eee0125678355c3"])
        .with_security_group_ids(["sg-098457cc5a4b04971"]);
    submitter.submit_training_job(req).await.unwrap();

    // Absent identifiers are passed through as well.
    submitter
        .submit_training_job(request().with_network_isolation(true))
        .await
        .unwrap();

    let submissions = provider.submissions();
    assert_eq!(
        submissions[0].spec.subnets,
        Some(vec!["subnet-09eee0125678355c3".to_string()])
    );
    assert_eq!(
        submissions[0].spec.security_group_ids,
        Some(vec!["sg-098457cc5a4b04971".to_string()])
    );
    assert_eq!(submissions[1].spec.subnets, Some(vec![]));
    assert_eq!(submissions[1].spec.security_group_ids, Some(vec![]));
}

#[tokio::test]
async fn forwards_remaining_fields() {
    let provider = RecordingProvider::default();
    let submitter = JobSubmitter::new(provider.clone()).with_wait_mode(WaitMode::Detach);

    let req = request()
        .with_output_path("run-7")
        .with_instance_type("ml.g5.xlarge")
        .with_volume_size_gb(100)
        .with_max_run_seconds(3600)
        .with_max_wait_seconds(7200)
        .with_spot_instances(false)
        .with_region("eu-west-1")
        .with_extra_option("hyperparameters", serde_json::json!({ "max_depth": 5 }))
        .with_extra_option("unknown_to_the_submitter", true);

    let handle = submitter.submit_training_job(req).await.unwrap();
    assert_eq!(handle.status, JobStatus::Pending);

    let spec = &provider.submissions()[0].spec;
    assert_eq!(spec.instance_count, 1);
    assert_eq!(spec.instance_type, "ml.g5.xlarge");
    assert_eq!(spec.output_path, "sagemaker-artifacts/output/run-7");
    assert_eq!(spec.volume_size_gb, 100);
    assert_eq!(spec.max_run_seconds, 3600);
    assert_eq!(spec.max_wait_seconds, 7200);
    assert!(!spec.use_spot_instances);
    assert_eq!(spec.extra_options["hyperparameters"]["max_depth"], 5);
    assert_eq!(spec.extra_options["unknown_to_the_submitter"], true);
    assert_eq!(provider.sessions(), vec!["eu-west-1".to_string()]);
}

#[tokio::test]
async fn unenforced_wait_constraint_still_submits() {
    let provider = RecordingProvider::default();
    let submitter = JobSubmitter::new(provider.clone());

    let req = request().with_max_run_seconds(100).with_max_wait_seconds(50);
    submitter.submit_training_job(req).await.unwrap();

    assert_eq!(provider.submissions()[0].spec.max_wait_seconds, 50);
}

#[tokio::test]
async fn each_call_submits_a_new_job() {
    let provider = RecordingProvider::default();
    let submitter = JobSubmitter::new(provider.clone());

    let first = submitter.submit_training_job(request()).await.unwrap();
    let second = submitter.submit_training_job(request()).await.unwrap();

    assert_ne!(first.name, second.name);
    assert_eq!(provider.submissions().len(), 2);
}

#[tokio::test]
async fn session_errors_propagate_unchanged() {
    let provider = RecordingProvider {
        fail_session: true,
        ..Default::default()
    };
    let submitter = JobSubmitter::new(provider.clone());

    let err = submitter.submit_training_job(request()).await.unwrap_err();
    assert_eq!(
        err.downcast_platform::<QuotaExceeded>(),
        Some(&QuotaExceeded("session"))
    );
    assert!(provider.submissions().is_empty());
}

#[tokio::test]
async fn submit_errors_propagate_unchanged() {
    let provider = RecordingProvider {
        fail_submit: true,
        ..Default::default()
    };
    let submitter = JobSubmitter::new(provider.clone());

    let err = submitter.submit_training_job(request()).await.unwrap_err();
    assert!(!err.is_conflict());
    assert_eq!(err.to_string(), "quota exceeded: ml.m5.4xlarge");
}

#[tokio::test]
async fn attach_is_unsupported_by_default() {
    let backend = RecordingProvider::default().session("us-east-1").await.unwrap();
    assert!(backend.attach("job-1").await.is_err());
    assert_eq!(backend.status("job-1").await.unwrap(), JobStatus::Running);
}

#[test]
fn build_spec_has_no_side_effects() {
    let spec = request().build_spec().unwrap();
    assert_eq!(spec.instance_count, 1);
    assert_eq!(spec.output_path, "sagemaker-artifacts/output");
}
