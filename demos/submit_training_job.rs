//! # Submit Training Job Example
//!
//! Submits a single SageMaker training job and streams its logs until it finishes.
//!
//! ## Requirements
//!
//! Set the following environment variables:
//! - `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` (or use `aws configure`)
//! - `TRAINING_IMAGE`: ECR URI of the training image.
//! - `TRAINING_ROLE`: ARN of the SageMaker execution role.
//! - `TRAINING_BUCKET`: Bucket with the input data, receives the output.
//! - `TRAINING_INPUT`: Input path inside the bucket.
//!
//! Optional:
//! - `TRAINING_REGION`, `TRAINING_INSTANCE_TYPE`, `TRAINING_OUTPUT`
//! - `TRAINING_SUBNETS`, `TRAINING_SECURITY_GROUPS`: comma separated, enables network isolation.
//! - `TRAINING_REQUEST`: path to a JSON request, replaces all of the above.
//!
//! ## Usage
//!
//! ```sh
//! cargo run --example submit_training_job --features aws
//! ```

use anyhow::Context;
use futures::StreamExt;
use sagemaker_jobs::prelude::*;
use std::env;

fn list(var: &str) -> Vec<String> {
    env::var(var)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn request_from_env() -> anyhow::Result<TrainingJobRequest> {
    if let Ok(path) = env::var("TRAINING_REQUEST") {
        let json = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
        return Ok(TrainingJobRequest::from_json(&json)?);
    }

    let image = env::var("TRAINING_IMAGE").context("TRAINING_IMAGE env var required")?;
    let role = env::var("TRAINING_ROLE").context("TRAINING_ROLE env var required")?;
    let bucket = env::var("TRAINING_BUCKET").context("TRAINING_BUCKET env var required")?;
    let input = env::var("TRAINING_INPUT").context("TRAINING_INPUT env var required")?;

    let mut req = TrainingJobRequest::new(image, role, bucket, input)
        .with_output_path(env::var("TRAINING_OUTPUT").unwrap_or_default());

    if let Ok(region) = env::var("TRAINING_REGION") {
        req = req.with_region(region);
    }
    if let Ok(instance_type) = env::var("TRAINING_INSTANCE_TYPE") {
        req = req.with_instance_type(instance_type);
    }

    let subnets = list("TRAINING_SUBNETS");
    let groups = list("TRAINING_SECURITY_GROUPS");
    let isolated = !subnets.is_empty() || !groups.is_empty();

    Ok(req
        .with_subnets(subnets)
        .with_security_group_ids(groups)
        .with_network_isolation(isolated))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let req = request_from_env()?;
    let region = req.region.clone();

    // Don't block, follow the logs instead.
    let submitter = JobSubmitter::new(AwsSessionProvider::new()).with_wait_mode(WaitMode::Detach);
    let handle = submitter.submit_training_job(req).await?;
    println!("Submitted {}", handle.name);

    let backend = submitter.provider().session(&region).await?;
    let mut logs = backend.attach(&handle.name).await?;
    while let Some(line) = logs.next().await {
        print!("{}", line?.message);
    }

    let status = backend.status(&handle.name).await?;
    println!("{} finished with {:?}", handle.name, status);
    Ok(())
}
