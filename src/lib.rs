//! # sagemaker_jobs
//![![License](https://img.shields.io/badge/license-MIT%2FApache-blue.svg)](https://github.com/sagemaker-jobs/sagemaker_jobs)
//![![Crates.io](https://img.shields.io/crates/v/sagemaker_jobs.svg)](https://crates.io/crates/sagemaker_jobs)
//![![Docs](https://docs.rs/sagemaker_jobs/badge.svg)](https://docs.rs/sagemaker_jobs/)
//!
//! Validates training job requests and submits them to Amazon SageMaker.
//!
//! This crate serves as an entry point, re-exporting the core logic and
//! optionally including the AWS backend via a feature flag.
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | **`aws`** | SageMaker session provider and backend (`sagemaker_jobs_aws`). |
//!
//! ## Example: Spot training inside a VPC
//!
//! ```toml
//! [dependencies]
//! sagemaker_jobs = { version = "0.3", features = ["aws"] }
//! ```
//!
//! ```rust,ignore
//! use sagemaker_jobs::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), TrainingError> {
//!     let req = TrainingJobRequest::new(
//!         "123456789012.dkr.ecr.us-east-1.amazonaws.com/sagemaker-decision-trees:latest",
//!         "arn:aws:iam::123456789012:role/SageMakerRole",
//!         "sagemaker-artifacts",
//!         "input-data",
//!     )
//!     .with_subnets(["subnet-09eee0125678355c3"])
//!     .with_security_group_ids(["sg-098457cc5a4b04971"])
//!     .with_network_isolation(true);
//!
//!     // Blocks until the job finished. Output lands in `s3://sagemaker-artifacts/output`.
//!     let handle = JobSubmitter::new(AwsSessionProvider::new())
//!         .submit_training_job(req)
//!         .await?;
//!     println!("{}: {:?}", handle.name, handle.status);
//!     Ok(())
//! }
//! ```

pub use sagemaker_jobs_core::*;

#[cfg(feature = "aws")]
pub mod aws {
    pub use sagemaker_jobs_aws::*;
}

pub mod prelude {
    pub use sagemaker_jobs_core::prelude::*;

    #[cfg(feature = "aws")]
    pub use sagemaker_jobs_aws::{AwsSessionProvider, SageMakerBackend, SageMakerError};
}
