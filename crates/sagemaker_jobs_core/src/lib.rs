//! # sagemaker_jobs Core
//! [![Crates.io](https://img.shields.io/crates/v/sagemaker_jobs_core.svg)](https://crates.io/crates/sagemaker_jobs_core)
//! [![Docs](https://docs.rs/sagemaker_jobs_core/badge.svg)](https://docs.rs/sagemaker_jobs_core/)
//!
//! Types and traits for submitting managed training jobs.
//!
//! - **[`TrainingJobRequest`](job::TrainingJobRequest)**: Everything needed to run one job, with defaults for all optional settings.
//! - **[`JobSubmitter`](submitter::JobSubmitter)**: Validates a request, derives the storage paths and submits the job.
//! - **[`SessionProvider`](traits::SessionProvider)**: Trait for opening a region-scoped cloud session.
//! - **[`TrainingBackend`](traits::TrainingBackend)**: Trait for implementing job submission on a platform (e.g., SageMaker).

pub mod constants;
pub mod error;
pub mod job;
pub mod submitter;
pub mod traits;

pub mod prelude {
    pub use super::constants::*;
    pub use super::error::*;
    pub use super::job::*;
    pub use super::submitter::*;
    pub use super::traits::*;
}
