use thiserror::Error;

/// Opaque error raised by an external collaborator (cloud session, job submission).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum TrainingError {
    /// Network identifiers were supplied while network isolation was disabled.
    ///
    /// Raised before any session is created or job is submitted.
    #[error("Configuration conflict: {0}")]
    ConfigurationConflict(String),

    /// The request could not be parsed (e.g., malformed JSON config).
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] serde_json::Error),

    /// Failure reported by the cloud platform or its SDK.
    ///
    /// The underlying error is kept as-is, use [`TrainingError::downcast_platform`] to inspect it.
    #[error(transparent)]
    Platform(BoxError),
}

impl TrainingError {
    pub fn platform(err: impl Into<BoxError>) -> Self {
        Self::Platform(err.into())
    }

    /// Returns the underlying platform error if it is of type `E`.
    pub fn downcast_platform<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::Platform(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ConfigurationConflict(_))
    }
}
