use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while setting up or running a training run.
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration value is out of range. Rejected before any
    /// computation starts.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The vocabulary (or a structure derived from it) violates a
    /// precondition of the training engine.
    #[error("{0}")]
    Structural(String),

    /// A worker task died mid-run. Weight updates already applied are not
    /// rolled back.
    #[error("training failed: {0}")]
    Training(String),
}
