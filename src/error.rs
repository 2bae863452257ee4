use thiserror::Error;

/// Failures specific to the bootstrap procedure.
///
/// Driver and I/O errors are not wrapped here; they travel as `anyhow::Error`
/// with context naming the step that failed.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid sample place '{name}': {reason}")]
    InvalidSample { name: String, reason: String },

    #[error("unexpected reply from `{command}`: {detail}")]
    UnexpectedReply { command: &'static str, detail: String },

    #[error("verification failed: {0}")]
    VerificationFailed(String),
}
