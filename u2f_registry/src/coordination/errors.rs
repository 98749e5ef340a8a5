//! Error types for ceremony coordination

use thiserror::Error;

use crate::u2f::U2fError;

/// Errors surfaced to the caller driving a ceremony.
#[derive(Error, Debug)]
pub enum CoordinationError {
    /// The external signer failed, was cancelled, or timed out
    #[error("Signer failure: {0}")]
    SignerFailure(String),

    /// Error from challenge issuance or the credential registry
    #[error("U2F error: {0}")]
    U2fError(U2fError),
}

impl CoordinationError {
    /// Log the error and return self
    ///
    /// This method logs the error with appropriate context and returns self,
    /// allowing for method chaining and explicit logging when needed.
    pub fn log(self) -> Self {
        match &self {
            Self::SignerFailure(msg) => tracing::error!("Signer failure: {}", msg),
            Self::U2fError(err) => tracing::error!("U2F error: {}", err),
        }
        self
    }

    pub fn is_unknown_identity(&self) -> bool {
        matches!(self, Self::U2fError(err) if err.is_unknown_identity())
    }

    pub fn is_malformed_response(&self) -> bool {
        matches!(self, Self::U2fError(U2fError::MalformedResponse(_)))
    }

    pub fn is_signer_failure(&self) -> bool {
        matches!(self, Self::SignerFailure(_))
    }
}

impl From<U2fError> for CoordinationError {
    fn from(err: U2fError) -> Self {
        let error = Self::U2fError(err);
        tracing::error!("{}", error);
        error
    }
}
