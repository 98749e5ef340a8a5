use thiserror::Error;

use crate::utils::UtilError;

/// Errors that can occur while issuing challenges or finalizing U2F ceremonies.
///
/// Every variant is terminal for the ceremony attempt that produced it. Callers
/// are expected to start over with a fresh challenge.
#[derive(Debug, Error)]
pub enum U2fError {
    /// No credential is enrolled for the identity
    #[error("Unknown identity: {0}")]
    UnknownIdentity(String),

    /// The signed response could not be parsed into its expected fields
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// No challenge is pending for the identity and operation
    #[error("Challenge not found: {0}")]
    ChallengeNotFound(String),

    /// The pending challenge outlived its timeout
    #[error("Challenge expired: {0}")]
    ChallengeExpired(String),

    /// The challenge signed by the client differs from the one issued
    #[error("Challenge mismatch: {0}")]
    ChallengeMismatch(String),

    /// A response verifier rejected the response
    #[error("Verification error: {0}")]
    Verification(String),

    /// Error accessing or modifying stored credentials or challenges
    #[error("Storage error: {0}")]
    Storage(String),

    /// Error in cryptographic operations (e.g., random generation)
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Error related to relying party configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from utility operations
    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),
}

impl U2fError {
    /// True for the errors a caller should present as "this user has no security key".
    pub fn is_unknown_identity(&self) -> bool {
        matches!(self, Self::UnknownIdentity(_))
    }

    /// True for any failure to bind the response to an issued challenge.
    pub fn is_challenge_error(&self) -> bool {
        matches!(
            self,
            Self::ChallengeNotFound(_) | Self::ChallengeExpired(_) | Self::ChallengeMismatch(_)
        )
    }
}
