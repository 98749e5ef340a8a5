use async_trait::async_trait;
use thiserror::Error;

use crate::u2f::{AuthenticateResponse, AuthenticationRequest, RegisterResponse, RegistrationRequest};

/// Failure reported by a signer implementation.
#[derive(Debug, Error)]
pub enum SignerError {
    /// The user dismissed the prompt
    #[error("Cancelled by user")]
    Cancelled,

    /// Transport or device level failure
    #[error("Device error: {0}")]
    Device(String),
}

/// The hardware credential, seen from the relying party.
///
/// Calls may block on user interaction for an unbounded time; callers bound
/// them with a timeout. A signer never touches the registry.
#[async_trait]
pub trait Signer: Send + Sync {
    async fn register(&self, request: &RegistrationRequest)
    -> Result<RegisterResponse, SignerError>;

    async fn authenticate(
        &self,
        request: &AuthenticationRequest,
    ) -> Result<AuthenticateResponse, SignerError>;
}
