use crate::u2f::errors::U2fError;
use crate::u2f::types::{
    AppId, ClientData, EnrolledCredential, ParsedAuthenticateResponse, ParsedRegisterResponse,
};

/// Cryptographic checks run after a response has been parsed and its challenge
/// consumed, and before the registry acts on it.
///
/// A production relying party verifies the attestation signature (and
/// optionally the attestation certificate against a trust store) at
/// registration, and the assertion signature against the stored public key at
/// authentication. Return [`U2fError::Verification`] to reject.
pub trait ResponseVerifier: Send + Sync + 'static {
    fn verify_registration(
        &self,
        app_id: &AppId,
        client_data: &ClientData,
        response: &ParsedRegisterResponse,
    ) -> Result<(), U2fError>;

    fn verify_authentication(
        &self,
        app_id: &AppId,
        client_data: &ClientData,
        response: &ParsedAuthenticateResponse,
        credential: &EnrolledCredential,
    ) -> Result<(), U2fError>;
}

/// Accepts every well-formed response.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSignatureCheck;

impl ResponseVerifier for NoSignatureCheck {
    // TODO: verify the attestation signature over
    // 0x00 | sha256(app id) | sha256(client data) | key handle | public key
    // with the attestation certificate's key.
    fn verify_registration(
        &self,
        _app_id: &AppId,
        _client_data: &ClientData,
        response: &ParsedRegisterResponse,
    ) -> Result<(), U2fError> {
        tracing::debug!(
            "Skipping attestation signature check for key handle {:?}",
            response.key_handle
        );
        Ok(())
    }

    // TODO: verify the assertion signature over
    // sha256(app id) | user presence | counter | sha256(client data)
    // with the stored public key.
    fn verify_authentication(
        &self,
        _app_id: &AppId,
        _client_data: &ClientData,
        response: &ParsedAuthenticateResponse,
        _credential: &EnrolledCredential,
    ) -> Result<(), U2fError> {
        tracing::debug!(
            "Skipping assertion signature check for key handle {:?} (counter {})",
            response.key_handle,
            response.counter
        );
        Ok(())
    }
}
