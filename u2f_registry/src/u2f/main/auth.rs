use super::challenge::take_and_validate_challenge;
use super::registry::CredentialRegistry;

use crate::u2f::errors::U2fError;
use crate::u2f::types::{
    AuthenticateResponse, ClientData, KeyHandle, OperationKind, ParsedAuthenticateResponse,
    Username,
};
use crate::utils::base64url_decode;

const USER_PRESENCE_FLAG: u8 = 0x01;
const SIGNATURE_DATA_HEADER_LEN: usize = 5;

impl ParsedAuthenticateResponse {
    /// Parses the key handle and the raw U2F signature data:
    ///
    /// `user presence (1) | counter (4, big endian) | signature`
    pub fn from_parts(key_handle: &[u8], signature_data: &[u8]) -> Result<Self, U2fError> {
        if key_handle.is_empty() {
            return Err(U2fError::MalformedResponse(
                "keyHandle: empty key handle".to_string(),
            ));
        }
        if signature_data.len() <= SIGNATURE_DATA_HEADER_LEN {
            return Err(U2fError::MalformedResponse(
                "signatureData: truncated".to_string(),
            ));
        }

        let (header, signature) = signature_data.split_at(SIGNATURE_DATA_HEADER_LEN);
        let counter = u32::from_be_bytes([header[1], header[2], header[3], header[4]]);

        Ok(Self {
            key_handle: KeyHandle::new(key_handle.to_vec()),
            user_presence: header[0] & USER_PRESENCE_FLAG == USER_PRESENCE_FLAG,
            counter,
            signature: signature.to_vec(),
        })
    }
}

impl CredentialRegistry {
    /// Finishes an authentication ceremony.
    ///
    /// Fails with [`U2fError::UnknownIdentity`] before looking at the response
    /// when `username` has no credential. Never modifies the enrolled
    /// credential.
    pub async fn finalize_authentication(
        &self,
        username: &Username,
        response: &AuthenticateResponse,
    ) -> Result<(), U2fError> {
        tracing::debug!("finalize_authentication user: {}", username);

        let credential = self.credentials.get(username).await?.ok_or_else(|| {
            U2fError::UnknownIdentity(format!("No credential enrolled for {username}"))
        })?;

        let signature_data = base64url_decode(&response.signature_data)
            .map_err(|e| U2fError::MalformedResponse(format!("signatureData: {e}")))?;
        let parsed =
            ParsedAuthenticateResponse::from_parts(response.key_handle.as_bytes(), &signature_data)?;
        tracing::debug!("Parsed authenticate response: {:?}", parsed);

        let client_data = ClientData::from_base64(&response.client_data)?;
        client_data.expect_type(OperationKind::Authentication)?;

        if self.enforce_challenge {
            take_and_validate_challenge(
                self.pending.as_ref(),
                username,
                OperationKind::Authentication,
                &client_data.challenge,
            )
            .await?;
        }

        self.verifier
            .verify_authentication(&self.app_id, &client_data, &parsed, &credential)?;

        tracing::info!(
            "Authenticated {} with key handle {:?} (user presence: {}, counter: {})",
            username,
            parsed.key_handle,
            parsed.user_presence,
            parsed.counter
        );

        Ok(())
    }
}
