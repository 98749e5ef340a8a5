use chrono::Utc;

use super::challenge::take_and_validate_challenge;
use super::registry::CredentialRegistry;
use super::utils::split_attestation_certificate;

use crate::u2f::errors::U2fError;
use crate::u2f::types::{
    ClientData, EnrolledCredential, KeyHandle, OperationKind, ParsedRegisterResponse,
    RegisterResponse, Username,
};
use crate::utils::base64url_decode;

const REGISTRATION_RESERVED_BYTE: u8 = 0x05;
const PUBLIC_KEY_LEN: usize = 65;
const UNCOMPRESSED_POINT_TAG: u8 = 0x04;

impl ParsedRegisterResponse {
    /// Parses a raw U2F registration message:
    ///
    /// `0x05 | public key (65) | L (1) | key handle (L) | attestation cert (DER) | signature`
    pub fn from_registration_data(data: &[u8]) -> Result<Self, U2fError> {
        let malformed = |msg: &str| U2fError::MalformedResponse(format!("registrationData: {msg}"));

        let (&reserved, rest) = data.split_first().ok_or_else(|| malformed("empty"))?;
        if reserved != REGISTRATION_RESERVED_BYTE {
            return Err(malformed("reserved byte is not 0x05"));
        }

        if rest.len() < PUBLIC_KEY_LEN {
            return Err(malformed("truncated public key"));
        }
        let (public_key, rest) = rest.split_at(PUBLIC_KEY_LEN);
        if public_key[0] != UNCOMPRESSED_POINT_TAG {
            return Err(malformed("public key is not an uncompressed point"));
        }

        let (&handle_len, rest) = rest
            .split_first()
            .ok_or_else(|| malformed("missing key handle length"))?;
        let handle_len = handle_len as usize;
        if handle_len == 0 {
            return Err(malformed("empty key handle"));
        }
        if rest.len() < handle_len {
            return Err(malformed("truncated key handle"));
        }
        let (key_handle, rest) = rest.split_at(handle_len);

        let (attestation_certificate, signature) = split_attestation_certificate(rest)?;
        if signature.is_empty() {
            return Err(malformed("missing signature"));
        }

        Ok(Self {
            public_key: public_key.to_vec(),
            key_handle: KeyHandle::new(key_handle.to_vec()),
            attestation_certificate: attestation_certificate.to_vec(),
            signature: signature.to_vec(),
        })
    }
}

impl CredentialRegistry {
    /// Finishes a registration ceremony and enrolls the credential.
    ///
    /// 1. Parses the registration message and client data
    /// 2. Consumes the pending registration challenge
    /// 3. Runs the response verifier
    /// 4. Stores the credential, replacing any earlier one for `username`
    ///
    /// Nothing is written unless every step succeeds.
    pub async fn finalize_registration(
        &self,
        username: &Username,
        response: &RegisterResponse,
    ) -> Result<(), U2fError> {
        tracing::debug!("finalize_registration user: {}", username);

        let registration_data = base64url_decode(&response.registration_data)
            .map_err(|e| U2fError::MalformedResponse(format!("registrationData: {e}")))?;
        let parsed = ParsedRegisterResponse::from_registration_data(&registration_data)?;
        tracing::debug!("Parsed registration data: {:?}", parsed);

        let client_data = ClientData::from_base64(&response.client_data)?;
        client_data.expect_type(OperationKind::Registration)?;

        if self.enforce_challenge {
            take_and_validate_challenge(
                self.pending.as_ref(),
                username,
                OperationKind::Registration,
                &client_data.challenge,
            )
            .await?;
        }

        self.verifier
            .verify_registration(&self.app_id, &client_data, &parsed)?;

        let credential = EnrolledCredential {
            public_key: parsed.public_key,
            key_handle: parsed.key_handle,
            enrolled_at: Utc::now(),
        };
        let key_handle = credential.key_handle.clone();

        self.credentials.upsert(username, credential).await?;
        tracing::info!("Enrolled key handle {:?} for {}", key_handle, username);

        Ok(())
    }
}
