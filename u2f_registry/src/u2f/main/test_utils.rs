//! Test utilities for u2f module tests
//!
//! Builders for raw U2F messages. Signatures are filler bytes and the
//! attestation certificate carries a filler signature; only their structure
//! matters to the parsers.

use crate::u2f::types::{
    AuthenticateResponse, Challenge, KeyHandle, OperationKind, RegisterResponse,
};
use crate::utils::build_p256_certificate;

pub(crate) const TEST_ORIGIN: &str = "android:apk-key-hash:test-facet";

/// 65 byte uncompressed point filled with `fill` after the 0x04 prefix
pub(crate) fn test_public_key(fill: u8) -> Vec<u8> {
    let mut key = vec![0x04];
    key.extend(vec![fill; 64]);
    key
}

/// Structurally valid X.509 attestation certificate with a filler signature
pub(crate) fn test_certificate() -> Vec<u8> {
    build_p256_certificate("Test Attestation", &test_public_key(0x11), |_| {
        Ok(vec![0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x01])
    })
    .expect("test certificate")
}

pub(crate) fn registration_data(public_key: &[u8], key_handle: &[u8]) -> Vec<u8> {
    let mut data = vec![0x05];
    data.extend_from_slice(public_key);
    data.push(key_handle.len() as u8);
    data.extend_from_slice(key_handle);
    data.extend(test_certificate());
    data.extend_from_slice(&[0x30, 0x02, 0x00, 0x00]);
    data
}

pub(crate) fn client_data_json(kind: OperationKind, challenge: &Challenge) -> Vec<u8> {
    serde_json::json!({
        "typ": kind.client_data_type(),
        "challenge": challenge.as_str(),
        "origin": TEST_ORIGIN,
    })
    .to_string()
    .into_bytes()
}

pub(crate) fn register_response(
    public_key: &[u8],
    key_handle: &[u8],
    challenge: &Challenge,
) -> RegisterResponse {
    RegisterResponse::new(
        &registration_data(public_key, key_handle),
        &client_data_json(OperationKind::Registration, challenge),
    )
}

pub(crate) fn signature_data(user_presence: bool, counter: u32) -> Vec<u8> {
    let mut data = vec![user_presence as u8];
    data.extend_from_slice(&counter.to_be_bytes());
    data.extend_from_slice(&[0x30, 0x02, 0x00, 0x00]);
    data
}

pub(crate) fn authenticate_response(
    key_handle: &KeyHandle,
    challenge: &Challenge,
) -> AuthenticateResponse {
    AuthenticateResponse::new(
        key_handle,
        &client_data_json(OperationKind::Authentication, challenge),
        &signature_data(true, 1),
    )
}
