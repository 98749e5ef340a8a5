use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use super::errors::U2fError;
use crate::utils::{base64url_decode, base64url_encode};

/// Protocol version advertised in requests and echoed by U2F devices.
pub const U2F_VERSION: &str = "U2F_V2";

/// Type-safe wrapper for the username an enrollment is keyed by.
///
/// Usernames are opaque to the registry: two identities are the same iff
/// their strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Username(String);

impl Username {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Username {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque handle addressing a device-bound key pair.
///
/// Serialized as unpadded base64url, the form it travels in on the wire.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct KeyHandle(Vec<u8>);

impl KeyHandle {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_base64url(&self) -> String {
        base64url_encode(&self.0)
    }

    pub fn from_base64url(encoded: &str) -> Result<Self, U2fError> {
        Ok(Self(base64url_decode(encoded)?))
    }
}

impl fmt::Debug for KeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyHandle({})", self.to_base64url())
    }
}

impl Serialize for KeyHandle {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64url())
    }
}

impl<'de> Deserialize<'de> for KeyHandle {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::from_base64url(&encoded).map_err(serde::de::Error::custom)
    }
}

/// A challenge rendered as unpadded base64url.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Challenge(String);

impl Challenge {
    pub(crate) fn from_bytes(bytes: &[u8]) -> Self {
        Self(base64url_encode(bytes))
    }

    /// Wraps an already encoded challenge, e.g. one read back from client data.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Application identifier shared by every request of a relying party instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppId(String);

impl AppId {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self(app_id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Facet identifier of the calling application.
///
/// Computed once at startup from the host's signing identity and treated as
/// opaque afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacetId(String);

const FACET_PREFIX: &str = "android:apk-key-hash:";

impl FacetId {
    pub fn new(facet_id: impl Into<String>) -> Self {
        Self(facet_id.into())
    }

    /// Derives the facet id from the DER bytes of the host's signing certificate.
    pub fn from_signing_certificate(der: &[u8]) -> Self {
        let digest = Sha256::digest(der);
        Self(format!("{FACET_PREFIX}{}", base64url_encode(&digest)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The two ceremonies a challenge can be issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Registration,
    Authentication,
}

impl OperationKind {
    /// Value of the `typ` member the client puts in its client data.
    pub fn client_data_type(&self) -> &'static str {
        match self {
            Self::Registration => "navigator.id.finishEnrollment",
            Self::Authentication => "navigator.id.getAssertion",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registration => f.write_str("registration"),
            Self::Authentication => f.write_str("authentication"),
        }
    }
}

/// Request handed to the signer to enroll a new credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub app_id: AppId,
    pub facet_id: FacetId,
    pub challenge: Challenge,
    pub version: String,
}

/// Request handed to the signer to prove possession of an enrolled credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationRequest {
    pub app_id: AppId,
    pub facet_id: FacetId,
    pub challenge: Challenge,
    pub key_handle: KeyHandle,
    pub version: String,
}

/// Signed registration payload returned by the signer.
///
/// Both members are unpadded base64url. `registration_data` carries the raw
/// U2F registration message, `client_data` the JSON the device signed over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub registration_data: String,
    pub client_data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl RegisterResponse {
    pub fn new(registration_data: &[u8], client_data: &[u8]) -> Self {
        Self {
            registration_data: base64url_encode(registration_data),
            client_data: base64url_encode(client_data),
            version: Some(U2F_VERSION.to_string()),
        }
    }

    /// Parses the JSON form a client posts back.
    pub fn from_json(json: &str) -> Result<Self, U2fError> {
        serde_json::from_str(json).map_err(|e| U2fError::MalformedResponse(e.to_string()))
    }
}

/// Signed authentication payload returned by the signer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateResponse {
    /// Decoded from base64url when the response is deserialized
    pub key_handle: KeyHandle,
    pub client_data: String,
    pub signature_data: String,
}

impl AuthenticateResponse {
    pub fn new(key_handle: &KeyHandle, client_data: &[u8], signature_data: &[u8]) -> Self {
        Self {
            key_handle: key_handle.clone(),
            client_data: base64url_encode(client_data),
            signature_data: base64url_encode(signature_data),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, U2fError> {
        serde_json::from_str(json).map_err(|e| U2fError::MalformedResponse(e.to_string()))
    }
}

/// Fields extracted from a U2F registration message.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRegisterResponse {
    /// Uncompressed P-256 point, 0x04 || X || Y
    pub public_key: Vec<u8>,
    pub key_handle: KeyHandle,
    /// DER encoded attestation certificate
    pub attestation_certificate: Vec<u8>,
    /// DER encoded ECDSA signature
    pub signature: Vec<u8>,
}

/// Fields extracted from a U2F authentication response.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAuthenticateResponse {
    pub key_handle: KeyHandle,
    pub user_presence: bool,
    pub counter: u32,
    pub signature: Vec<u8>,
}

/// Client data the device signed over.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientData {
    pub typ: String,
    pub challenge: Challenge,
    pub origin: String,
    /// Decoded JSON bytes, needed to recompute the client data hash
    pub raw: Vec<u8>,
}

/// A credential enrolled for an identity.
///
/// Overwritten when the identity registers again; never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrolledCredential {
    pub public_key: Vec<u8>,
    pub key_handle: KeyHandle,
    pub enrolled_at: DateTime<Utc>,
}

/// A challenge issued for an identity and not yet consumed by a finalize call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingChallenge {
    pub username: Username,
    pub kind: OperationKind,
    pub challenge: Challenge,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PendingChallenge {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
