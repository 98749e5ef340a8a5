//! In-process signer backed by `ring` P-256 keys.
//!
//! Produces byte-exact U2F registration and authentication messages with real
//! ECDSA signatures. It has no attestation authority: the attestation
//! certificate is a self-signed X.509 certificate for the credential's own key,
//! and the registration is signed with that same key. Meant for demos and tests.

use async_trait::async_trait;
use ring::rand::SystemRandom;
use ring::signature::{ECDSA_P256_SHA256_ASN1_SIGNING, EcdsaKeyPair, KeyPair};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::u2f::{
    AuthenticateResponse, AuthenticationRequest, KeyHandle, OperationKind, RegisterResponse,
    RegistrationRequest,
};
use crate::utils::{UtilError, build_p256_certificate, gen_random_bytes};

use super::signer::{Signer, SignerError};

const KEY_HANDLE_LEN: usize = 32;
const ATTESTATION_COMMON_NAME: &str = "u2f-registry software signer";

struct SoftwareCredential {
    key_pair: EcdsaKeyPair,
    counter: u32,
}

pub struct SoftwareSigner {
    rng: SystemRandom,
    credentials: Mutex<HashMap<KeyHandle, SoftwareCredential>>,
    user_presence: bool,
}

impl SoftwareSigner {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
            credentials: Mutex::new(HashMap::new()),
            user_presence: true,
        }
    }

    /// Report user presence (the "touch") in authentication responses or not.
    pub fn with_user_presence(mut self, user_presence: bool) -> Self {
        self.user_presence = user_presence;
        self
    }

    /// Public key of the credential addressed by `key_handle`, if this signer holds it.
    pub async fn public_key(&self, key_handle: &KeyHandle) -> Option<Vec<u8>> {
        self.credentials
            .lock()
            .await
            .get(key_handle)
            .map(|c| c.key_pair.public_key().as_ref().to_vec())
    }

    fn client_data(&self, kind: OperationKind, challenge: &str, origin: &str) -> Vec<u8> {
        serde_json::json!({
            "typ": kind.client_data_type(),
            "challenge": challenge,
            "origin": origin,
        })
        .to_string()
        .into_bytes()
    }

    fn sign(&self, key_pair: &EcdsaKeyPair, message: &[u8]) -> Result<Vec<u8>, SignerError> {
        key_pair
            .sign(&self.rng, message)
            .map(|sig| sig.as_ref().to_vec())
            .map_err(|_| SignerError::Device("Failed to sign".to_string()))
    }
}

impl Default for SoftwareSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareSigner {
    fn self_signed_certificate(
        &self,
        key_pair: &EcdsaKeyPair,
        public_key: &[u8],
    ) -> Result<Vec<u8>, SignerError> {
        build_p256_certificate(ATTESTATION_COMMON_NAME, public_key, |tbs| {
            key_pair
                .sign(&self.rng, tbs)
                .map(|sig| sig.as_ref().to_vec())
                .map_err(|_| UtilError::Crypto("Failed to sign certificate".to_string()))
        })
        .map_err(|e| SignerError::Device(e.to_string()))
    }
}

#[async_trait]
impl Signer for SoftwareSigner {
    async fn register(
        &self,
        request: &RegistrationRequest,
    ) -> Result<RegisterResponse, SignerError> {
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &self.rng)
            .map_err(|_| SignerError::Device("Failed to generate key pair".to_string()))?;
        let key_pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8.as_ref(), &self.rng)
                .map_err(|e| SignerError::Device(format!("Failed to load key pair: {e}")))?;
        let key_handle = gen_random_bytes(&self.rng, KEY_HANDLE_LEN)
            .map_err(|e| SignerError::Device(e.to_string()))?;
        let public_key = key_pair.public_key().as_ref().to_vec();

        let client_data = self.client_data(
            OperationKind::Registration,
            request.challenge.as_str(),
            request.facet_id.as_str(),
        );

        let mut signed = vec![0x00];
        signed.extend_from_slice(&Sha256::digest(request.app_id.as_str().as_bytes()));
        signed.extend_from_slice(&Sha256::digest(&client_data));
        signed.extend_from_slice(&key_handle);
        signed.extend_from_slice(&public_key);
        let signature = self.sign(&key_pair, &signed)?;
        let certificate = self.self_signed_certificate(&key_pair, &public_key)?;

        let mut registration_data = vec![0x05];
        registration_data.extend_from_slice(&public_key);
        registration_data.push(key_handle.len() as u8);
        registration_data.extend_from_slice(&key_handle);
        registration_data.extend(certificate);
        registration_data.extend(signature);

        self.credentials.lock().await.insert(
            KeyHandle::new(key_handle),
            SoftwareCredential {
                key_pair,
                counter: 0,
            },
        );

        Ok(RegisterResponse::new(&registration_data, &client_data))
    }

    async fn authenticate(
        &self,
        request: &AuthenticationRequest,
    ) -> Result<AuthenticateResponse, SignerError> {
        let mut credentials = self.credentials.lock().await;
        let credential = credentials
            .get_mut(&request.key_handle)
            .ok_or_else(|| SignerError::Device("Unknown key handle".to_string()))?;
        credential.counter += 1;

        let client_data = self.client_data(
            OperationKind::Authentication,
            request.challenge.as_str(),
            request.facet_id.as_str(),
        );

        let mut header = vec![self.user_presence as u8];
        header.extend_from_slice(&credential.counter.to_be_bytes());

        let mut signed = Vec::new();
        signed.extend_from_slice(&Sha256::digest(request.app_id.as_str().as_bytes()));
        signed.extend_from_slice(&header);
        signed.extend_from_slice(&Sha256::digest(&client_data));
        let signature = self.sign(&credential.key_pair, &signed)?;

        let mut signature_data = header;
        signature_data.extend(signature);

        Ok(AuthenticateResponse::new(
            &request.key_handle,
            &client_data,
            &signature_data,
        ))
    }
}
