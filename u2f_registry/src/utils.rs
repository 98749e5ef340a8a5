use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use ring::rand::SecureRandom;

pub fn base64url_decode(input: &str) -> Result<Vec<u8>, UtilError> {
    let decoded = URL_SAFE_NO_PAD
        .decode(input)
        .map_err(|_| UtilError::Format("Failed to decode base64url".to_string()))?;
    Ok(decoded)
}

pub fn base64url_encode(input: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

/// Fills a buffer of `len` bytes from the system CSPRNG.
pub(crate) fn gen_random_bytes(
    rng: &ring::rand::SystemRandom,
    len: usize,
) -> Result<Vec<u8>, UtilError> {
    let mut buf = vec![0u8; len];
    rng.fill(&mut buf)
        .map_err(|_| UtilError::Crypto("Failed to generate random bytes".to_string()))?;
    Ok(buf)
}

const OID_ECDSA_WITH_SHA256: &[u8] = &[0x2a, 0x86, 0x48, 0xce, 0x3d, 0x04, 0x03, 0x02];
const OID_EC_PUBLIC_KEY: &[u8] = &[0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01];
const OID_PRIME256V1: &[u8] = &[0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07];
const OID_COMMON_NAME: &[u8] = &[0x55, 0x04, 0x03];

/// DER tag-length-value with minimal length encoding
fn der_tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = content.len();
    if len < 0x80 {
        out.push(len as u8);
    } else {
        let len_bytes = len.to_be_bytes();
        let skip = len_bytes.iter().take_while(|b| **b == 0).count();
        out.push(0x80 | (len_bytes.len() - skip) as u8);
        out.extend_from_slice(&len_bytes[skip..]);
    }
    out.extend_from_slice(content);
    out
}

fn der_sequence(parts: &[Vec<u8>]) -> Vec<u8> {
    der_tlv(0x30, &parts.concat())
}

/// Builds a self-issued X.509 v3 certificate for a P-256 `public_key`
/// (uncompressed point). `sign` receives the DER TBSCertificate and returns the
/// ASN.1 ECDSA signature over it.
pub(crate) fn build_p256_certificate(
    common_name: &str,
    public_key: &[u8],
    sign: impl FnOnce(&[u8]) -> Result<Vec<u8>, UtilError>,
) -> Result<Vec<u8>, UtilError> {
    let signature_algorithm = der_sequence(&[der_tlv(0x06, OID_ECDSA_WITH_SHA256)]);
    let name = der_sequence(&[der_tlv(
        0x31,
        &der_sequence(&[
            der_tlv(0x06, OID_COMMON_NAME),
            der_tlv(0x0c, common_name.as_bytes()),
        ]),
    )]);
    let validity = der_sequence(&[
        der_tlv(0x17, b"240101000000Z"),
        der_tlv(0x17, b"491231235959Z"),
    ]);

    let mut key_bits = vec![0x00];
    key_bits.extend_from_slice(public_key);
    let subject_public_key_info = der_sequence(&[
        der_sequence(&[
            der_tlv(0x06, OID_EC_PUBLIC_KEY),
            der_tlv(0x06, OID_PRIME256V1),
        ]),
        der_tlv(0x03, &key_bits),
    ]);

    let tbs_certificate = der_sequence(&[
        der_tlv(0xa0, &der_tlv(0x02, &[0x02])),
        der_tlv(0x02, &[0x01]),
        signature_algorithm.clone(),
        name.clone(),
        validity,
        name,
        subject_public_key_info,
    ]);

    let mut signature_bits = vec![0x00];
    signature_bits.extend(sign(&tbs_certificate)?);

    Ok(der_sequence(&[
        tbs_certificate,
        signature_algorithm,
        der_tlv(0x03, &signature_bits),
    ]))
}

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum UtilError {
    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Invalid format: {0}")]
    Format(String),
}
