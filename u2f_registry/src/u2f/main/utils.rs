use x509_parser::{certificate::X509Certificate, prelude::*};

use crate::u2f::errors::U2fError;

/// Splits `bytes` into the leading X.509 attestation certificate and whatever
/// follows it (the registration signature).
pub(super) fn split_attestation_certificate(bytes: &[u8]) -> Result<(&[u8], &[u8]), U2fError> {
    let (remaining, cert) = X509Certificate::from_der(bytes).map_err(|e| {
        U2fError::MalformedResponse(format!("Failed to parse attestation certificate: {e}"))
    })?;
    tracing::debug!("Attestation certificate subject: {}", cert.subject());

    let cert_len = bytes.len() - remaining.len();
    Ok(bytes.split_at(cert_len))
}
