use chrono::Utc;
use ring::rand::SystemRandom;
use subtle::ConstantTimeEq;

use crate::u2f::errors::U2fError;
use crate::u2f::storage::PendingChallengeStore;
use crate::u2f::types::{
    AppId, AuthenticationRequest, Challenge, FacetId, KeyHandle, OperationKind,
    RegistrationRequest, U2F_VERSION, Username,
};
use crate::utils::gen_random_bytes;

/// Raw challenge size: 128 bits of entropy
pub(crate) const CHALLENGE_LEN: usize = 16;

/// Produces fresh challenges and wraps them into request descriptors.
///
/// The issuer holds no mutable state besides the system CSPRNG handle, so it is
/// safe to share across tasks and never touches the registry.
#[derive(Clone)]
pub struct ChallengeIssuer {
    app_id: AppId,
    facet_id: FacetId,
    rng: SystemRandom,
}

impl ChallengeIssuer {
    pub fn new(app_id: AppId, facet_id: FacetId) -> Self {
        Self {
            app_id,
            facet_id,
            rng: SystemRandom::new(),
        }
    }

    pub fn app_id(&self) -> &AppId {
        &self.app_id
    }

    pub fn facet_id(&self) -> &FacetId {
        &self.facet_id
    }

    /// Returns 16 fresh random bytes, unpadded base64url encoded.
    pub fn generate_challenge(&self) -> Result<Challenge, U2fError> {
        let bytes = gen_random_bytes(&self.rng, CHALLENGE_LEN)
            .map_err(|e| U2fError::Crypto(e.to_string()))?;
        Ok(Challenge::from_bytes(&bytes))
    }

    pub fn issue_registration_request(
        &self,
        username: &Username,
    ) -> Result<RegistrationRequest, U2fError> {
        let challenge = self.generate_challenge()?;
        tracing::debug!("Issued registration challenge for {}", username);

        Ok(RegistrationRequest {
            app_id: self.app_id.clone(),
            facet_id: self.facet_id.clone(),
            challenge,
            version: U2F_VERSION.to_string(),
        })
    }

    /// Issues an authentication request addressing `key_handle`.
    ///
    /// The handle comes from [`super::CredentialRegistry::lookup_credential_handle`];
    /// without one the identity has nothing to authenticate with.
    pub fn issue_authentication_request(
        &self,
        username: &Username,
        key_handle: Option<KeyHandle>,
    ) -> Result<AuthenticationRequest, U2fError> {
        let key_handle = key_handle.ok_or_else(|| {
            U2fError::UnknownIdentity(format!("No credential enrolled for {username}"))
        })?;
        let challenge = self.generate_challenge()?;
        tracing::debug!("Issued authentication challenge for {}", username);

        Ok(AuthenticationRequest {
            app_id: self.app_id.clone(),
            facet_id: self.facet_id.clone(),
            challenge,
            key_handle,
            version: U2F_VERSION.to_string(),
        })
    }
}

/// Takes the pending challenge for `username` and checks it against the one
/// the client signed.
///
/// The pending record is removed whatever the outcome, so a challenge can be
/// presented at most once.
pub(super) async fn take_and_validate_challenge(
    store: &dyn PendingChallengeStore,
    username: &Username,
    kind: OperationKind,
    signed: &Challenge,
) -> Result<(), U2fError> {
    let pending = store.take(username, kind).await?.ok_or_else(|| {
        tracing::warn!("No {} challenge pending for {}", kind, username);
        U2fError::ChallengeNotFound(format!("No {kind} challenge pending for {username}"))
    })?;

    let now = Utc::now();
    if pending.is_expired_at(now) {
        tracing::warn!(
            "{} challenge for {} expired at {} (now {})",
            kind,
            username,
            pending.expires_at,
            now
        );
        return Err(U2fError::ChallengeExpired(format!(
            "{kind} challenge for {username} has expired"
        )));
    }

    let matches: bool = pending
        .challenge
        .as_str()
        .as_bytes()
        .ct_eq(signed.as_str().as_bytes())
        .into();
    if !matches {
        tracing::warn!("Signed {} challenge does not match for {}", kind, username);
        return Err(U2fError::ChallengeMismatch(format!(
            "Signed challenge was not issued for {username}"
        )));
    }

    tracing::debug!("Consumed {} challenge for {}", kind, username);
    Ok(())
}
