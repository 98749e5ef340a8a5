use chrono::Utc;
use std::sync::Arc;

use crate::config::RelyingPartyConfig;
use crate::u2f::errors::U2fError;
use crate::u2f::storage::{
    CredentialStore, InMemoryCredentialStore, InMemoryPendingChallengeStore,
    PendingChallengeStore,
};
use crate::u2f::types::{
    AppId, Challenge, EnrolledCredential, KeyHandle, OperationKind, PendingChallenge, Username,
};

use super::verifier::{NoSignatureCheck, ResponseVerifier};

/// Owns the identity → credential mapping and finalizes both ceremonies.
///
/// Each identity is either unenrolled (no entry) or enrolled with exactly one
/// credential. A successful registration moves it to enrolled, overwriting any
/// previous credential; authentication never changes it.
pub struct CredentialRegistry {
    pub(super) app_id: AppId,
    pub(super) credentials: Arc<dyn CredentialStore>,
    pub(super) pending: Arc<dyn PendingChallengeStore>,
    pub(super) verifier: Arc<dyn ResponseVerifier>,
    pub(super) challenge_timeout: chrono::Duration,
    pub(super) enforce_challenge: bool,
}

impl CredentialRegistry {
    /// Registry backed by in-memory stores, without signature checks.
    pub fn new(config: &RelyingPartyConfig) -> Result<Self, U2fError> {
        Self::with_stores(
            config,
            Arc::new(InMemoryCredentialStore::new()),
            Arc::new(InMemoryPendingChallengeStore::new()),
            Arc::new(NoSignatureCheck),
        )
    }

    pub fn with_stores(
        config: &RelyingPartyConfig,
        credentials: Arc<dyn CredentialStore>,
        pending: Arc<dyn PendingChallengeStore>,
        verifier: Arc<dyn ResponseVerifier>,
    ) -> Result<Self, U2fError> {
        let challenge_timeout = chrono::Duration::from_std(config.challenge_timeout)
            .map_err(|e| U2fError::Config(format!("challenge timeout out of range: {e}")))?;

        if !config.enforce_challenge {
            tracing::warn!("Challenge binding is disabled; signed challenges are not checked");
        }

        Ok(Self {
            app_id: config.app_id.clone(),
            credentials,
            pending,
            verifier,
            challenge_timeout,
            enforce_challenge: config.enforce_challenge,
        })
    }

    pub async fn lookup_credential_handle(&self, username: &Username) -> Result<KeyHandle, U2fError> {
        self.credentials
            .get(username)
            .await?
            .map(|credential| credential.key_handle)
            .ok_or_else(|| {
                U2fError::UnknownIdentity(format!("No credential enrolled for {username}"))
            })
    }

    pub async fn get_credential(
        &self,
        username: &Username,
    ) -> Result<Option<EnrolledCredential>, U2fError> {
        self.credentials.get(username).await
    }

    pub async fn enrolled_count(&self) -> Result<usize, U2fError> {
        self.credentials.count().await
    }

    /// Remembers `challenge` as the one the next finalize call for
    /// (`username`, `kind`) must present.
    pub async fn record_pending_challenge(
        &self,
        username: &Username,
        kind: OperationKind,
        challenge: &Challenge,
    ) -> Result<PendingChallenge, U2fError> {
        let issued_at = Utc::now();
        let pending = PendingChallenge {
            username: username.clone(),
            kind,
            challenge: challenge.clone(),
            issued_at,
            expires_at: issued_at + self.challenge_timeout,
        };
        self.pending.put(pending.clone()).await?;
        tracing::debug!(
            "Recorded pending {} challenge for {}, expires at {}",
            kind,
            username,
            pending.expires_at
        );
        Ok(pending)
    }

    /// Drops the pending challenge of an abandoned ceremony.
    pub async fn discard_pending_challenge(
        &self,
        username: &Username,
        kind: OperationKind,
    ) -> Result<(), U2fError> {
        if self.pending.take(username, kind).await?.is_some() {
            tracing::debug!("Discarded pending {} challenge for {}", kind, username);
        }
        Ok(())
    }
}
