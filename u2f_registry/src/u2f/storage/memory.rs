use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::u2f::errors::U2fError;
use crate::u2f::types::{EnrolledCredential, OperationKind, PendingChallenge, Username};

use super::types::{CredentialStore, PendingChallengeStore};

/// In-process credential store. Contents are lost when the process exits.
pub struct InMemoryCredentialStore {
    entry: Mutex<HashMap<Username, EnrolledCredential>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        tracing::info!("Creating new in-memory credential store");
        Self {
            entry: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get(&self, username: &Username) -> Result<Option<EnrolledCredential>, U2fError> {
        Ok(self.entry.lock().await.get(username).cloned())
    }

    async fn upsert(
        &self,
        username: &Username,
        credential: EnrolledCredential,
    ) -> Result<(), U2fError> {
        let previous = self
            .entry
            .lock()
            .await
            .insert(username.clone(), credential);
        if previous.is_some() {
            tracing::debug!("Overwrote existing credential for {}", username);
        }
        Ok(())
    }

    async fn count(&self) -> Result<usize, U2fError> {
        Ok(self.entry.lock().await.len())
    }
}

/// In-process store for challenges awaiting their finalize call.
///
/// Expired entries are dropped whenever a new challenge is stored, so
/// abandoned ceremonies do not accumulate.
pub struct InMemoryPendingChallengeStore {
    entry: Mutex<HashMap<(OperationKind, Username), PendingChallenge>>,
}

impl InMemoryPendingChallengeStore {
    pub fn new() -> Self {
        tracing::info!("Creating new in-memory pending challenge store");
        Self {
            entry: Mutex::new(HashMap::new()),
        }
    }

    /// Number of challenges currently held, expired or not.
    pub async fn len(&self) -> usize {
        self.entry.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryPendingChallengeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PendingChallengeStore for InMemoryPendingChallengeStore {
    async fn put(&self, pending: PendingChallenge) -> Result<(), U2fError> {
        let key = (pending.kind, pending.username.clone());
        let now = Utc::now();
        let mut entry = self.entry.lock().await;

        let before = entry.len();
        entry.retain(|_, stored| !stored.is_expired_at(now));
        let purged = before - entry.len();
        if purged > 0 {
            tracing::debug!("Purged {} expired pending challenges", purged);
        }

        entry.insert(key, pending);
        Ok(())
    }

    async fn take(
        &self,
        username: &Username,
        kind: OperationKind,
    ) -> Result<Option<PendingChallenge>, U2fError> {
        Ok(self.entry.lock().await.remove(&(kind, username.clone())))
    }
}
