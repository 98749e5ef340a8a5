use async_trait::async_trait;

use crate::u2f::errors::U2fError;
use crate::u2f::types::{EnrolledCredential, OperationKind, PendingChallenge, Username};

/// Capability interface over the identity → credential mapping.
///
/// Implementations must make `upsert` atomic per identity so that two
/// concurrent registrations cannot interleave.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Get the credential enrolled for `username`, if any.
    async fn get(&self, username: &Username) -> Result<Option<EnrolledCredential>, U2fError>;

    /// Insert or overwrite the credential for `username`.
    async fn upsert(
        &self,
        username: &Username,
        credential: EnrolledCredential,
    ) -> Result<(), U2fError>;

    /// Number of enrolled identities.
    async fn count(&self) -> Result<usize, U2fError>;
}

/// Store for challenges between issue and finalize.
///
/// At most one challenge is pending per (identity, operation kind).
#[async_trait]
pub trait PendingChallengeStore: Send + Sync + 'static {
    /// Record a challenge, replacing any earlier one for the same identity and kind.
    async fn put(&self, pending: PendingChallenge) -> Result<(), U2fError>;

    /// Atomically remove and return the pending challenge.
    /// A challenge can therefore be taken at most once.
    async fn take(
        &self,
        username: &Username,
        kind: OperationKind,
    ) -> Result<Option<PendingChallenge>, U2fError>;
}
