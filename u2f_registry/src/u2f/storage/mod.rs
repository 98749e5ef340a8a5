mod memory;
mod types;

pub use memory::{InMemoryCredentialStore, InMemoryPendingChallengeStore};
pub use types::{CredentialStore, PendingChallengeStore};
