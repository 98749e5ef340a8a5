//! u2f_registry - Server-side half of FIDO U2F style registration and authentication
//!
//! This crate issues challenge-bearing requests for an external signer (a
//! hardware security key or a stand-in) and keeps the registry of enrolled
//! credentials, one per identity.

mod config;
mod coordination;
mod u2f;
mod utils;

pub use config::{DEFAULT_APP_ID, RelyingPartyConfig};

// Re-export the ceremony coordination components
pub use coordination::{CoordinationError, RelyingParty, Signer, SignerError, SoftwareSigner};

pub use u2f::{
    AppId, AuthenticateResponse, AuthenticationRequest, Challenge, ChallengeIssuer, ClientData,
    CredentialRegistry, CredentialStore, EnrolledCredential, FacetId, InMemoryCredentialStore,
    InMemoryPendingChallengeStore, KeyHandle, NoSignatureCheck, OperationKind,
    ParsedAuthenticateResponse, ParsedRegisterResponse, PendingChallenge, PendingChallengeStore,
    RegisterResponse, RegistrationRequest, ResponseVerifier, U2F_VERSION, U2fError, Username,
};

pub use utils::{UtilError, base64url_decode, base64url_encode};
