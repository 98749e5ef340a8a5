mod errors;
mod main;
mod storage;
mod types;

pub use errors::U2fError;

pub use main::{ChallengeIssuer, CredentialRegistry, NoSignatureCheck, ResponseVerifier};

pub use storage::{
    CredentialStore, InMemoryCredentialStore, InMemoryPendingChallengeStore,
    PendingChallengeStore,
};

pub use types::{
    AppId, AuthenticateResponse, AuthenticationRequest, Challenge, ClientData, EnrolledCredential,
    FacetId, KeyHandle, OperationKind, ParsedAuthenticateResponse, ParsedRegisterResponse,
    PendingChallenge, RegisterResponse, RegistrationRequest, U2F_VERSION, Username,
};

#[cfg(test)]
pub(crate) use main::test_utils;
