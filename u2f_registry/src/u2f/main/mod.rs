mod auth;
mod challenge;
mod client_data;
mod register;
mod registry;
#[cfg(test)]
pub(crate) mod test_utils;
mod utils;
mod verifier;

pub use challenge::ChallengeIssuer;
pub use registry::CredentialRegistry;
pub use verifier::{NoSignatureCheck, ResponseVerifier};
