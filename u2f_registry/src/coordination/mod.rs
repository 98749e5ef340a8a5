mod ceremony;
mod errors;
mod signer;
mod software_signer;

pub use ceremony::RelyingParty;
pub use errors::CoordinationError;
pub use signer::{Signer, SignerError};
pub use software_signer::SoftwareSigner;
