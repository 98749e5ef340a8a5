mod logging;

use u2f_registry::{FacetId, RelyingParty, RelyingPartyConfig, Signer, SoftwareSigner, Username};

use logging::init_tracing;

/// Stands in for the certificate the host application is signed with
const DEMO_SIGNING_CERTIFICATE: &[u8] = b"demo-u2f signing certificate";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing("demo-u2f");

    let facet_id = FacetId::from_signing_certificate(DEMO_SIGNING_CERTIFICATE);
    let rp = RelyingParty::new(RelyingPartyConfig::from_env(facet_id))?;
    let signer = SoftwareSigner::new();
    let username = Username::from("testuser");

    // Registration, step by step, showing what travels to the signer and back
    let request = rp.start_registration(&username).await?;
    tracing::info!("Registration request: {}", serde_json::to_string(&request)?);
    let response = signer.register(&request).await?;
    tracing::info!("Register response: {}", serde_json::to_string(&response)?);
    rp.finish_registration(&username, &response).await?;

    let key_handle = rp.lookup_credential_handle(&username).await?;
    tracing::info!("{} enrolled with key handle {:?}", username, key_handle);

    // Authentication, driven end to end by the relying party
    for _ in 0..2 {
        rp.authenticate_with(&signer, &username).await?;
    }

    // An identity that never registered
    let stranger = Username::from("nobody");
    match rp.start_authentication(&stranger).await {
        Err(e) if e.is_unknown_identity() => {
            tracing::info!("{} cannot authenticate: not enrolled", stranger)
        }
        Err(e) => return Err(e.into()),
        Ok(_) => tracing::warn!("{} unexpectedly has a credential", stranger),
    }

    tracing::info!(
        "{} identity enrolled",
        rp.registry().enrolled_count().await?
    );
    Ok(())
}
