use u2f_registry::{
    Challenge, CoordinationError, KeyHandle, OperationKind, SoftwareSigner, U2F_VERSION, U2fError,
};

use crate::common::{
    HandBuiltSigner, TestSetup, TestUsers, authenticate_response, public_key, register_response,
};

/// Register alice by hand, look up the handle, authenticate, then try bob.
#[tokio::test]
async fn test_end_to_end_alice_and_bob() -> Result<(), Box<dyn std::error::Error>> {
    let setup = TestSetup::without_challenge_binding()?;
    let alice = TestUsers::alice();
    let bob = TestUsers::bob();

    // Given a registration response carrying public key 0xAA.. and handle 0x01
    let request = setup.rp.start_registration(&alice).await?;
    assert_eq!(request.version, U2F_VERSION);
    let response = register_response(&public_key(0xAA), &[0x01], &request.challenge);

    // When it is finalized
    setup.rp.finish_registration(&alice, &response).await?;

    // Then alice is enrolled under handle 0x01
    let handle = setup.rp.lookup_credential_handle(&alice).await?;
    assert_eq!(handle, KeyHandle::new(vec![0x01]));
    let credential = setup
        .rp
        .registry()
        .get_credential(&alice)
        .await?
        .expect("alice should be enrolled");
    assert_eq!(credential.public_key, public_key(0xAA));

    // And any well-formed authentication response for alice succeeds
    let response = authenticate_response(&handle, &Challenge::new("whatever-was-signed"));
    setup.rp.finish_authentication(&alice, &response).await?;

    // And bob, never registered, is unknown
    let result = setup.rp.finish_authentication(&bob, &response).await;
    assert!(matches!(
        result,
        Err(CoordinationError::U2fError(U2fError::UnknownIdentity(_)))
    ));
    assert!(setup.rp.start_authentication(&bob).await.unwrap_err().is_unknown_identity());

    Ok(())
}

#[tokio::test]
async fn test_reregistration_overwrites_credential() -> Result<(), Box<dyn std::error::Error>> {
    let setup = TestSetup::new()?;
    let alice = TestUsers::alice();

    setup
        .rp
        .register_with(&HandBuiltSigner::new(0xAA, &[0x01]), &alice)
        .await?;
    setup
        .rp
        .register_with(&HandBuiltSigner::new(0xBB, &[0x02]), &alice)
        .await?;

    let handle = setup.rp.lookup_credential_handle(&alice).await?;
    assert_eq!(handle, KeyHandle::new(vec![0x02]));
    let credential = setup.rp.registry().get_credential(&alice).await?.unwrap();
    assert_eq!(credential.public_key, public_key(0xBB));
    assert_eq!(setup.rp.registry().enrolled_count().await?, 1);

    // The authentication request now names the new handle
    let request = setup.rp.start_authentication(&alice).await?;
    assert_eq!(request.key_handle, KeyHandle::new(vec![0x02]));

    Ok(())
}

#[tokio::test]
async fn test_identities_are_independent() -> Result<(), Box<dyn std::error::Error>> {
    let setup = TestSetup::new()?;
    let alice = TestUsers::alice();
    let bob = TestUsers::bob();

    setup
        .rp
        .register_with(&HandBuiltSigner::new(0xAA, &[0x01]), &alice)
        .await?;
    setup
        .rp
        .register_with(&HandBuiltSigner::new(0xBB, &[0x02]), &bob)
        .await?;

    assert_eq!(
        setup.rp.lookup_credential_handle(&alice).await?,
        KeyHandle::new(vec![0x01])
    );
    assert_eq!(
        setup.rp.lookup_credential_handle(&bob).await?,
        KeyHandle::new(vec![0x02])
    );

    // Pending challenges are tracked per identity
    let alice_request = setup.rp.start_authentication(&alice).await?;
    let bob_request = setup.rp.start_authentication(&bob).await?;
    assert_ne!(alice_request.challenge, bob_request.challenge);

    let bob_response = authenticate_response(&bob_request.key_handle, &bob_request.challenge);
    setup.rp.finish_authentication(&bob, &bob_response).await?;
    let alice_response =
        authenticate_response(&alice_request.key_handle, &alice_request.challenge);
    setup.rp.finish_authentication(&alice, &alice_response).await?;

    Ok(())
}

#[tokio::test]
async fn test_requests_carry_relying_party_identity() -> Result<(), Box<dyn std::error::Error>> {
    let setup = TestSetup::new()?;
    let testuser = TestUsers::testuser();

    let registration = setup.rp.start_registration(&testuser).await?;
    assert_eq!(registration.app_id, setup.rp.config().app_id);
    assert_eq!(registration.facet_id, TestSetup::facet_id());
    assert!(
        registration
            .facet_id
            .as_str()
            .starts_with("android:apk-key-hash:")
    );

    // Wire form uses the U2F member names
    let json = serde_json::to_value(&registration)?;
    assert_eq!(json["appId"], setup.rp.config().app_id.as_str());
    assert_eq!(json["facetId"], TestSetup::facet_id().as_str());
    assert_eq!(json["challenge"], registration.challenge.as_str());
    assert_eq!(json["version"], U2F_VERSION);

    let second = setup.rp.start_registration(&testuser).await?;
    assert_ne!(registration.challenge, second.challenge);

    Ok(())
}

#[tokio::test]
async fn test_software_signer_ceremonies() -> Result<(), Box<dyn std::error::Error>> {
    let setup = TestSetup::new()?;
    let signer = SoftwareSigner::new();
    let testuser = TestUsers::testuser();

    setup.rp.register_with(&signer, &testuser).await?;
    let handle = setup.rp.lookup_credential_handle(&testuser).await?;
    let credential = setup.rp.registry().get_credential(&testuser).await?.unwrap();
    assert_eq!(signer.public_key(&handle).await, Some(credential.public_key));

    for _ in 0..3 {
        setup.rp.authenticate_with(&signer, &testuser).await?;
    }

    Ok(())
}

#[tokio::test]
async fn test_wire_json_round_trip_through_host() -> Result<(), Box<dyn std::error::Error>> {
    let setup = TestSetup::new()?;
    let alice = TestUsers::alice();

    // The host ships the request as JSON and receives the answer as JSON
    let request = setup.rp.start_registration(&alice).await?;
    let response = register_response(&public_key(0xAA), &[0x01, 0x02], &request.challenge);
    let wire = serde_json::to_string(&response)?;
    assert!(wire.contains("\"registrationData\""));
    assert!(wire.contains("\"clientData\""));

    let received = u2f_registry::RegisterResponse::from_json(&wire)?;
    setup.rp.finish_registration(&alice, &received).await?;

    let request = setup.rp.start_authentication(&alice).await?;
    let response = authenticate_response(&request.key_handle, &request.challenge);
    let wire = serde_json::to_string(&response)?;
    assert!(wire.contains("\"keyHandle\""));
    assert!(wire.contains("\"signatureData\""));

    let received = u2f_registry::AuthenticateResponse::from_json(&wire)?;
    setup.rp.finish_authentication(&alice, &received).await?;

    // Registration client data is refused on the authentication path
    let request = setup.rp.start_authentication(&alice).await?;
    let mut response = authenticate_response(&request.key_handle, &request.challenge);
    response.client_data = u2f_registry::base64url_encode(&crate::common::client_data(
        OperationKind::Registration,
        &request.challenge,
    ));
    let result = setup.rp.finish_authentication(&alice, &response).await;
    assert!(result.unwrap_err().is_malformed_response());

    Ok(())
}

#[tokio::test]
async fn test_issuing_requests_leaves_registry_unchanged() -> Result<(), Box<dyn std::error::Error>>
{
    let setup = TestSetup::new()?;
    let alice = TestUsers::alice();
    let bob = TestUsers::bob();
    setup
        .rp
        .register_with(&HandBuiltSigner::new(0xAA, &[0x01]), &alice)
        .await?;
    let before = setup.rp.registry().get_credential(&alice).await?;

    for _ in 0..5 {
        setup.rp.start_registration(&alice).await?;
        setup.rp.start_registration(&bob).await?;
        setup.rp.start_authentication(&alice).await?;
        setup.rp.issuer().issue_registration_request(&bob)?;
    }

    assert_eq!(setup.rp.registry().get_credential(&alice).await?, before);
    assert!(setup.rp.registry().get_credential(&bob).await?.is_none());
    assert_eq!(setup.rp.registry().enrolled_count().await?, 1);
    Ok(())
}
