use std::future::Future;
use std::time::Duration;

use crate::config::RelyingPartyConfig;
use crate::u2f::{
    AuthenticateResponse, AuthenticationRequest, ChallengeIssuer, CredentialRegistry, KeyHandle,
    OperationKind, RegisterResponse, RegistrationRequest, Username,
};

use super::errors::CoordinationError;
use super::signer::{Signer, SignerError};

/// The relying party: constructed once at startup and passed to whatever
/// handles ceremonies.
///
/// Composes the stateless [`ChallengeIssuer`] with the [`CredentialRegistry`]
/// and records every issued challenge so the matching finalize call can
/// consume it.
pub struct RelyingParty {
    config: RelyingPartyConfig,
    issuer: ChallengeIssuer,
    registry: CredentialRegistry,
}

impl RelyingParty {
    /// Relying party with in-memory stores.
    pub fn new(config: RelyingPartyConfig) -> Result<Self, CoordinationError> {
        let registry = CredentialRegistry::new(&config)?;
        Self::with_registry(config, registry)
    }

    pub fn with_registry(
        config: RelyingPartyConfig,
        registry: CredentialRegistry,
    ) -> Result<Self, CoordinationError> {
        config.validate()?;
        let issuer = ChallengeIssuer::new(config.app_id.clone(), config.facet_id.clone());
        tracing::info!(
            "Relying party ready (app id: {}, facet id: {})",
            config.app_id.as_str(),
            config.facet_id.as_str()
        );
        Ok(Self {
            config,
            issuer,
            registry,
        })
    }

    pub fn config(&self) -> &RelyingPartyConfig {
        &self.config
    }

    pub fn issuer(&self) -> &ChallengeIssuer {
        &self.issuer
    }

    pub fn registry(&self) -> &CredentialRegistry {
        &self.registry
    }

    pub async fn start_registration(
        &self,
        username: &Username,
    ) -> Result<RegistrationRequest, CoordinationError> {
        let request = self.issuer.issue_registration_request(username)?;
        self.registry
            .record_pending_challenge(username, OperationKind::Registration, &request.challenge)
            .await?;
        Ok(request)
    }

    pub async fn finish_registration(
        &self,
        username: &Username,
        response: &RegisterResponse,
    ) -> Result<(), CoordinationError> {
        self.registry
            .finalize_registration(username, response)
            .await?;
        Ok(())
    }

    /// Fails with `UnknownIdentity` when `username` has nothing enrolled.
    pub async fn start_authentication(
        &self,
        username: &Username,
    ) -> Result<AuthenticationRequest, CoordinationError> {
        let key_handle = self.registry.lookup_credential_handle(username).await?;
        let request = self
            .issuer
            .issue_authentication_request(username, Some(key_handle))?;
        self.registry
            .record_pending_challenge(
                username,
                OperationKind::Authentication,
                &request.challenge,
            )
            .await?;
        Ok(request)
    }

    pub async fn finish_authentication(
        &self,
        username: &Username,
        response: &AuthenticateResponse,
    ) -> Result<(), CoordinationError> {
        self.registry
            .finalize_authentication(username, response)
            .await?;
        Ok(())
    }

    pub async fn lookup_credential_handle(
        &self,
        username: &Username,
    ) -> Result<KeyHandle, CoordinationError> {
        Ok(self.registry.lookup_credential_handle(username).await?)
    }

    /// Runs a complete registration ceremony against `signer`.
    pub async fn register_with<S>(
        &self,
        signer: &S,
        username: &Username,
    ) -> Result<(), CoordinationError>
    where
        S: Signer + ?Sized,
    {
        let request = self.start_registration(username).await?;
        let response = self
            .call_signer(username, OperationKind::Registration, signer.register(&request))
            .await?;
        self.finish_registration(username, &response).await
    }

    /// Runs a complete authentication ceremony against `signer`.
    pub async fn authenticate_with<S>(
        &self,
        signer: &S,
        username: &Username,
    ) -> Result<(), CoordinationError>
    where
        S: Signer + ?Sized,
    {
        let request = self.start_authentication(username).await?;
        let response = self
            .call_signer(
                username,
                OperationKind::Authentication,
                signer.authenticate(&request),
            )
            .await?;
        self.finish_authentication(username, &response).await
    }

    /// Awaits the signer within `signer_timeout`. On failure the pending
    /// challenge is dropped and the registry is left untouched.
    async fn call_signer<T, F>(
        &self,
        username: &Username,
        kind: OperationKind,
        call: F,
    ) -> Result<T, CoordinationError>
    where
        F: Future<Output = Result<T, SignerError>>,
    {
        let timeout: Duration = self.config.signer_timeout;
        let failure = match tokio::time::timeout(timeout, call).await {
            Ok(Ok(response)) => return Ok(response),
            Ok(Err(e)) => CoordinationError::SignerFailure(e.to_string()),
            Err(_) => CoordinationError::SignerFailure(format!(
                "No {kind} response within {timeout:?}"
            )),
        };

        self.registry
            .discard_pending_challenge(username, kind)
            .await?;
        Err(failure.log())
    }
}
