//! Relying party configuration
//!
//! Values are read from the environment once, when the host builds its
//! [`crate::RelyingParty`]. Invalid values fall back to their defaults with a warning.

use std::env;
use std::time::Duration;

use crate::u2f::{AppId, FacetId, U2fError};

/// AppID used when `U2F_APP_ID` is not set. See https://developers.yubico.com/U2F/App_ID.html
pub const DEFAULT_APP_ID: &str = "https://fido-login.example.com/app-id.json";

const DEFAULT_CHALLENGE_TIMEOUT_SECS: u64 = 180;
const DEFAULT_SIGNER_TIMEOUT_SECS: u64 = 120;

/// Settings shared by every ceremony of one relying party instance.
#[derive(Debug, Clone)]
pub struct RelyingPartyConfig {
    /// Identifies the relying party as a whole
    pub app_id: AppId,
    /// Identifies this host application; immutable for the process lifetime
    pub facet_id: FacetId,
    /// How long an issued challenge may wait for its finalize call.
    /// Never shorter than `signer_timeout`.
    pub challenge_timeout: Duration,
    /// Upper bound on a single signer call, including user interaction
    pub signer_timeout: Duration,
    /// Reject responses whose signed challenge was not issued by us
    pub enforce_challenge: bool,
}

impl RelyingPartyConfig {
    /// Configuration with all defaults and the given facet id.
    pub fn new(facet_id: FacetId) -> Self {
        Self {
            app_id: AppId::new(DEFAULT_APP_ID),
            facet_id,
            challenge_timeout: Duration::from_secs(DEFAULT_CHALLENGE_TIMEOUT_SECS),
            signer_timeout: Duration::from_secs(DEFAULT_SIGNER_TIMEOUT_SECS),
            enforce_challenge: true,
        }
    }

    /// Reads `U2F_APP_ID`, `U2F_CHALLENGE_TIMEOUT`, `U2F_SIGNER_TIMEOUT` and
    /// `U2F_ENFORCE_CHALLENGE`.
    ///
    /// The facet id is not configurable: it comes from the host's own signing identity.
    pub fn from_env(facet_id: FacetId) -> Self {
        let app_id = env::var("U2F_APP_ID")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_APP_ID.to_string());

        let mut config = Self {
            app_id: AppId::new(app_id),
            facet_id,
            challenge_timeout: Duration::from_secs(parse_secs(
                "U2F_CHALLENGE_TIMEOUT",
                env::var("U2F_CHALLENGE_TIMEOUT").ok(),
                DEFAULT_CHALLENGE_TIMEOUT_SECS,
            )),
            signer_timeout: Duration::from_secs(parse_secs(
                "U2F_SIGNER_TIMEOUT",
                env::var("U2F_SIGNER_TIMEOUT").ok(),
                DEFAULT_SIGNER_TIMEOUT_SECS,
            )),
            enforce_challenge: parse_bool(
                "U2F_ENFORCE_CHALLENGE",
                env::var("U2F_ENFORCE_CHALLENGE").ok(),
                true,
            ),
        };

        if config.challenge_timeout < config.signer_timeout {
            tracing::warn!(
                "U2F_CHALLENGE_TIMEOUT ({:?}) is shorter than U2F_SIGNER_TIMEOUT ({:?}). Raising it to match",
                config.challenge_timeout,
                config.signer_timeout
            );
            config.challenge_timeout = config.signer_timeout;
        }

        tracing::debug!("Relying party config: {:?}", config);
        config
    }

    /// Rejects a challenge lifetime shorter than the signer timeout: a signer
    /// answering in time would otherwise hand back an already expired challenge.
    pub fn validate(&self) -> Result<(), U2fError> {
        if self.challenge_timeout < self.signer_timeout {
            return Err(U2fError::Config(format!(
                "challenge timeout {:?} is shorter than signer timeout {:?}",
                self.challenge_timeout, self.signer_timeout
            )));
        }
        Ok(())
    }
}

fn parse_secs(name: &str, value: Option<String>, default: u64) -> u64 {
    match value {
        None => default,
        Some(v) => match v.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => secs,
            _ => {
                tracing::warn!("Invalid {}: {}. Using default '{}'", name, v, default);
                default
            }
        },
    }
}

fn parse_bool(name: &str, value: Option<String>, default: bool) -> bool {
    match value {
        None => default,
        Some(v) => match v.trim().to_lowercase().as_str() {
            "true" => true,
            "false" => false,
            invalid => {
                tracing::warn!("Invalid {}: {}. Using default '{}'", name, invalid, default);
                default
            }
        },
    }
}
