use crate::u2f::errors::U2fError;
use crate::u2f::types::{Challenge, ClientData, OperationKind};
use crate::utils::base64url_decode;

impl ClientData {
    pub(super) fn from_base64(client_data: &str) -> Result<Self, U2fError> {
        let raw = base64url_decode(client_data)
            .map_err(|e| U2fError::MalformedResponse(format!("clientData: {e}")))?;

        let data: serde_json::Value = serde_json::from_slice(&raw)
            .map_err(|e| U2fError::MalformedResponse(format!("clientData: invalid JSON: {e}")))?;

        let field = |name: &str| {
            data[name]
                .as_str()
                .map(|s| s.to_string())
                .ok_or_else(|| U2fError::MalformedResponse(format!("clientData: missing {name}")))
        };

        Ok(Self {
            typ: field("typ")?,
            challenge: Challenge::new(field("challenge")?),
            origin: field("origin")?,
            raw,
        })
    }

    /// Rejects client data produced for the other ceremony.
    pub(super) fn expect_type(&self, kind: OperationKind) -> Result<(), U2fError> {
        if self.typ != kind.client_data_type() {
            return Err(U2fError::MalformedResponse(format!(
                "clientData: expected typ {}, got {}",
                kind.client_data_type(),
                self.typ
            )));
        }
        Ok(())
    }
}
