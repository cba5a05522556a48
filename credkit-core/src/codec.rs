//! Credential codec boundary.
//!
//! Issuance and verification live outside this crate; the only capability
//! the store layer needs is decoding a compact token into a structured
//! credential. The remote document store routes every token-shaped value it
//! reads through this boundary, so callers never see raw tokens.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::Value;

use crate::error::{StoreError, StoreResult};

/// Decodes token-shaped credential values into structured credentials.
pub trait CredentialCodec: Send + Sync {
    /// Decodes a compact token into a structured credential payload.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Codec`] when the token is malformed.
    fn decode(&self, token: &str) -> StoreResult<Value>;
}

/// Codec for JWT-encoded credentials.
///
/// Splits the compact serialization, base64url-decodes the payload segment,
/// and parses it as JSON. Signatures are not checked here; verification is
/// an external capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct JwtCodec;

impl CredentialCodec for JwtCodec {
    fn decode(&self, token: &str) -> StoreResult<Value> {
        let mut segments = token.split('.');
        let (Some(_header), Some(payload)) = (segments.next(), segments.next()) else {
            return Err(StoreError::Codec(
                "token is not in compact serialization form".to_string(),
            ));
        };
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|err| StoreError::Codec(format!("payload is not base64url: {err}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|err| StoreError::Codec(format!("payload is not JSON: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encode_jwt(payload: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"ES256K","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());
        format!("{header}.{body}.c2lnbmF0dXJl")
    }

    #[test]
    fn decodes_the_payload_segment() {
        let payload = json!({ "type": ["VerifiableCredential"], "issuer": "did:example:1" });
        let decoded = JwtCodec.decode(&encode_jwt(&payload)).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn tolerates_padded_payload_segments() {
        let payload = json!({ "a": 1 });
        let body = URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());
        let token = format!("e30.{body}==.sig");
        assert_eq!(JwtCodec.decode(&token).unwrap(), payload);
    }

    #[test]
    fn rejects_a_token_without_segments() {
        let err = JwtCodec.decode("not-a-token").unwrap_err();
        assert!(matches!(err, StoreError::Codec(_)));
    }

    #[test]
    fn rejects_a_payload_that_is_not_json() {
        let body = URL_SAFE_NO_PAD.encode(b"plain text");
        let err = JwtCodec.decode(&format!("e30.{body}.sig")).unwrap_err();
        assert!(matches!(err, StoreError::Codec(_)));
    }
}
