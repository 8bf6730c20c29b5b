use serde::{Deserialize, Serialize};
use shared::{Error, Result};

/// Request-body ceiling, enforced before any decryption attempt.
pub const MAX_BODY_BYTES: usize = 3 * 1024 * 1024;

/// AES-GCM ciphertext as carried on the wire: base64 nonce, ciphertext and
/// authentication tag as three separate fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedContent {
    pub iv: String,
    pub data: String,
    pub tag: String,
}

/// Outer layer of a protected call. `algorithm` stays a free string here:
/// the allow-list check must be able to distinguish an unsupported name from
/// a schema failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiRequest {
    pub message: String,
    pub compression: bool,
    pub algorithm: String,
    pub content: EncryptedContent,
}

/// Inner plaintext of a protected response: the next session key plus the
/// business result, sealed under the previous key.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResponsePayload {
    pub key: String,
    pub data: serde_json::Value,
}

pub fn check_body_size(len: usize) -> Result<()> {
    if len > MAX_BODY_BYTES {
        Err(Error::BodyTooLarge)
    } else {
        Ok(())
    }
}

pub fn parse_request(body: &[u8]) -> Result<ApiRequest> {
    serde_json::from_slice(body).map_err(|e| Error::MalformedEnvelope(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_at_the_ceiling_passes_one_over_fails() {
        assert!(check_body_size(MAX_BODY_BYTES).is_ok());
        assert!(matches!(
            check_body_size(MAX_BODY_BYTES + 1),
            Err(Error::BodyTooLarge)
        ));
    }

    #[test]
    fn schema_violations_are_malformed_envelopes() {
        assert!(matches!(
            parse_request(b"not json"),
            Err(Error::MalformedEnvelope(_))
        ));
        assert!(matches!(
            parse_request(br#"{"message": "m"}"#),
            Err(Error::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn well_formed_request_parses() {
        let raw = br#"{
            "message": "",
            "compression": false,
            "algorithm": "gzip",
            "content": {"iv": "aXY=", "data": "ZGF0YQ==", "tag": "dGFn"}
        }"#;
        let req = parse_request(raw).unwrap();
        assert!(!req.compression);
        assert_eq!(req.algorithm, "gzip");
        assert_eq!(req.content.iv, "aXY=");
    }
}
