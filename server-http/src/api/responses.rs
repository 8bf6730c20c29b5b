use serde::{Deserialize, Serialize};
use shared::Error;

/// Every response, success or failure, is this three-field envelope.
/// `code == 0` is the only success code.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub code: i64,
    pub message: String,
    pub data: serde_json::Value,
}

impl Envelope {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            code: 0,
            message: "OK".to_string(),
            data,
        }
    }

    /// Error envelope: `message` is the fixed marker, `data` carries the
    /// human-readable detail as a plain string.
    pub fn error(detail: impl Into<String>, code: i64) -> Self {
        Self {
            code,
            message: "error".to_string(),
            data: serde_json::Value::String(detail.into()),
        }
    }
}

/// Envelope codes. Only `METHOD_NOT_ALLOWED` is an externally observable
/// contract; the rest are stable but arbitrary per-category values.
pub mod codes {
    pub const METHOD_NOT_ALLOWED: i64 = 100405;
    pub const GENERIC: i64 = -999;
    pub const NO_VALID_CHANNEL: i64 = -1001;
    pub const CSRF_MISMATCH: i64 = -1002;
    pub const BODY_TOO_LARGE: i64 = -1003;
    pub const MALFORMED_ENVELOPE: i64 = -1004;
    pub const DECRYPTION_FAILURE: i64 = -1005;
    pub const UNSUPPORTED_ALGORITHM: i64 = -1006;
    pub const DECOMPRESSION_FAILURE: i64 = -1007;
    pub const OPERATION_NOT_PERMITTED: i64 = -1008;
    pub const INVALID_PUBLIC_KEY: i64 = -1009;
}

/// Maps a domain error to its envelope. Messages stay generic: no internal
/// detail, stack trace or cryptographic material reaches the client.
pub fn envelope_for(err: &Error) -> Envelope {
    match err {
        Error::NoValidChannel => Envelope::error("no valid channel", codes::NO_VALID_CHANNEL),
        Error::CsrfMismatch => Envelope::error("session binding mismatch", codes::CSRF_MISMATCH),
        Error::BodyTooLarge => Envelope::error("request body too large", codes::BODY_TOO_LARGE),
        Error::MalformedEnvelope(_) => {
            Envelope::error("malformed request envelope", codes::MALFORMED_ENVELOPE)
        }
        Error::DecryptionFailure => {
            Envelope::error("decryption failure", codes::DECRYPTION_FAILURE)
        }
        Error::UnsupportedAlgorithm(_) => {
            Envelope::error("unsupported compression algorithm", codes::UNSUPPORTED_ALGORITHM)
        }
        Error::DecompressionFailure => {
            Envelope::error("decompression failure", codes::DECOMPRESSION_FAILURE)
        }
        Error::OperationNotPermitted => {
            Envelope::error("operation not permitted", codes::OPERATION_NOT_PERMITTED)
        }
        Error::InvalidPublicKey => {
            Envelope::error("invalid RSA public key", codes::INVALID_PUBLIC_KEY)
        }
        Error::NotFound | Error::Internal(_) => Envelope::error("server error", codes::GENERIC),
    }
}
