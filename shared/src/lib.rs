// shared/src/lib.rs

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// No live value for the presented session id (missing, expired or forged).
    #[error("no valid channel")]
    NoValidChannel,
    /// The `session_user` binding header was absent or did not match
    /// `sha256(current_aes_key)`.
    #[error("session binding mismatch")]
    CsrfMismatch,
    /// Handshake rejected the client public key. Deliberately generic: no
    /// cryptographic detail leaves the server.
    #[error("invalid public key")]
    InvalidPublicKey,
    /// Request body exceeded the fixed ceiling before any decryption ran.
    #[error("request body too large")]
    BodyTooLarge,
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),
    /// AES-GCM authentication failure.
    #[error("decryption failure")]
    DecryptionFailure,
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("decompression failure")]
    DecompressionFailure,
    /// Operation name outside the closed dispatch set.
    #[error("operation not permitted")]
    OperationNotPermitted,
    #[error("not found")]
    NotFound,
    #[error("internal: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

pub mod config;
