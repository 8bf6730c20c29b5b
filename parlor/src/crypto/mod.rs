//! Cryptographic capabilities consumed by the session protocol: SHA-2
//! digests, RSA-OAEP key transport, and the AES-GCM payload cipher.

pub mod aes;
pub mod hash;
pub mod rsa;
