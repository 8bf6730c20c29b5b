//! Domain crate for the encrypted chat backend: cryptographic capabilities,
//! the session-key rotation protocol, the layered payload envelope, and the
//! closed business-operation dispatch over a persistence port.

pub mod compress;
pub mod crypto;
pub mod envelope;
pub mod ops;
pub mod repository;
pub mod session;
