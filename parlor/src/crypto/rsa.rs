use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use shared::{Error, Result};

/// Client public keys larger than this are rejected before parsing.
pub const MAX_PUBLIC_PEM_BYTES: usize = 4096;

const MIN_MODULUS_BITS: usize = 2048;

/// Server-side RSA-2048 keypair, OAEP with SHA-256 throughout.
pub struct RsaKeyPair {
    private: RsaPrivateKey,
    public_pem: String,
}

impl RsaKeyPair {
    /// Generates a fresh 2048-bit keypair. Slow; done once at startup.
    pub fn generate() -> Result<Self> {
        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, MIN_MODULUS_BITS)
            .map_err(|e| Error::Internal(format!("rsa keygen: {e}")))?;
        let public_pem = private
            .to_public_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| Error::Internal(format!("rsa pem export: {e}")))?;
        Ok(Self {
            private,
            public_pem,
        })
    }

    pub fn public_key_pem(&self) -> &str {
        &self.public_pem
    }

    /// Decrypts a ciphertext produced for our public key.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.private
            .decrypt(Oaep::new::<Sha256>(), ciphertext)
            .map_err(|_| Error::DecryptionFailure)
    }
}

/// Encrypts `plaintext` under a peer-supplied public key PEM.
pub fn encrypt_for(peer_pub_pem: &str, plaintext: &[u8]) -> Result<Vec<u8>> {
    let key = parse_public_pem(peer_pub_pem)?;
    key.encrypt(&mut rand::thread_rng(), Oaep::new::<Sha256>(), plaintext)
        .map_err(|e| Error::Internal(format!("rsa encrypt: {e}")))
}

/// Validates a client public key without keeping it. All rejects collapse to
/// the generic [`Error::InvalidPublicKey`] so nothing cryptographic leaks.
pub fn validate_public_pem(pem: &str) -> Result<()> {
    parse_public_pem(pem).map(|_| ())
}

fn parse_public_pem(pem: &str) -> Result<RsaPublicKey> {
    if pem.len() > MAX_PUBLIC_PEM_BYTES {
        return Err(Error::InvalidPublicKey);
    }
    // A private key PEM would parse as a valid key source for some decoders;
    // refuse it outright.
    if pem.contains("PRIVATE KEY") {
        return Err(Error::InvalidPublicKey);
    }
    let trimmed = pem.trim();
    let key = RsaPublicKey::from_public_key_pem(trimmed)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(trimmed))
        .map_err(|_| Error::InvalidPublicKey)?;
    if key.size() * 8 < MIN_MODULUS_BITS {
        return Err(Error::InvalidPublicKey);
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs8::EncodePrivateKey;

    #[test]
    fn round_trip_with_own_public_key() {
        let pair = RsaKeyPair::generate().unwrap();
        let ciphertext = encrypt_for(pair.public_key_pem(), b"0123456789abcdef").unwrap();
        assert_eq!(pair.decrypt(&ciphertext).unwrap(), b"0123456789abcdef");
    }

    #[test]
    fn rejects_non_pem_input() {
        assert!(matches!(
            validate_public_pem("clearly not a key"),
            Err(Error::InvalidPublicKey)
        ));
    }

    #[test]
    fn rejects_a_private_key_pem() {
        let pair = RsaKeyPair::generate().unwrap();
        let private_pem = pair
            .private
            .to_pkcs8_pem(LineEnding::LF)
            .unwrap()
            .to_string();
        assert!(matches!(
            validate_public_pem(&private_pem),
            Err(Error::InvalidPublicKey)
        ));
    }

    #[test]
    fn rejects_a_weak_modulus() {
        let mut rng = rand::thread_rng();
        let weak = RsaPrivateKey::new(&mut rng, 1024).unwrap();
        let weak_pem = weak
            .to_public_key()
            .to_public_key_pem(LineEnding::LF)
            .unwrap();
        assert!(matches!(
            validate_public_pem(&weak_pem),
            Err(Error::InvalidPublicKey)
        ));
    }

    #[test]
    fn rejects_an_oversized_pem() {
        let huge = "A".repeat(MAX_PUBLIC_PEM_BYTES + 1);
        assert!(matches!(
            validate_public_pem(&huge),
            Err(Error::InvalidPublicKey)
        ));
    }
}
