use aes_gcm::aead::{Aead, OsRng};
use aes_gcm::{AeadCore, Aes128Gcm, KeyInit, Nonce};
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use shared::{Error, Result};

use crate::envelope::EncryptedContent;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Seals `plaintext` under the 16-byte session key, producing the wire shape
/// `{iv, data, tag}` with each field base64-encoded and the tag carried
/// separately from the ciphertext.
pub fn encrypt(plaintext: &[u8], key: &str) -> Result<EncryptedContent> {
    let cipher = cipher_for(key)?;
    let nonce = Aes128Gcm::generate_nonce(&mut OsRng);
    let sealed = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| Error::Internal("aes-gcm encrypt failed".to_string()))?;
    let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_LEN);
    Ok(EncryptedContent {
        iv: B64.encode(nonce),
        data: B64.encode(ciphertext),
        tag: B64.encode(tag),
    })
}

/// Opens an `{iv, data, tag}` envelope. Undecodable fields are a malformed
/// envelope; a failed tag check is a decryption failure. The two are never
/// collapsed.
pub fn decrypt(content: &EncryptedContent, key: &str) -> Result<Vec<u8>> {
    let cipher = cipher_for(key)?;
    let iv = decode_field(&content.iv, "iv")?;
    let data = decode_field(&content.data, "data")?;
    let tag = decode_field(&content.tag, "tag")?;
    if iv.len() != NONCE_LEN {
        return Err(Error::MalformedEnvelope(format!(
            "iv must be {NONCE_LEN} bytes"
        )));
    }
    if tag.len() != TAG_LEN {
        return Err(Error::MalformedEnvelope(format!(
            "tag must be {TAG_LEN} bytes"
        )));
    }
    let mut sealed = data;
    sealed.extend_from_slice(&tag);
    cipher
        .decrypt(Nonce::from_slice(&iv), sealed.as_ref())
        .map_err(|_| Error::DecryptionFailure)
}

fn decode_field(value: &str, name: &str) -> Result<Vec<u8>> {
    B64.decode(value)
        .map_err(|_| Error::MalformedEnvelope(format!("{name} is not valid base64")))
}

fn cipher_for(key: &str) -> Result<Aes128Gcm> {
    Aes128Gcm::new_from_slice(key.as_bytes())
        .map_err(|_| Error::Internal("session key must be 16 bytes".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0e9eee0055c319f2";

    #[test]
    fn round_trip() {
        let sealed = encrypt(b"{\"operate\":\"ping\"}", KEY).unwrap();
        assert_eq!(decrypt(&sealed, KEY).unwrap(), b"{\"operate\":\"ping\"}");
    }

    #[test]
    fn tampered_tag_is_a_decryption_failure() {
        let mut sealed = encrypt(b"payload", KEY).unwrap();
        let mut tag = B64.decode(&sealed.tag).unwrap();
        tag[0] ^= 0xff;
        sealed.tag = B64.encode(tag);
        assert!(matches!(decrypt(&sealed, KEY), Err(Error::DecryptionFailure)));
    }

    #[test]
    fn wrong_key_is_a_decryption_failure() {
        let sealed = encrypt(b"payload", KEY).unwrap();
        assert!(matches!(
            decrypt(&sealed, "ffffffffffffffff"),
            Err(Error::DecryptionFailure)
        ));
    }

    #[test]
    fn garbage_base64_is_a_malformed_envelope() {
        let sealed = EncryptedContent {
            iv: "!!not base64!!".to_string(),
            data: String::new(),
            tag: String::new(),
        };
        assert!(matches!(
            decrypt(&sealed, KEY),
            Err(Error::MalformedEnvelope(_))
        ));
    }
}
