use std::sync::Arc;
use std::time::Duration;

use kv_engine::{Store, Ttl, Value};
use shared::{Error, Result};
use tracing::debug;
use uuid::Uuid;

use crate::compress::{self, Algorithm};
use crate::crypto::{aes, hash, rsa};
use crate::envelope::{ApiRequest, EncryptedContent, ResponsePayload};

/// Default lifetime of one session-chain link.
pub const SESSION_TTL: Duration = Duration::from_secs(120);

/// Name of the request header binding a protected call to possession of the
/// current AES key.
pub const BINDING_HEADER: &str = "session_user";

/// Result of a successful handshake: the cookie value and the AES key
/// encrypted for the client's RSA public key.
#[derive(Debug)]
pub struct Handshake {
    pub session_id: String,
    pub encrypted_key_hex: String,
}

/// One completed rotation step. The response is sealed under `previous_key`;
/// `next_key`/`next_session_id` only take effect on the client's next call.
#[derive(Debug)]
pub struct Rotation {
    pub previous_key: String,
    pub next_key: String,
    pub next_session_id: String,
}

/// Session-key lifecycle over the expiring store. Each session is a chain of
/// links: exactly one `session_id -> aes_key` entry is live per chain at any
/// instant, and every protected call replaces that link.
pub struct SessionService {
    store: Arc<Store>,
    ttl: Duration,
}

impl SessionService {
    pub fn new(store: Arc<Store>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// `Unbound -> Established`. Validates the client key, derives the first
    /// chain link and returns the AES key encrypted for the client.
    pub async fn establish(&self, client_pub_pem: &str) -> Result<Handshake> {
        rsa::validate_public_pem(client_pub_pem)?;
        let (aes_key, session_id) = derive_link(client_pub_pem);
        let ciphertext = rsa::encrypt_for(client_pub_pem, aes_key.as_bytes())?;
        self.store
            .put(session_id.clone(), aes_key, Ttl::After(self.ttl))
            .await;
        debug!(session = %session_id, "channel established");
        Ok(Handshake {
            session_id,
            encrypted_key_hex: hex::encode(ciphertext),
        })
    }

    /// Live AES key for a presented session id. Expired and forged ids are
    /// indistinguishable: both are `NoValidChannel`.
    pub async fn current_key(&self, session_id: &str) -> Result<String> {
        match self.store.get(session_id).await {
            Some(Value::Str(key)) => Ok(key),
            _ => Err(Error::NoValidChannel),
        }
    }

    /// Checks the `session_user` binding header against
    /// `sha256(current_aes_key)`.
    pub fn verify_binding(&self, aes_key: &str, header: Option<&str>) -> Result<()> {
        let expected = hash::sha256_hex(aes_key);
        match header {
            Some(presented) if presented == expected => Ok(()),
            _ => Err(Error::CsrfMismatch),
        }
    }

    /// `Established -> Established'`. Destructive: the old link is deleted
    /// before the successor is inserted, so at no instant are two links of
    /// the same chain live.
    pub async fn advance(&self, session_id: &str, current_key: &str) -> Result<Rotation> {
        let (next_key, next_session_id) = derive_link(current_key);
        self.store.delete(session_id).await;
        self.store
            .put(next_session_id.clone(), next_key.clone(), Ttl::After(self.ttl))
            .await;
        debug!(from = %session_id, to = %next_session_id, "session rotated");
        Ok(Rotation {
            previous_key: current_key.to_string(),
            next_key,
            next_session_id,
        })
    }

    /// Lookup, binding check and rotation in protocol order.
    pub async fn rotate(&self, session_id: &str, binding: Option<&str>) -> Result<Rotation> {
        let current = self.current_key(session_id).await?;
        self.verify_binding(&current, binding)?;
        self.advance(session_id, &current).await
    }

    /// Opens the layered request payload: allow-list the codec first, then
    /// AES-GCM decrypt, then decompress, then parse the inner JSON.
    pub fn open_envelope(&self, request: &ApiRequest, key: &str) -> Result<serde_json::Value> {
        let algorithm = if request.compression {
            Some(Algorithm::from_name(&request.algorithm)?)
        } else {
            None
        };
        let mut plaintext = aes::decrypt(&request.content, key)?;
        if let Some(algorithm) = algorithm {
            plaintext = compress::decompress(algorithm, &plaintext)?;
        }
        serde_json::from_slice(&plaintext)
            .map_err(|e| Error::MalformedEnvelope(format!("inner payload: {e}")))
    }

    /// Seals the business result together with the next key, under the OLD
    /// key — the only key the client holds at response time.
    pub fn seal_response(
        &self,
        business: serde_json::Value,
        rotation: &Rotation,
    ) -> Result<EncryptedContent> {
        let payload = ResponsePayload {
            key: rotation.next_key.clone(),
            data: business,
        };
        let bytes = serde_json::to_vec(&payload)
            .map_err(|e| Error::Internal(format!("response payload: {e}")))?;
        aes::encrypt(&bytes, &rotation.previous_key)
    }
}

/// Derives one chain link from a seed (the client PEM at handshake, the
/// current key afterwards): `digest = sha256_hex(seed || uuid4_hex)`, key is
/// the first 16 hex chars, session id the remaining 48.
fn derive_link(seed: &str) -> (String, String) {
    let nonce = Uuid::new_v4().simple().to_string();
    let digest = hash::sha256_hex(&format!("{seed}{nonce}"));
    (digest[..16].to_string(), digest[16..].to_string())
}
