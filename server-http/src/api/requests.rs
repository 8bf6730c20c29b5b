use serde::Deserialize;

/// Form body of `POST /rs`.
#[derive(Debug, Deserialize)]
pub struct HandshakeForm {
    pub user_key_pub_pem: String,
}
