mod api_call;
mod handshake;

pub use api_call::protected_call;
pub use handshake::establish_channel;

use crate::api::responses::{codes, Envelope};
use axum::Json;

/// Catch-all for the verbs the two endpoints do not accept.
pub async fn method_not_allowed() -> Json<Envelope> {
    Json(Envelope::error("method not allowed", codes::METHOD_NOT_ALLOWED))
}
