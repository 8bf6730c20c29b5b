use axum::{
    extract::{rejection::FormRejection, Form, State},
    http::header,
    response::{IntoResponse, Json, Response},
};
use tracing::info;

use crate::api::requests::HandshakeForm;
use crate::api::responses::{codes, envelope_for, Envelope};
use crate::cookies;
use crate::state::AppState;

/// POST /rs
///
/// Channel handshake: takes the client's RSA public key, answers with a
/// fresh AES session key encrypted for that public key (hex), and binds the
/// session id to the browser via cookie.
pub async fn establish_channel(
    State(state): State<AppState>,
    form: Result<Form<HandshakeForm>, FormRejection>,
) -> Response {
    let Ok(Form(form)) = form else {
        return Json(Envelope::error("missing user_key_pub_pem", codes::GENERIC)).into_response();
    };

    match state.sessions.establish(&form.user_key_pub_pem).await {
        Ok(handshake) => {
            info!(session = %handshake.session_id, "channel established");
            let cookie =
                cookies::session_set_cookie(&handshake.session_id, state.config.session_ttl_secs);
            (
                [(header::SET_COOKIE, cookie)],
                Json(Envelope::ok(serde_json::Value::String(
                    handshake.encrypted_key_hex,
                ))),
            )
                .into_response()
        }
        Err(err) => Json(envelope_for(&err)).into_response(),
    }
}
