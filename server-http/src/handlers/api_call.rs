use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Json, Response},
};
use bytes::Bytes;
use tracing::debug;

use parlor::envelope::{self, ApiRequest};
use parlor::ops;
use parlor::session::{Rotation, BINDING_HEADER};
use shared::Error;

use crate::api::responses::{codes, envelope_for, Envelope};
use crate::cookies;
use crate::state::AppState;

/// POST /api
///
/// Protected call. Check order is part of the protocol: content-type,
/// session lookup, body-size ceiling, envelope parse, binding header, then
/// rotation. Rotation always runs to completion before the payload is
/// decrypted, so a failed business call still consumes one chain link.
pub async fn protected_call(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let json_content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if !json_content_type {
        return Json(Envelope::error("incorrect Content-Type", codes::GENERIC)).into_response();
    }

    let Some(session_id) = cookies::session_cookie_value(&headers) else {
        return Json(envelope_for(&Error::NoValidChannel)).into_response();
    };
    let aes_key = match state.sessions.current_key(&session_id).await {
        Ok(key) => key,
        Err(err) => return Json(envelope_for(&err)).into_response(),
    };

    // Size ceiling before any decryption attempt.
    if let Err(err) = envelope::check_body_size(body.len()) {
        return Json(envelope_for(&err)).into_response();
    }
    let request = match envelope::parse_request(&body) {
        Ok(request) => request,
        Err(err) => return Json(envelope_for(&err)).into_response(),
    };

    let binding = headers
        .get(BINDING_HEADER)
        .and_then(|v| v.to_str().ok());
    if let Err(err) = state.sessions.verify_binding(&aes_key, binding) {
        return Json(envelope_for(&err)).into_response();
    }

    let rotation = match state.sessions.advance(&session_id, &aes_key).await {
        Ok(rotation) => rotation,
        Err(err) => return Json(envelope_for(&err)).into_response(),
    };
    debug!(from = %session_id, "session rotated for protected call");

    // From here on the new cookie accompanies every outcome, error included:
    // the old link is already gone.
    let cookie =
        cookies::session_set_cookie(&rotation.next_session_id, state.config.session_ttl_secs);
    let envelope = run_business(&state, &request, &rotation)
        .await
        .unwrap_or_else(|err| envelope_for(&err));
    ([(header::SET_COOKIE, cookie)], Json(envelope)).into_response()
}

async fn run_business(
    state: &AppState,
    request: &ApiRequest,
    rotation: &Rotation,
) -> shared::Result<Envelope> {
    let inner = state.sessions.open_envelope(request, &rotation.previous_key)?;
    let operation = ops::parse(inner)?;
    let result = ops::dispatch(state.repository.as_ref(), operation).await?;
    let sealed = state.sessions.seal_response(result, rotation)?;
    let data = serde_json::to_value(sealed).map_err(|e| Error::Internal(e.to_string()))?;
    Ok(Envelope::ok(data))
}
