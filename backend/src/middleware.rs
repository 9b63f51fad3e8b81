use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    auth::AuthUser,
    gate::{Decision, GateState, session_token},
};

pub const USER_ID_HEADER: HeaderName = HeaderName::from_static("x-user-id");
pub const USER_EMAIL_HEADER: HeaderName = HeaderName::from_static("x-user-email");
pub const USER_ROLE_HEADER: HeaderName = HeaderName::from_static("x-user-role");

/// access_gate
///
/// Runs the access gate in front of every route, the upstream fallback included.
///
/// Downstream handlers and the upstream application trust the `x-user-*`
/// headers without re-verifying, so any client-supplied copies are dropped
/// before the decision is applied.
pub async fn access_gate(
    State(gate): State<GateState>,
    mut request: Request,
    next: Next,
) -> Response {
    strip_identity_headers(request.headers_mut());

    let path = request.uri().path().to_owned();
    let token = session_token(request.headers());

    match gate.decide(&path, token.as_deref()).await {
        Decision::Pass { identity } => {
            if let Some(user) = identity {
                tracing::debug!(path = %path, role = %user.role, "gate: pass (authenticated)");
                attach_identity(&mut request, user);
            }
            next.run(request).await
        }
        Decision::Redirect(location) => {
            tracing::info!(path = %path, location = %location, "gate: redirect");
            Redirect::temporary(&location).into_response()
        }
        Decision::Reject(err) => {
            tracing::info!(path = %path, status = %err.status(), "gate: reject");
            err.into_response()
        }
    }
}

fn strip_identity_headers(headers: &mut HeaderMap) {
    headers.remove(USER_ID_HEADER);
    headers.remove(USER_EMAIL_HEADER);
    headers.remove(USER_ROLE_HEADER);
}

fn attach_identity(request: &mut Request, user: AuthUser) {
    let headers = request.headers_mut();
    for (name, value) in [
        (USER_ID_HEADER, user.id.as_str()),
        (USER_EMAIL_HEADER, user.email.as_str()),
        (USER_ROLE_HEADER, user.role.as_str()),
    ] {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                headers.insert(name, value);
            }
            Err(_) => tracing::warn!(header = %name, "identity value is not a valid header value"),
        }
    }

    request.extensions_mut().insert(user);
}
