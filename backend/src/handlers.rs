use axum::{
    Json,
    extract::{Request, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::{
    AppState,
    auth::{AuthUser, SESSION_COOKIE},
    error::ApiError,
    models::{ErrorBody, LogoutResponse, SessionInfo},
};

/// health
///
/// [Public Route] Liveness check for load balancers.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}

/// get_session
///
/// [Protected API] Returns the identity the gate verified for this request.
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current session", body = SessionInfo),
        (status = 401, description = "No valid session", body = ErrorBody)
    )
)]
pub async fn get_session(user: AuthUser, State(state): State<AppState>) -> Json<SessionInfo> {
    let landing_path = state.gate.rules().landing_path(user.role).to_string();
    Json(SessionInfo {
        user_id: user.id,
        email: user.email,
        role: user.role,
        landing_path,
        expires_at: user.expires_at,
    })
}

/// logout
///
/// [Protected API] Expires the session cookie on the client. Tokens are
/// stateless, so there is nothing to revoke server-side.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Session cookie cleared", body = LogoutResponse),
        (status = 401, description = "No valid session", body = ErrorBody)
    )
)]
pub async fn logout(user: AuthUser) -> Response {
    tracing::info!(role = %user.role, "session logout");

    let cleared = format!("{SESSION_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax");
    (
        [(header::SET_COOKIE, cleared)],
        Json(LogoutResponse { success: true }),
    )
        .into_response()
}

/// forward
///
/// Fallback for everything without a local route: hand the (already gated)
/// request to the upstream application.
pub async fn forward(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, ApiError> {
    state.upstream.forward(request).await
}
