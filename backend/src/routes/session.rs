use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Session Router Module
///
/// Both paths fall under the API prefix and are not on the public allow-list,
/// so an unauthenticated call is answered with 401 by the gate itself.
pub fn session_routes() -> Router<AppState> {
    Router::new()
        // GET /api/me
        // The verified identity plus the caller's landing path.
        .route("/api/me", get(handlers::get_session))
        // POST /api/auth/logout
        // Clears the session cookie.
        .route("/api/auth/logout", post(handlers::logout))
}
