/// Router Module Index
///
/// Local routes served by the gate service itself. Every route, and the
/// upstream fallback, sits behind the `access_gate` middleware applied in
/// `create_router`; the modules only split what the gate classifies differently.

/// Routes the gate treats as public (no session needed).
pub mod public;

/// Session endpoints under the protected `/api` prefix.
/// The gate guarantees a verified `AuthUser` before these handlers run.
pub mod session;
