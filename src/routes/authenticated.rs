use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Routes accessible to any principal that passed the authentication layer. The
/// `auth_middleware` wrapping this router guarantees a valid `AuthUser`; role checks
/// happen inside the handlers.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /api/car/add
        // Submits an advertisement. Requires USER or ADMIN.
        .route("/api/car/add", post(handlers::add_car))
        // GET /api/account/me
        // The caller's own account and roles.
        .route("/api/account/me", get(handlers::get_me))
}
