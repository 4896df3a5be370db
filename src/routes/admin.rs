use crate::{AppState, handlers};
use axum::{Router, routing::post};

/// Admin Router Module
///
/// Routes reserved for the `ADMIN` role, nested under `/api/admin`. Handlers extract
/// `AuthUser` themselves and reject any principal without `ADMIN`.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /api/admin/accounts
        // Registers an account with an explicit role set.
        .route("/accounts", post(handlers::create_account))
}
