use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints that are **unauthenticated** and accessible to any client.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for monitoring and load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /api/car/cars?yearFrom=&yearTo=&priceFrom=&priceTo=
        // Inclusive range search. Pending advertisements are listed too.
        .route("/api/car/cars", get(handlers::get_cars))
        // GET /api/car/activate?id=
        // Pending -> active transition. Carries no role restriction.
        .route("/api/car/activate", get(handlers::activate_car))
        // GET /api/car/{id}
        .route("/api/car/{id}", get(handlers::get_car))
}
