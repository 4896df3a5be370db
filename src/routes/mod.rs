//! Router Module Index
//!
//! Organizes the routing into access-segregated modules. Access control is applied
//! at the module level (via Axum layers) and re-checked in the handlers.

/// Routes accessible to all clients (anonymous, read-only, plus activation).
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
pub mod authenticated;

/// Routes restricted to principals holding the `ADMIN` role.
pub mod admin;
