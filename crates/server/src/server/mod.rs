//! Axum HTTP(S) server, routing, and middleware.
//!
//! # Responsibilities
//! - Define the Axum router with all routes and shared middleware.
//! - Extract the session token from each authenticated request.
//! - Translate [`crate::error::AccessError`] into status codes and JSON bodies.
//! - Optionally terminate TLS with rustls.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
pub mod tls;
