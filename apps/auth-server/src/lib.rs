//! # GymGate Auth Server
//!
//! Actix-web front for the staff authentication core. The binary in
//! `main.rs` wires these modules together; integration tests build the same
//! app in-process.
//!
//! Middleware order, outermost first:
//! 1. `TracingLogger` - request span and access log
//! 2. [`observability::assign_request_id`] - `X-Request-ID`
//! 3. [`middleware::auth::AuthenticationMiddleware`] - authenticate and authorize
//!
//! The login resource is additionally wrapped in the rate limiter.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod state;
pub mod telemetry;
