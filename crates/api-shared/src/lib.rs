//! # API Shared
//!
//! Shared request and response types for the SGA assessment APIs.
//!
//! Contains:
//! - JSON message types with OpenAPI schemas (`messages` module)
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` and the `sga-run` binary.

pub mod health;
pub mod messages;

pub use health::HealthService;
pub use messages::*;
