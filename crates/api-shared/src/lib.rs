//! # API Shared
//!
//! Shared utilities and definitions for the agent APIs.
//!
//! Contains:
//! - Request and response schemas (`schema` module)
//! - Shared services like `HealthService`
//! - The HTTP error mapping (`ApiError`)
//! - Construction of the live pipeline from configuration
//!
//! Used by `api-rest` and `api-stream` for common functionality.

pub mod error;
pub mod health;
pub mod schema;
pub mod services;

pub use error::ApiError;
pub use health::HealthService;
pub use schema::*;
pub use services::{live_pipeline, LivePipeline};
