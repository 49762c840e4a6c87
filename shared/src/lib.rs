//! Shared types and models for the B2B marketplace
//!
//! Domain records, view-model shaping, and input validation used by the
//! backend and its tests.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
