//! HTTP handlers

pub mod auth;
pub mod catalog;
pub mod conversation;
pub mod enquiry;
pub mod health;

pub use auth::*;
pub use catalog::*;
pub use conversation::*;
pub use enquiry::*;
pub use health::*;
