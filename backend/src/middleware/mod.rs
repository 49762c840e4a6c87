//! Request middleware

pub mod auth;

pub use auth::{require_session, session_middleware, CurrentUser, RequestContext};
