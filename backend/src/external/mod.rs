//! External service integrations

pub mod auth_provider;

pub use auth_provider::{AuthIdentity, AuthProvider, HostedAuthClient, Session, SignUpMetadata};
