//! Business logic services for the B2B marketplace

pub mod auth;
pub mod catalog;
pub mod conversation;
pub mod saga;

pub use auth::AuthService;
pub use catalog::{CatalogService, SearchResults};
pub use conversation::{ConversationService, Enquiry};
pub use saga::SagaOutcome;
