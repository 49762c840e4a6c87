//! Data-access seams
//!
//! Services talk to the store only through these traits. `PgStore`
//! implements all of them against PostgreSQL; tests swap in in-memory
//! fakes. Implementations never manage transactions for the caller: each
//! method is one independent round trip.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use shared::{
    Business, Category, City, Conversation, ConversationSummary, ListLimit, Message, MessageType,
    Profile, ProductListing, UserRole,
};

use crate::error::AppResult;

pub mod postgres;

pub use postgres::PgStore;

/// Conversation row to insert at first enquiry
#[derive(Debug, Clone)]
pub struct NewConversation {
    pub buyer_id: Uuid,
    pub seller_business_id: Uuid,
    pub product_id: Uuid,
}

/// Message row to append to a conversation
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub message_type: MessageType,
}

/// Profile row created right after the auth identity
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
    pub city_id: Option<Uuid>,
    pub business_id: Option<Uuid>,
    /// Case-insensitive substring match on name or description
    pub query: Option<String>,
    pub limit: ListLimit,
}

#[derive(Debug, Clone, Default)]
pub struct BusinessFilter {
    pub category_id: Option<Uuid>,
    pub city_id: Option<Uuid>,
    pub verified_only: bool,
    /// Case-insensitive substring match on name
    pub query: Option<String>,
    pub limit: ListLimit,
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Conversations where the user is the buyer
    async fn conversations_for_buyer(&self, buyer_id: Uuid) -> AppResult<Vec<ConversationSummary>>;

    /// Ids of every business the user is a member of
    async fn business_ids_for_member(&self, user_id: Uuid) -> AppResult<Vec<Uuid>>;

    /// Conversations whose seller business is in `business_ids`
    async fn conversations_for_businesses(
        &self,
        business_ids: &[Uuid],
    ) -> AppResult<Vec<ConversationSummary>>;

    async fn find_conversation(&self, id: Uuid) -> AppResult<Option<ConversationSummary>>;

    async fn insert_conversation(&self, new: NewConversation) -> AppResult<Conversation>;

    /// All messages of a conversation, oldest first
    async fn messages_for_conversation(&self, conversation_id: Uuid) -> AppResult<Vec<Message>>;

    async fn insert_message(&self, new: NewMessage) -> AppResult<Message>;

    /// Set `updated_at` unconditionally (last write wins)
    async fn touch_conversation(&self, conversation_id: Uuid, at: DateTime<Utc>) -> AppResult<()>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn insert_profile(&self, new: NewProfile) -> AppResult<Profile>;

    async fn find_profile(&self, id: Uuid) -> AppResult<Option<Profile>>;

    /// `Ok(None)` when no row matches; `Err` only for real query failures
    async fn find_profile_by_email(&self, email: &str) -> AppResult<Option<Profile>>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_products(&self, filter: &ProductFilter) -> AppResult<Vec<ProductListing>>;

    async fn find_product(&self, id: Uuid) -> AppResult<Option<ProductListing>>;

    async fn list_businesses(&self, filter: &BusinessFilter) -> AppResult<Vec<Business>>;

    async fn find_business(&self, id: Uuid) -> AppResult<Option<Business>>;

    async fn list_categories(&self) -> AppResult<Vec<Category>>;

    async fn find_category_by_slug(&self, slug: &str) -> AppResult<Option<Category>>;

    async fn list_cities(&self) -> AppResult<Vec<City>>;

    async fn find_city_by_slug(&self, slug: &str) -> AppResult<Option<City>>;

    /// Cheap connectivity check for the health endpoint
    async fn ping(&self) -> AppResult<()>;
}

/// Build an ILIKE pattern matching `query` anywhere, with wildcards escaped
pub fn contains_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern(" steel "), "%steel%");
        assert_eq!(contains_pattern("100%_cotton"), "%100\\%\\_cotton%");
    }
}
