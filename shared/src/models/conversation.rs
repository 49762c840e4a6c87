//! Conversation and message models for buyer–seller enquiries

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Conversation status. `Open` is the only status produced; no transitions
/// are defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    #[default]
    Open,
}

impl ConversationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStatus::Open => "open",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "open" => Some(ConversationStatus::Open),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    #[default]
    Text,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "text",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "text" => Some(MessageType::Text),
            _ => None,
        }
    }
}

/// Thread between one buyer and one seller business about one product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub seller_business_id: Uuid,
    pub product_id: Uuid,
    pub status: ConversationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Whether the user is the buyer or a member of the seller business
    pub fn is_visible_to(&self, user_id: Uuid, member_of: &[Uuid]) -> bool {
        self.buyer_id == user_id || member_of.contains(&self.seller_business_id)
    }
}

/// Immutable message within a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub message_type: MessageType,
    pub created_at: DateTime<Utc>,
}

/// Conversation row for the inbox, with display names joined in
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConversationSummary {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub product_name: Option<String>,
    pub business_name: Option<String>,
    pub buyer_name: Option<String>,
}

impl ConversationSummary {
    pub fn id(&self) -> Uuid {
        self.conversation.id
    }
}

/// Which side of a conversation the viewer is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Participation {
    Buyer,
    Seller,
}

/// Inbox row as shown to one user
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InboxEntry {
    #[serde(flatten)]
    pub summary: ConversationSummary,
    pub participation: Participation,
    /// Name of the other party: the business for buyers, the buyer for sellers
    pub counterpart_name: Option<String>,
}

impl InboxEntry {
    pub fn for_viewer(summary: ConversationSummary, viewer_id: Uuid) -> Self {
        if summary.conversation.buyer_id == viewer_id {
            Self {
                counterpart_name: summary.business_name.clone(),
                participation: Participation::Buyer,
                summary,
            }
        } else {
            Self {
                counterpart_name: summary.buyer_name.clone(),
                participation: Participation::Seller,
                summary,
            }
        }
    }
}

/// Union the buyer-side and seller-side result sets into one inbox.
///
/// Deduplicates by conversation id keeping the first occurrence (buyer-side
/// rows come first), then orders by `updated_at`, most recent first.
pub fn merge_inbox(
    as_buyer: Vec<ConversationSummary>,
    as_seller: Vec<ConversationSummary>,
) -> Vec<ConversationSummary> {
    let mut seen = HashSet::new();
    let mut merged: Vec<ConversationSummary> = as_buyer
        .into_iter()
        .chain(as_seller)
        .filter(|c| seen.insert(c.id()))
        .collect();

    merged.sort_by(|a, b| b.conversation.updated_at.cmp(&a.conversation.updated_at));
    merged
}
