//! Enquiry and conversation service
//!
//! Creates conversations at first enquiry, appends messages, and builds the
//! per-user inbox from the two ways a user can be party to a conversation:
//! as the buyer, or as a member of the seller business.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use shared::{
    merge_inbox, validate_enquiry, validate_message_text, Conversation, ConversationSummary,
    EnquiryInput, InboxEntry, Message, MessageType,
};

use crate::error::{AppError, AppResult};
use crate::repositories::{ConversationStore, NewConversation, NewMessage};
use crate::services::saga::SagaOutcome;

/// Conversation service
#[derive(Clone)]
pub struct ConversationService {
    store: Arc<dyn ConversationStore>,
}

/// Conversation and first message created by an enquiry
#[derive(Debug, Clone, Serialize)]
pub struct Enquiry {
    pub conversation: Conversation,
    pub message: Message,
}

impl ConversationService {
    /// Create a new ConversationService instance
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    /// Inbox for a user: union of buyer-side and seller-side conversations,
    /// deduplicated by id and ordered by most recent activity.
    ///
    /// Either sub-fetch failing fails the whole listing.
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<InboxEntry>> {
        let (as_buyer, business_ids) = tokio::try_join!(
            self.store.conversations_for_buyer(user_id),
            self.store.business_ids_for_member(user_id),
        )?;

        let as_seller = if business_ids.is_empty() {
            Vec::new()
        } else {
            self.store.conversations_for_businesses(&business_ids).await?
        };

        tracing::debug!(
            %user_id,
            buyer = as_buyer.len(),
            seller = as_seller.len(),
            "Assembling inbox"
        );

        Ok(merge_inbox(as_buyer, as_seller)
            .into_iter()
            .map(|summary| InboxEntry::for_viewer(summary, user_id))
            .collect())
    }

    /// A single conversation, if the user can see it
    pub async fn get_for_user(&self, conversation_id: Uuid, user_id: Uuid) -> AppResult<ConversationSummary> {
        let summary = self
            .store
            .find_conversation(conversation_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Conversation".to_string()))?;

        if summary.conversation.buyer_id == user_id {
            return Ok(summary);
        }

        let member_of = self.store.business_ids_for_member(user_id).await?;
        if summary.conversation.is_visible_to(user_id, &member_of) {
            Ok(summary)
        } else {
            // Same answer as a missing conversation so ids can't be probed
            Err(AppError::NotFound("Conversation".to_string()))
        }
    }

    /// Full message history, oldest first
    pub async fn list_messages(&self, conversation_id: Uuid) -> AppResult<Vec<Message>> {
        self.store.messages_for_conversation(conversation_id).await
    }

    /// Message history for a participant
    pub async fn list_messages_for_user(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Vec<Message>> {
        self.get_for_user(conversation_id, user_id).await?;
        self.list_messages(conversation_id).await
    }

    /// Append a message and bump the conversation's `updated_at` to the
    /// message's own timestamp, so both come from the same clock.
    ///
    /// The two writes are independent. If the timestamp update fails the
    /// message still stands and the send is reported as successful.
    pub async fn send_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        text: &str,
    ) -> AppResult<Message> {
        let content = validate_message_text(text)?;

        let message = self
            .store
            .insert_message(NewMessage {
                conversation_id,
                sender_id,
                content: content.to_string(),
                message_type: MessageType::Text,
            })
            .await
            .map_err(|e| AppError::MessageSend(e.to_string()))?;

        if let Err(e) = self
            .store
            .touch_conversation(conversation_id, message.created_at)
            .await
        {
            tracing::warn!(
                %conversation_id,
                message_id = %message.id,
                "Message stored but conversation timestamp not updated: {}",
                e
            );
        }

        Ok(message)
    }

    /// Send as a participant: rejects blank text first, then checks that
    /// the sender can see the conversation.
    pub async fn send_message_as_participant(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        text: &str,
    ) -> AppResult<Message> {
        validate_message_text(text)?;
        self.get_for_user(conversation_id, sender_id).await?;
        self.send_message(conversation_id, sender_id, text).await
    }

    /// First contact from a buyer: conversation row, then first message.
    ///
    /// No compensation is defined. If the message insert fails the
    /// conversation row stays and the outcome is `LeftInPlace`.
    pub async fn create_enquiry(&self, buyer_id: Uuid, input: &EnquiryInput) -> SagaOutcome<Enquiry> {
        let enquiry = match validate_enquiry(input) {
            Ok(valid) => valid,
            Err(e) => return SagaOutcome::Aborted(e.into()),
        };

        let conversation = match self
            .store
            .insert_conversation(NewConversation {
                buyer_id,
                seller_business_id: enquiry.seller_business_id,
                product_id: enquiry.product_id,
            })
            .await
        {
            Ok(conversation) => conversation,
            Err(e) => {
                tracing::error!(%buyer_id, product_id = %enquiry.product_id, "Failed to create conversation: {}", e);
                return SagaOutcome::Aborted(AppError::ConversationCreate(e.to_string()));
            }
        };

        let message = self
            .store
            .insert_message(NewMessage {
                conversation_id: conversation.id,
                sender_id: buyer_id,
                content: enquiry.message,
                message_type: MessageType::Text,
            })
            .await;

        match message {
            Ok(message) => {
                tracing::info!(conversation_id = %conversation.id, %buyer_id, "Enquiry created");
                SagaOutcome::Completed(Enquiry { conversation, message })
            }
            Err(e) => {
                tracing::error!(
                    conversation_id = %conversation.id,
                    "Conversation created but first message failed: {}",
                    e
                );
                SagaOutcome::LeftInPlace {
                    error: AppError::MessageSend(e.to_string()),
                }
            }
        }
    }
}
