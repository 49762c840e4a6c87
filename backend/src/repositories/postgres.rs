//! PostgreSQL implementation of the store traits

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use shared::{
    Business, Category, City, Conversation, ConversationStatus, ConversationSummary, Message,
    MessageType, Product, ProductImage, ProductListing, Profile, UserRole,
};

use super::{
    contains_pattern, BusinessFilter, CatalogStore, ConversationStore, NewConversation, NewMessage,
    NewProfile, ProductFilter, ProfileStore,
};
use crate::error::{AppError, AppResult};

/// Store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const CONVERSATION_SUMMARY_SELECT: &str = r#"
    SELECT c.id, c.buyer_id, c.seller_business_id, c.product_id, c.status,
           c.created_at, c.updated_at,
           p.name AS product_name, b.name AS business_name, u.full_name AS buyer_name
    FROM conversations c
    LEFT JOIN products p ON p.id = c.product_id
    LEFT JOIN businesses b ON b.id = c.seller_business_id
    LEFT JOIN users u ON u.id = c.buyer_id
"#;

const PRODUCT_LISTING_SELECT: &str = r#"
    SELECT p.id, p.business_id, p.name, p.description, p.price, p.unit, p.moq,
           p.is_active, p.category_id, p.created_at,
           b.name AS business_name, b.is_verified AS business_verified,
           ci.name AS city_name, b.address
    FROM products p
    JOIN businesses b ON b.id = p.business_id
    LEFT JOIN cities ci ON ci.id = b.city_id
"#;

const BUSINESS_SELECT: &str = r#"
    SELECT b.id, b.name, b.description, b.is_verified, b.address,
           b.city_id, ci.name AS city_name, b.category_id, cat.name AS category_name,
           b.business_type, b.logo_url, b.created_at
    FROM businesses b
    LEFT JOIN cities ci ON ci.id = b.city_id
    LEFT JOIN categories cat ON cat.id = b.category_id
"#;

/// Oldest first; `id` breaks ties between inserts with the same timestamp
const MESSAGES_FOR_CONVERSATION: &str = r#"
    SELECT id, conversation_id, sender_id, content, message_type, created_at
    FROM messages
    WHERE conversation_id = $1
    ORDER BY created_at ASC, id ASC
"#;

#[derive(Debug, sqlx::FromRow)]
struct ConversationRow {
    id: Uuid,
    buyer_id: Uuid,
    seller_business_id: Uuid,
    product_id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ConversationRow> for Conversation {
    type Error = AppError;

    fn try_from(r: ConversationRow) -> Result<Self, Self::Error> {
        let status = ConversationStatus::from_str(&r.status).ok_or_else(|| {
            AppError::DataAccess(format!("unknown conversation status '{}'", r.status))
        })?;
        Ok(Conversation {
            id: r.id,
            buyer_id: r.buyer_id,
            seller_business_id: r.seller_business_id,
            product_id: r.product_id,
            status,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ConversationSummaryRow {
    #[sqlx(flatten)]
    conversation: ConversationRow,
    product_name: Option<String>,
    business_name: Option<String>,
    buyer_name: Option<String>,
}

impl TryFrom<ConversationSummaryRow> for ConversationSummary {
    type Error = AppError;

    fn try_from(r: ConversationSummaryRow) -> Result<Self, Self::Error> {
        Ok(ConversationSummary {
            conversation: r.conversation.try_into()?,
            product_name: r.product_name,
            business_name: r.business_name,
            buyer_name: r.buyer_name,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    conversation_id: Uuid,
    sender_id: Uuid,
    content: String,
    message_type: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for Message {
    type Error = AppError;

    fn try_from(r: MessageRow) -> Result<Self, Self::Error> {
        let message_type = MessageType::from_str(&r.message_type).ok_or_else(|| {
            AppError::DataAccess(format!("unknown message type '{}'", r.message_type))
        })?;
        Ok(Message {
            id: r.id,
            conversation_id: r.conversation_id,
            sender_id: r.sender_id,
            content: r.content,
            message_type,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    email: String,
    full_name: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(r: ProfileRow) -> Self {
        let role = UserRole::from_str(&r.role).unwrap_or_else(|| {
            tracing::warn!(user_id = %r.id, role = %r.role, "Unrecognised role, treating as buyer");
            UserRole::default()
        });
        Profile {
            id: r.id,
            email: r.email,
            full_name: r.full_name,
            role,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductListingRow {
    id: Uuid,
    business_id: Uuid,
    name: String,
    description: Option<String>,
    price: Option<Decimal>,
    unit: Option<String>,
    moq: Option<i32>,
    is_active: bool,
    category_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    business_name: String,
    business_verified: bool,
    city_name: Option<String>,
    address: Option<String>,
}

impl ProductListingRow {
    fn into_listing(self, images: Vec<ProductImage>) -> ProductListing {
        ProductListing {
            product: Product {
                id: self.id,
                business_id: self.business_id,
                name: self.name,
                description: self.description,
                price: self.price,
                unit: self.unit,
                moq: self.moq,
                is_active: self.is_active,
                category_id: self.category_id,
                created_at: self.created_at,
            },
            business_name: self.business_name,
            business_verified: self.business_verified,
            city_name: self.city_name,
            address: self.address,
            images,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductImageRow {
    id: Uuid,
    product_id: Uuid,
    url: String,
    is_primary: bool,
    display_order: Option<i32>,
}

impl From<ProductImageRow> for ProductImage {
    fn from(r: ProductImageRow) -> Self {
        ProductImage {
            id: r.id,
            product_id: r.product_id,
            url: r.url,
            is_primary: r.is_primary,
            display_order: r.display_order,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BusinessRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    is_verified: bool,
    address: Option<String>,
    city_id: Option<Uuid>,
    city_name: Option<String>,
    category_id: Option<Uuid>,
    category_name: Option<String>,
    business_type: Option<String>,
    logo_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<BusinessRow> for Business {
    fn from(r: BusinessRow) -> Self {
        Business {
            id: r.id,
            name: r.name,
            description: r.description,
            is_verified: r.is_verified,
            address: r.address,
            city_id: r.city_id,
            city_name: r.city_name,
            category_id: r.category_id,
            category_name: r.category_name,
            business_type: r.business_type,
            logo_url: r.logo_url,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: Uuid,
    name: String,
    slug: String,
    parent_id: Option<Uuid>,
}

impl From<CategoryRow> for Category {
    fn from(r: CategoryRow) -> Self {
        Category {
            id: r.id,
            name: r.name,
            slug: r.slug,
            parent_id: r.parent_id,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CityRow {
    id: Uuid,
    name: String,
    state: Option<String>,
    slug: String,
}

impl From<CityRow> for City {
    fn from(r: CityRow) -> Self {
        City {
            id: r.id,
            name: r.name,
            state: r.state,
            slug: r.slug,
        }
    }
}

fn summaries(rows: Vec<ConversationSummaryRow>) -> AppResult<Vec<ConversationSummary>> {
    rows.into_iter().map(ConversationSummary::try_from).collect()
}

impl PgStore {
    /// Images for a set of products, grouped by product id
    async fn images_for(&self, product_ids: &[Uuid]) -> AppResult<HashMap<Uuid, Vec<ProductImage>>> {
        if product_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, ProductImageRow>(
            r#"
            SELECT id, product_id, url, is_primary, display_order
            FROM product_images
            WHERE product_id = ANY($1)
            "#,
        )
        .bind(product_ids)
        .fetch_all(&self.db)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<ProductImage>> = HashMap::new();
        for row in rows {
            grouped.entry(row.product_id).or_default().push(row.into());
        }
        Ok(grouped)
    }
}

#[async_trait]
impl ConversationStore for PgStore {
    async fn conversations_for_buyer(&self, buyer_id: Uuid) -> AppResult<Vec<ConversationSummary>> {
        let rows = sqlx::query_as::<_, ConversationSummaryRow>(&format!(
            "{} WHERE c.buyer_id = $1 ORDER BY c.updated_at DESC, c.id",
            CONVERSATION_SUMMARY_SELECT
        ))
        .bind(buyer_id)
        .fetch_all(&self.db)
        .await?;

        summaries(rows)
    }

    async fn business_ids_for_member(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT business_id FROM business_members WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(ids)
    }

    async fn conversations_for_businesses(
        &self,
        business_ids: &[Uuid],
    ) -> AppResult<Vec<ConversationSummary>> {
        if business_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, ConversationSummaryRow>(&format!(
            "{} WHERE c.seller_business_id = ANY($1) ORDER BY c.updated_at DESC, c.id",
            CONVERSATION_SUMMARY_SELECT
        ))
        .bind(business_ids)
        .fetch_all(&self.db)
        .await?;

        summaries(rows)
    }

    async fn find_conversation(&self, id: Uuid) -> AppResult<Option<ConversationSummary>> {
        let row = sqlx::query_as::<_, ConversationSummaryRow>(&format!(
            "{} WHERE c.id = $1",
            CONVERSATION_SUMMARY_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(ConversationSummary::try_from).transpose()
    }

    async fn insert_conversation(&self, new: NewConversation) -> AppResult<Conversation> {
        let row = sqlx::query_as::<_, ConversationRow>(
            r#"
            INSERT INTO conversations (buyer_id, seller_business_id, product_id, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, buyer_id, seller_business_id, product_id, status, created_at, updated_at
            "#,
        )
        .bind(new.buyer_id)
        .bind(new.seller_business_id)
        .bind(new.product_id)
        .bind(ConversationStatus::Open.as_str())
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }

    async fn messages_for_conversation(&self, conversation_id: Uuid) -> AppResult<Vec<Message>> {
        let rows = sqlx::query_as::<_, MessageRow>(MESSAGES_FOR_CONVERSATION)
        .bind(conversation_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Message::try_from).collect()
    }

    async fn insert_message(&self, new: NewMessage) -> AppResult<Message> {
        let row = sqlx::query_as::<_, MessageRow>(
            r#"
            INSERT INTO messages (conversation_id, sender_id, content, message_type)
            VALUES ($1, $2, $3, $4)
            RETURNING id, conversation_id, sender_id, content, message_type, created_at
            "#,
        )
        .bind(new.conversation_id)
        .bind(new.sender_id)
        .bind(&new.content)
        .bind(new.message_type.as_str())
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }

    async fn touch_conversation(&self, conversation_id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        let result = sqlx::query("UPDATE conversations SET updated_at = $2 WHERE id = $1")
            .bind(conversation_id)
            .bind(at)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Conversation".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn insert_profile(&self, new: NewProfile) -> AppResult<Profile> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            INSERT INTO users (id, email, full_name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, full_name, role, created_at
            "#,
        )
        .bind(new.id)
        .bind(&new.email)
        .bind(&new.full_name)
        .bind(new.role.as_str())
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    async fn find_profile(&self, id: Uuid) -> AppResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, email, full_name, role, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Profile::from))
    }

    async fn find_profile_by_email(&self, email: &str) -> AppResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, email, full_name, role, created_at FROM users WHERE lower(email) = lower($1)",
        )
        .bind(email.trim())
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Profile::from))
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_products(&self, filter: &ProductFilter) -> AppResult<Vec<ProductListing>> {
        let pattern = filter.query.as_deref().map(contains_pattern);

        let rows = sqlx::query_as::<_, ProductListingRow>(&format!(
            r#"{}
            WHERE p.is_active = true
              AND ($1::uuid IS NULL OR p.category_id = $1)
              AND ($2::uuid IS NULL OR b.city_id = $2)
              AND ($3::uuid IS NULL OR p.business_id = $3)
              AND ($4::text IS NULL OR p.name ILIKE $4 OR p.description ILIKE $4)
            ORDER BY p.created_at DESC, p.id
            LIMIT $5
            "#,
            PRODUCT_LISTING_SELECT
        ))
        .bind(filter.category_id)
        .bind(filter.city_id)
        .bind(filter.business_id)
        .bind(pattern)
        .bind(filter.limit.as_i64())
        .fetch_all(&self.db)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut images = self.images_for(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                let imgs = images.remove(&r.id).unwrap_or_default();
                r.into_listing(imgs)
            })
            .collect())
    }

    async fn find_product(&self, id: Uuid) -> AppResult<Option<ProductListing>> {
        let row = sqlx::query_as::<_, ProductListingRow>(&format!(
            "{} WHERE p.id = $1",
            PRODUCT_LISTING_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(row) => {
                let mut images = self.images_for(&[row.id]).await?;
                let imgs = images.remove(&row.id).unwrap_or_default();
                Ok(Some(row.into_listing(imgs)))
            }
            None => Ok(None),
        }
    }

    async fn list_businesses(&self, filter: &BusinessFilter) -> AppResult<Vec<Business>> {
        let pattern = filter.query.as_deref().map(contains_pattern);

        let rows = sqlx::query_as::<_, BusinessRow>(&format!(
            r#"{}
            WHERE ($1::uuid IS NULL OR b.category_id = $1)
              AND ($2::uuid IS NULL OR b.city_id = $2)
              AND ($3 = false OR b.is_verified = true)
              AND ($4::text IS NULL OR b.name ILIKE $4)
            ORDER BY b.is_verified DESC, b.name ASC
            LIMIT $5
            "#,
            BUSINESS_SELECT
        ))
        .bind(filter.category_id)
        .bind(filter.city_id)
        .bind(filter.verified_only)
        .bind(pattern)
        .bind(filter.limit.as_i64())
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Business::from).collect())
    }

    async fn find_business(&self, id: Uuid) -> AppResult<Option<Business>> {
        let row = sqlx::query_as::<_, BusinessRow>(&format!("{} WHERE b.id = $1", BUSINESS_SELECT))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(Business::from))
    }

    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug, parent_id FROM categories ORDER BY name ASC",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn find_category_by_slug(&self, slug: &str) -> AppResult<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug, parent_id FROM categories WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Category::from))
    }

    async fn list_cities(&self) -> AppResult<Vec<City>> {
        let rows = sqlx::query_as::<_, CityRow>(
            "SELECT id, name, state, slug FROM cities ORDER BY name ASC",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(City::from).collect())
    }

    async fn find_city_by_slug(&self, slug: &str) -> AppResult<Option<City>> {
        let row = sqlx::query_as::<_, CityRow>("SELECT id, name, state, slug FROM cities WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(City::from))
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}
