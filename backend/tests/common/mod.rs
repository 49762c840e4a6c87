//! In-memory stand-ins for the store and the auth provider

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

use marketplace_server::config::{AuthConfig, DatabaseConfig, ServerConfig, SiteConfig};
use marketplace_server::error::{AppError, AppResult};
use marketplace_server::external::auth_provider::{verify_access_token, AccessClaims};
use marketplace_server::external::{AuthIdentity, AuthProvider, Session, SignUpMetadata};
use marketplace_server::repositories::{
    BusinessFilter, CatalogStore, ConversationStore, NewConversation, NewMessage,
    NewProfile, ProductFilter, ProfileStore,
};
use marketplace_server::{AppState, Config};
use shared::{
    Business, BusinessMember, Category, City, Conversation, ConversationStatus,
    ConversationSummary, Message, Product, ProductImage, ProductListing, Profile, UserRole,
};

pub const JWT_SECRET: &str = "integration-test-secret-0123456789";

/// Switches that make individual store calls fail
#[derive(Debug, Default, Clone)]
pub struct Failures {
    pub buyer_fetch: bool,
    pub member_fetch: bool,
    pub business_fetch: bool,
    pub insert_conversation: bool,
    pub insert_message: bool,
    pub touch: bool,
    pub insert_profile: bool,
    pub find_profile: bool,
    pub catalog: bool,
}

#[derive(Debug, Default)]
struct Tables {
    profiles: Vec<Profile>,
    members: Vec<BusinessMember>,
    conversations: Vec<Conversation>,
    messages: Vec<Message>,
    businesses: Vec<Business>,
    products: Vec<ProductListing>,
    categories: Vec<Category>,
    cities: Vec<City>,
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    failures: Mutex<Failures>,
    writes: AtomicUsize,
    /// Seconds the store's clock runs ahead of (or behind) the app's
    clock_skew: AtomicI64,
}

fn injected(what: &str) -> AppError {
    AppError::DataAccess(format!("injected failure: {}", what))
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail(&self, f: impl FnOnce(&mut Failures)) {
        f(&mut self.failures.lock().unwrap());
    }

    fn failures(&self) -> Failures {
        self.failures.lock().unwrap().clone()
    }

    pub fn set_clock_skew(&self, skew: Duration) {
        self.clock_skew.store(skew.num_seconds(), Ordering::SeqCst);
    }

    fn store_now(&self) -> DateTime<Utc> {
        Utc::now() + Duration::seconds(self.clock_skew.load(Ordering::SeqCst))
    }

    /// Number of successful write calls
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn add_profile(&self, id: Uuid, name: &str, role: UserRole) {
        self.tables.lock().unwrap().profiles.push(Profile {
            id,
            email: format!("{}@example.com", name.to_lowercase()),
            full_name: name.to_string(),
            role,
            created_at: Utc::now(),
        });
    }

    pub fn add_member(&self, business_id: Uuid, user_id: Uuid) {
        self.tables.lock().unwrap().members.push(BusinessMember {
            business_id,
            user_id,
            role: "owner".to_string(),
        });
    }

    pub fn add_business(&self, business: Business) {
        self.tables.lock().unwrap().businesses.push(business);
    }

    pub fn add_product(&self, listing: ProductListing) {
        self.tables.lock().unwrap().products.push(listing);
    }

    pub fn add_category(&self, category: Category) {
        self.tables.lock().unwrap().categories.push(category);
    }

    pub fn add_city(&self, city: City) {
        self.tables.lock().unwrap().cities.push(city);
    }

    /// Seed a conversation last active `minutes_ago`
    pub fn add_conversation(&self, buyer_id: Uuid, seller_business_id: Uuid, minutes_ago: i64) -> Uuid {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        let id = Uuid::new_v4();
        self.tables.lock().unwrap().conversations.push(Conversation {
            id,
            buyer_id,
            seller_business_id,
            product_id: Uuid::new_v4(),
            status: ConversationStatus::Open,
            created_at: at,
            updated_at: at,
        });
        id
    }

    pub fn conversation(&self, id: Uuid) -> Option<Conversation> {
        self.tables
            .lock()
            .unwrap()
            .conversations
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    pub fn conversation_count(&self) -> usize {
        self.tables.lock().unwrap().conversations.len()
    }

    pub fn message_count(&self) -> usize {
        self.tables.lock().unwrap().messages.len()
    }

    pub fn profile_count(&self) -> usize {
        self.tables.lock().unwrap().profiles.len()
    }

    fn summarize(tables: &Tables, c: &Conversation) -> ConversationSummary {
        ConversationSummary {
            conversation: c.clone(),
            product_name: tables
                .products
                .iter()
                .find(|p| p.product.id == c.product_id)
                .map(|p| p.product.name.clone()),
            business_name: tables
                .businesses
                .iter()
                .find(|b| b.id == c.seller_business_id)
                .map(|b| b.name.clone()),
            buyer_name: tables
                .profiles
                .iter()
                .find(|p| p.id == c.buyer_id)
                .map(|p| p.full_name.clone()),
        }
    }

    fn matches(haystack: Option<&str>, needle: &Option<String>) -> bool {
        match needle {
            None => true,
            Some(q) => haystack
                .map(|h| h.to_lowercase().contains(&q.trim().to_lowercase()))
                .unwrap_or(false),
        }
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    async fn conversations_for_buyer(&self, buyer_id: Uuid) -> AppResult<Vec<ConversationSummary>> {
        if self.failures().buyer_fetch {
            return Err(injected("buyer conversations"));
        }
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .conversations
            .iter()
            .filter(|c| c.buyer_id == buyer_id)
            .map(|c| Self::summarize(&tables, c))
            .collect())
    }

    async fn business_ids_for_member(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        if self.failures().member_fetch {
            return Err(injected("memberships"));
        }
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .members
            .iter()
            .filter(|m| m.user_id == user_id)
            .map(|m| m.business_id)
            .collect())
    }

    async fn conversations_for_businesses(
        &self,
        business_ids: &[Uuid],
    ) -> AppResult<Vec<ConversationSummary>> {
        if self.failures().business_fetch {
            return Err(injected("seller conversations"));
        }
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .conversations
            .iter()
            .filter(|c| business_ids.contains(&c.seller_business_id))
            .map(|c| Self::summarize(&tables, c))
            .collect())
    }

    async fn find_conversation(&self, id: Uuid) -> AppResult<Option<ConversationSummary>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .conversations
            .iter()
            .find(|c| c.id == id)
            .map(|c| Self::summarize(&tables, c)))
    }

    async fn insert_conversation(&self, new: NewConversation) -> AppResult<Conversation> {
        if self.failures().insert_conversation {
            return Err(injected("insert conversation"));
        }
        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::new_v4(),
            buyer_id: new.buyer_id,
            seller_business_id: new.seller_business_id,
            product_id: new.product_id,
            status: ConversationStatus::Open,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().unwrap().conversations.push(conversation.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(conversation)
    }

    async fn messages_for_conversation(&self, conversation_id: Uuid) -> AppResult<Vec<Message>> {
        let tables = self.tables.lock().unwrap();
        let mut messages: Vec<Message> = tables
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| (m.created_at, m.id));
        Ok(messages)
    }

    async fn insert_message(&self, new: NewMessage) -> AppResult<Message> {
        if self.failures().insert_message {
            return Err(injected("insert message"));
        }
        let mut tables = self.tables.lock().unwrap();
        let last: Option<DateTime<Utc>> = tables
            .messages
            .iter()
            .filter(|m| m.conversation_id == new.conversation_id)
            .map(|m| m.created_at)
            .max();
        let now = self.store_now();
        let created_at = match last {
            Some(last) if last >= now => last + Duration::microseconds(1),
            _ => now,
        };
        let message = Message {
            id: Uuid::new_v4(),
            conversation_id: new.conversation_id,
            sender_id: new.sender_id,
            content: new.content,
            message_type: new.message_type,
            created_at,
        };
        tables.messages.push(message.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(message)
    }

    async fn touch_conversation(&self, conversation_id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        if self.failures().touch {
            return Err(injected("touch conversation"));
        }
        let mut tables = self.tables.lock().unwrap();
        let conversation = tables
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
            .ok_or_else(|| AppError::NotFound("Conversation".to_string()))?;
        conversation.updated_at = at;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn insert_profile(&self, new: NewProfile) -> AppResult<Profile> {
        if self.failures().insert_profile {
            return Err(injected("insert profile"));
        }
        let profile = Profile {
            id: new.id,
            email: new.email,
            full_name: new.full_name,
            role: new.role,
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().profiles.push(profile.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(profile)
    }

    async fn find_profile(&self, id: Uuid) -> AppResult<Option<Profile>> {
        if self.failures().find_profile {
            return Err(injected("find profile"));
        }
        Ok(self
            .tables
            .lock()
            .unwrap()
            .profiles
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn find_profile_by_email(&self, email: &str) -> AppResult<Option<Profile>> {
        if self.failures().find_profile {
            return Err(injected("find profile by email"));
        }
        Ok(self
            .tables
            .lock()
            .unwrap()
            .profiles
            .iter()
            .find(|p| p.email.eq_ignore_ascii_case(email.trim()))
            .cloned())
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn list_products(&self, filter: &ProductFilter) -> AppResult<Vec<ProductListing>> {
        if self.failures().catalog {
            return Err(injected("products"));
        }
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .products
            .iter()
            .filter(|p| p.product.is_active)
            .filter(|p| filter.category_id.map_or(true, |id| p.product.category_id == Some(id)))
            .filter(|p| filter.business_id.map_or(true, |id| p.product.business_id == id))
            .filter(|p| {
                filter.city_id.map_or(true, |id| {
                    tables
                        .businesses
                        .iter()
                        .any(|b| b.id == p.product.business_id && b.city_id == Some(id))
                })
            })
            .filter(|p| {
                Self::matches(Some(&p.product.name), &filter.query)
                    || Self::matches(p.product.description.as_deref(), &filter.query)
            })
            .take(filter.limit.get() as usize)
            .cloned()
            .collect())
    }

    async fn find_product(&self, id: Uuid) -> AppResult<Option<ProductListing>> {
        if self.failures().catalog {
            return Err(injected("product"));
        }
        Ok(self
            .tables
            .lock()
            .unwrap()
            .products
            .iter()
            .find(|p| p.product.id == id)
            .cloned())
    }

    async fn list_businesses(&self, filter: &BusinessFilter) -> AppResult<Vec<Business>> {
        if self.failures().catalog {
            return Err(injected("businesses"));
        }
        Ok(self
            .tables
            .lock()
            .unwrap()
            .businesses
            .iter()
            .filter(|b| filter.category_id.map_or(true, |id| b.category_id == Some(id)))
            .filter(|b| filter.city_id.map_or(true, |id| b.city_id == Some(id)))
            .filter(|b| !filter.verified_only || b.is_verified)
            .filter(|b| Self::matches(Some(&b.name), &filter.query))
            .take(filter.limit.get() as usize)
            .cloned()
            .collect())
    }

    async fn find_business(&self, id: Uuid) -> AppResult<Option<Business>> {
        if self.failures().catalog {
            return Err(injected("business"));
        }
        Ok(self
            .tables
            .lock()
            .unwrap()
            .businesses
            .iter()
            .find(|b| b.id == id)
            .cloned())
    }

    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        if self.failures().catalog {
            return Err(injected("categories"));
        }
        Ok(self.tables.lock().unwrap().categories.clone())
    }

    async fn find_category_by_slug(&self, slug: &str) -> AppResult<Option<Category>> {
        if self.failures().catalog {
            return Err(injected("category"));
        }
        Ok(self
            .tables
            .lock()
            .unwrap()
            .categories
            .iter()
            .find(|c| c.slug == slug)
            .cloned())
    }

    async fn list_cities(&self) -> AppResult<Vec<City>> {
        if self.failures().catalog {
            return Err(injected("cities"));
        }
        Ok(self.tables.lock().unwrap().cities.clone())
    }

    async fn find_city_by_slug(&self, slug: &str) -> AppResult<Option<City>> {
        if self.failures().catalog {
            return Err(injected("city"));
        }
        Ok(self
            .tables
            .lock()
            .unwrap()
            .cities
            .iter()
            .find(|c| c.slug == slug)
            .cloned())
    }

    async fn ping(&self) -> AppResult<()> {
        if self.failures().catalog {
            return Err(injected("ping"));
        }
        Ok(())
    }
}

/// Auth provider fake that issues real signed tokens
#[derive(Default)]
pub struct FakeAuthProvider {
    identities: Mutex<Vec<(Uuid, String, String)>>,
    deleted: Mutex<Vec<Uuid>>,
    pub sign_up_calls: AtomicUsize,
    pub fail_delete: AtomicBool,
}

impl FakeAuthProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn identity_count(&self) -> usize {
        self.identities.lock().unwrap().len()
    }

    pub fn deleted(&self) -> Vec<Uuid> {
        self.deleted.lock().unwrap().clone()
    }
}

/// Access token the fake provider (and the session middleware) accepts
pub fn mint_token(user_id: Uuid) -> String {
    let claims = AccessClaims {
        sub: user_id.to_string(),
        email: Some(format!("{}@example.com", user_id.simple())),
        exp: Utc::now().timestamp() + 3600,
        aud: Some("authenticated".to_string()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

#[async_trait]
impl AuthProvider for FakeAuthProvider {
    async fn get_session(&self, access_token: &str) -> AppResult<Option<Session>> {
        Ok(verify_access_token(access_token, JWT_SECRET))
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> AppResult<Session> {
        let identities = self.identities.lock().unwrap();
        let (id, email, _) = identities
            .iter()
            .find(|(_, e, p)| e == email && p == password)
            .ok_or_else(|| AppError::AuthProvider("Invalid login credentials".to_string()))?;
        Ok(Session {
            user_id: *id,
            email: Some(email.clone()),
            access_token: mint_token(*id),
            expires_at: Utc::now().timestamp() + 3600,
        })
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        _metadata: &SignUpMetadata,
    ) -> AppResult<AuthIdentity> {
        self.sign_up_calls.fetch_add(1, Ordering::SeqCst);
        let mut identities = self.identities.lock().unwrap();
        if identities.iter().any(|(_, e, _)| e == email) {
            return Err(AppError::AuthProvider("User already registered".to_string()));
        }
        let id = Uuid::new_v4();
        identities.push((id, email.to_string(), password.to_string()));
        Ok(AuthIdentity {
            id,
            email: Some(email.to_string()),
        })
    }

    async fn delete_user(&self, user_id: Uuid) -> AppResult<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(AppError::AuthProviderUnavailable("injected delete failure".to_string()));
        }
        self.identities.lock().unwrap().retain(|(id, _, _)| *id != user_id);
        self.deleted.lock().unwrap().push(user_id);
        Ok(())
    }
}

pub fn test_config() -> Config {
    Config {
        environment: "test".to_string(),
        server: ServerConfig::default(),
        database: DatabaseConfig {
            url: "postgres://localhost/marketplace_test".to_string(),
            max_connections: 1,
            min_connections: 0,
        },
        auth: AuthConfig {
            provider_url: "http://auth.invalid".to_string(),
            anon_key: "anon".to_string(),
            service_role_key: "service".to_string(),
            jwt_secret: JWT_SECRET.to_string(),
            session_cookie: "access_token".to_string(),
        },
        site: SiteConfig::default(),
    }
}

pub fn test_state(store: Arc<InMemoryStore>, auth: Arc<FakeAuthProvider>) -> AppState {
    AppState {
        conversations: store.clone(),
        profiles: store.clone(),
        catalog: store,
        auth,
        config: Arc::new(test_config()),
    }
}

pub fn business(name: &str) -> Business {
    Business {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: None,
        is_verified: false,
        address: None,
        city_id: None,
        city_name: None,
        category_id: None,
        category_name: None,
        business_type: None,
        logo_url: None,
        created_at: Utc::now(),
    }
}

pub fn product(business: &Business, name: &str, images: Vec<ProductImage>) -> ProductListing {
    ProductListing {
        product: Product {
            id: Uuid::new_v4(),
            business_id: business.id,
            name: name.to_string(),
            description: None,
            price: None,
            unit: Some("piece".to_string()),
            moq: Some(100),
            is_active: true,
            category_id: None,
            created_at: Utc::now(),
        },
        business_name: business.name.clone(),
        business_verified: business.is_verified,
        city_name: business.city_name.clone(),
        address: business.address.clone(),
        images,
    }
}
