//! Business and membership models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ProductCard;
use crate::types::{display_location, PLACEHOLDER_IMAGE};

/// A seller-side organisation on the marketplace
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Business {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_verified: bool,
    pub address: Option<String>,
    pub city_id: Option<Uuid>,
    pub city_name: Option<String>,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub business_type: Option<String>,
    pub logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Link between a user and a business they belong to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BusinessMember {
    pub business_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
}

/// Business listing card
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BusinessCard {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_verified: bool,
    pub logo_url: String,
    pub location: String,
    pub category: Option<String>,
    pub business_type: Option<String>,
}

impl From<Business> for BusinessCard {
    fn from(b: Business) -> Self {
        Self {
            location: display_location(b.city_name.as_deref(), b.address.as_deref()),
            logo_url: b.logo_url.unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
            id: b.id,
            name: b.name,
            description: b.description,
            is_verified: b.is_verified,
            category: b.category_name,
            business_type: b.business_type,
        }
    }
}

/// Business page: card plus its active products
#[derive(Debug, Clone, Serialize)]
pub struct BusinessDetail {
    #[serde(flatten)]
    pub business: BusinessCard,
    pub products: Vec<ProductCard>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LOCATION_NOT_SPECIFIED;

    fn business() -> Business {
        Business {
            id: Uuid::new_v4(),
            name: "Shakti Textiles".to_string(),
            description: None,
            is_verified: true,
            address: None,
            city_id: None,
            city_name: None,
            category_id: None,
            category_name: None,
            business_type: Some("manufacturer".to_string()),
            logo_url: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_card_applies_presentation_defaults() {
        let card = BusinessCard::from(business());
        assert_eq!(card.logo_url, PLACEHOLDER_IMAGE);
        assert_eq!(card.location, LOCATION_NOT_SPECIFIED);
    }

    #[test]
    fn test_card_keeps_real_values() {
        let mut b = business();
        b.logo_url = Some("https://cdn.example.com/logo.png".to_string());
        b.city_name = Some("Surat".to_string());
        let card = BusinessCard::from(b);
        assert_eq!(card.logo_url, "https://cdn.example.com/logo.png");
        assert_eq!(card.location, "Surat");
    }
}
