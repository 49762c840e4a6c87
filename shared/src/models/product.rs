//! Product and product image models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{coerce_price, display_location, PLACEHOLDER_IMAGE};

/// A product listed by exactly one business
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub unit: Option<String>,
    /// Minimum order quantity
    pub moq: Option<i32>,
    pub is_active: bool,
    pub category_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductImage {
    pub id: Uuid,
    pub product_id: Uuid,
    pub url: String,
    pub is_primary: bool,
    pub display_order: Option<i32>,
}

/// Order images for display: primary first, then by `display_order`,
/// images without an order last. Ties keep their input order.
pub fn sort_product_images(images: &mut [ProductImage]) {
    images.sort_by_key(|img| (!img.is_primary, img.display_order.is_none(), img.display_order));
}

/// Product with the business and city it is listed under, as read from the store
#[derive(Debug, Clone, PartialEq)]
pub struct ProductListing {
    pub product: Product,
    pub business_name: String,
    pub business_verified: bool,
    pub city_name: Option<String>,
    pub address: Option<String>,
    pub images: Vec<ProductImage>,
}

/// Product listing card
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProductCard {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub price: f64,
    pub unit: Option<String>,
    pub moq: Option<i32>,
    pub image_url: String,
    pub business_name: String,
    pub business_verified: bool,
    pub location: String,
}

impl From<ProductListing> for ProductCard {
    fn from(mut listing: ProductListing) -> Self {
        sort_product_images(&mut listing.images);
        let image_url = listing
            .images
            .into_iter()
            .next()
            .map(|img| img.url)
            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());

        Self {
            id: listing.product.id,
            business_id: listing.product.business_id,
            name: listing.product.name,
            price: coerce_price(listing.product.price),
            unit: listing.product.unit,
            moq: listing.product.moq,
            image_url,
            business_name: listing.business_name,
            business_verified: listing.business_verified,
            location: display_location(listing.city_name.as_deref(), listing.address.as_deref()),
        }
    }
}

/// Product page view model
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProductDetail {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub unit: Option<String>,
    pub moq: Option<i32>,
    pub images: Vec<String>,
    pub business_name: String,
    pub business_verified: bool,
    pub location: String,
}

impl From<ProductListing> for ProductDetail {
    fn from(mut listing: ProductListing) -> Self {
        sort_product_images(&mut listing.images);
        let mut images: Vec<String> = listing.images.into_iter().map(|img| img.url).collect();
        if images.is_empty() {
            images.push(PLACEHOLDER_IMAGE.to_string());
        }

        Self {
            id: listing.product.id,
            business_id: listing.product.business_id,
            name: listing.product.name,
            description: listing.product.description,
            price: coerce_price(listing.product.price),
            unit: listing.product.unit,
            moq: listing.product.moq,
            images,
            business_name: listing.business_name,
            business_verified: listing.business_verified,
            location: display_location(listing.city_name.as_deref(), listing.address.as_deref()),
        }
    }
}
