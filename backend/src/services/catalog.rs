//! Catalog read paths: products, businesses, categories, cities, search
//!
//! Every method degrades instead of failing: a store error is logged and
//! the caller gets an empty list or `None`, so pages still render.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use shared::{
    BusinessCard, BusinessDetail, Category, City, ListLimit, ProductCard, ProductDetail,
};

use crate::error::AppResult;
use crate::repositories::{BusinessFilter, CatalogStore, ProductFilter};

/// Catalog service
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
}

/// Search results across products and businesses
#[derive(Debug, Clone, Serialize, Default)]
pub struct SearchResults {
    pub query: String,
    pub products: Vec<ProductCard>,
    pub businesses: Vec<BusinessCard>,
}

fn or_default<T: Default>(result: AppResult<T>, what: &str) -> T {
    result.unwrap_or_else(|e| {
        tracing::error!("Failed to load {}: {}", what, e);
        T::default()
    })
}

impl CatalogService {
    /// Create a new CatalogService instance
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub async fn list_products(&self, filter: &ProductFilter) -> Vec<ProductCard> {
        or_default(self.store.list_products(filter).await, "products")
            .into_iter()
            .map(ProductCard::from)
            .collect()
    }

    /// Product page; inactive products are treated as missing
    pub async fn get_product(&self, product_id: Uuid) -> Option<ProductDetail> {
        or_default(self.store.find_product(product_id).await, "product")
            .filter(|listing| listing.product.is_active)
            .map(ProductDetail::from)
    }

    pub async fn list_businesses(&self, filter: &BusinessFilter) -> Vec<BusinessCard> {
        or_default(self.store.list_businesses(filter).await, "businesses")
            .into_iter()
            .map(BusinessCard::from)
            .collect()
    }

    /// Business page with its active products
    pub async fn get_business(&self, business_id: Uuid) -> Option<BusinessDetail> {
        let business = or_default(self.store.find_business(business_id).await, "business")?;

        let products = self
            .list_products(&ProductFilter {
                business_id: Some(business_id),
                limit: ListLimit::new(Some(ListLimit::MAX)),
                ..Default::default()
            })
            .await;

        Some(BusinessDetail {
            business: business.into(),
            products,
        })
    }

    pub async fn categories(&self) -> Vec<Category> {
        or_default(self.store.list_categories().await, "categories")
    }

    pub async fn category_by_slug(&self, slug: &str) -> Option<Category> {
        or_default(self.store.find_category_by_slug(slug).await, "category")
    }

    pub async fn cities(&self) -> Vec<City> {
        or_default(self.store.list_cities().await, "cities")
    }

    pub async fn city_by_slug(&self, slug: &str) -> Option<City> {
        or_default(self.store.find_city_by_slug(slug).await, "city")
    }

    /// Case-insensitive search over product and business names. A blank
    /// query returns nothing.
    pub async fn search(&self, query: &str, limit: ListLimit) -> SearchResults {
        let query = query.trim();
        if query.is_empty() {
            return SearchResults::default();
        }

        let product_filter = ProductFilter {
            query: Some(query.to_string()),
            limit,
            ..Default::default()
        };
        let business_filter = BusinessFilter {
            query: Some(query.to_string()),
            limit,
            ..Default::default()
        };

        let (products, businesses) = tokio::join!(
            self.list_products(&product_filter),
            self.list_businesses(&business_filter),
        );

        SearchResults {
            query: query.to_string(),
            products,
            businesses,
        }
    }
}
