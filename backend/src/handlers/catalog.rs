//! Catalog handlers: products, businesses, categories, cities, search
//!
//! Store failures never reach these handlers as errors; the catalog service
//! hands back empty lists, and missing records become 404s.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::{BusinessCard, BusinessDetail, Category, City, ListLimit, ProductCard, ProductDetail};

use crate::error::AppError;
use crate::repositories::{BusinessFilter, ProductFilter};
use crate::services::SearchResults;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub category_id: Option<Uuid>,
    pub city_id: Option<Uuid>,
    pub business_id: Option<Uuid>,
    pub q: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BusinessQuery {
    pub category_id: Option<Uuid>,
    pub city_id: Option<Uuid>,
    #[serde(default)]
    pub verified: bool,
    pub q: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<u32>,
}

#[derive(Serialize)]
pub struct ProductsResponse {
    pub products: Vec<ProductCard>,
}

#[derive(Serialize)]
pub struct BusinessesResponse {
    pub businesses: Vec<BusinessCard>,
}

#[derive(Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<Category>,
}

#[derive(Serialize)]
pub struct CitiesResponse {
    pub cities: Vec<City>,
}

/// Category page: the category and its products
#[derive(Serialize)]
pub struct CategoryPage {
    pub category: Category,
    pub products: Vec<ProductCard>,
}

/// City page: the city and businesses located there
#[derive(Serialize)]
pub struct CityPage {
    pub city: City,
    pub businesses: Vec<BusinessCard>,
}

fn non_blank(q: Option<String>) -> Option<String> {
    q.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Json<ProductsResponse> {
    let filter = ProductFilter {
        category_id: query.category_id,
        city_id: query.city_id,
        business_id: query.business_id,
        query: non_blank(query.q),
        limit: ListLimit::new(query.limit),
    };
    let products = state.catalog_service().list_products(&filter).await;
    Json(ProductsResponse { products })
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<ProductDetail>, AppError> {
    state
        .catalog_service()
        .get_product(product_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
}

pub async fn list_businesses(
    State(state): State<AppState>,
    Query(query): Query<BusinessQuery>,
) -> Json<BusinessesResponse> {
    let filter = BusinessFilter {
        category_id: query.category_id,
        city_id: query.city_id,
        verified_only: query.verified,
        query: non_blank(query.q),
        limit: ListLimit::new(query.limit),
    };
    let businesses = state.catalog_service().list_businesses(&filter).await;
    Json(BusinessesResponse { businesses })
}

pub async fn get_business(
    State(state): State<AppState>,
    Path(business_id): Path<Uuid>,
) -> Result<Json<BusinessDetail>, AppError> {
    state
        .catalog_service()
        .get_business(business_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Business".to_string()))
}

pub async fn list_categories(State(state): State<AppState>) -> Json<CategoriesResponse> {
    let categories = state.catalog_service().categories().await;
    Json(CategoriesResponse { categories })
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryPage>, AppError> {
    let service = state.catalog_service();
    let category = service
        .category_by_slug(&slug)
        .await
        .ok_or_else(|| AppError::NotFound("Category".to_string()))?;

    let products = service
        .list_products(&ProductFilter {
            category_id: Some(category.id),
            ..Default::default()
        })
        .await;

    Ok(Json(CategoryPage { category, products }))
}

pub async fn list_cities(State(state): State<AppState>) -> Json<CitiesResponse> {
    let cities = state.catalog_service().cities().await;
    Json(CitiesResponse { cities })
}

pub async fn get_city(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CityPage>, AppError> {
    let service = state.catalog_service();
    let city = service
        .city_by_slug(&slug)
        .await
        .ok_or_else(|| AppError::NotFound("City".to_string()))?;

    let businesses = service
        .list_businesses(&BusinessFilter {
            city_id: Some(city.id),
            ..Default::default()
        })
        .await;

    Ok(Json(CityPage { city, businesses }))
}

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<SearchResults> {
    let results = state
        .catalog_service()
        .search(&query.q, ListLimit::new(query.limit))
        .await;
    Json(results)
}
