use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::types::Json;

use crate::{
    error::{AppError, Result},
    models::{MAX_MONEY, Pagination},
};

const MAX_NAME_LENGTH: usize = 200;
const MAX_DESCRIPTION_LENGTH: usize = 2000;
const MAX_BRAND_LENGTH: usize = 100;
const MAX_SEO_TITLE_LENGTH: usize = 200;
const MAX_RATING: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

pub const DEFAULT_PUBLIC_PAGE_SIZE: i64 = 12;
pub const DEFAULT_ADMIN_PAGE_SIZE: i64 = 10;
pub const DEFAULT_SHOWCASE_SIZE: i64 = 8;
const MAX_SHOWCASE_SIZE: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "product_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    Face,
    Body,
    Hair,
    Makeup,
    Fragrance,
    Skincare,
}

impl FromStr for ProductCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "face" => Ok(ProductCategory::Face),
            "body" => Ok(ProductCategory::Body),
            "hair" => Ok(ProductCategory::Hair),
            "makeup" => Ok(ProductCategory::Makeup),
            "fragrance" => Ok(ProductCategory::Fragrance),
            "skincare" => Ok(ProductCategory::Skincare),
            other => Err(AppError::BadRequest(format!("Unknown category: {}", other))),
        }
    }
}

/// Soft-delete state. Hidden products stay in the store but never reach the
/// public catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "product_visibility", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProductVisibility {
    Active,
    Hidden,
}

impl FromStr for ProductVisibility {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(ProductVisibility::Active),
            "hidden" => Ok(ProductVisibility::Hidden),
            other => Err(AppError::BadRequest(format!("Unknown visibility: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductImage {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// Images arrive either as a bare URL or as `{url, alt}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ImageInput {
    Url(String),
    Detailed { url: String, alt: Option<String> },
}

impl From<ImageInput> for ProductImage {
    fn from(input: ImageInput) -> Self {
        match input {
            ImageInput::Url(url) => ProductImage {
                url: url.trim().to_string(),
                alt: None,
            },
            ImageInput::Detailed { url, alt } => ProductImage {
                url: url.trim().to_string(),
                alt: alt.filter(|a| !a.trim().is_empty()),
            },
        }
    }
}

/// Everything an admin can edit on a product.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ProductFields {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub category: ProductCategory,
    pub brand: String,
    pub stock: i32,
    pub images: Json<Vec<ProductImage>>,
    pub ingredients: Vec<String>,
    pub benefits: Vec<String>,
    pub how_to_use: Option<String>,
    pub rating: Decimal,
    pub num_reviews: i32,
    pub featured: bool,
    pub visibility: ProductVisibility,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub seo_keywords: Vec<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Product {
    pub id: i32,
    pub slug: String,
    #[sqlx(flatten)]
    pub fields: ProductFields,
    pub created_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn is_public(&self) -> bool {
        self.fields.visibility == ProductVisibility::Active && self.fields.stock > 0
    }

    pub fn primary_image(&self) -> Option<&str> {
        self.fields.images.0.first().map(|img| img.url.as_str())
    }
}

impl ProductFields {
    /// Starting point for `POST /products/admin`: hidden until an admin
    /// fills it in.
    pub fn placeholder() -> Self {
        Self {
            name: "Sample product".to_string(),
            description: "Sample description".to_string(),
            price: Decimal::ZERO,
            compare_at_price: None,
            category: ProductCategory::Skincare,
            brand: "Sample brand".to_string(),
            stock: 0,
            images: Json(Vec::new()),
            ingredients: Vec::new(),
            benefits: Vec::new(),
            how_to_use: None,
            rating: Decimal::ZERO,
            num_reviews: 0,
            featured: false,
            visibility: ProductVisibility::Hidden,
            seo_title: None,
            seo_description: None,
            seo_keywords: Vec::new(),
        }
    }

    /// Merges a partial update and re-validates the whole record. Returns
    /// whether the name changed, in which case the slug must follow.
    pub fn apply(&mut self, input: ProductInput) -> Result<bool> {
        let stock = input.resolved_stock()?;
        let visibility = input.resolved_visibility()?;

        let mut name_changed = false;
        if let Some(name) = input.name {
            let name = name.trim().to_string();
            name_changed = name != self.name;
            self.name = name;
        }
        if let Some(description) = input.description {
            self.description = description.trim().to_string();
        }
        if let Some(price) = input.price {
            self.price = price.round_dp(2);
        }
        if let Some(compare_at_price) = input.compare_at_price {
            self.compare_at_price = compare_at_price.map(|p| p.round_dp(2));
        }
        if let Some(category) = input.category {
            self.category = category.parse()?;
        }
        if let Some(brand) = input.brand {
            self.brand = brand.trim().to_string();
        }
        if let Some(stock) = stock {
            self.stock = i32::try_from(stock)
                .map_err(|_| AppError::BadRequest("Stock is out of range".to_string()))?;
        }
        if let Some(images) = input.images {
            self.images = Json(images.into_iter().map(ProductImage::from).collect());
        }
        if let Some(ingredients) = input.ingredients {
            self.ingredients = clean_list(ingredients);
        }
        if let Some(benefits) = input.benefits {
            self.benefits = clean_list(benefits);
        }
        if let Some(how_to_use) = input.how_to_use {
            self.how_to_use = non_blank(how_to_use);
        }
        if let Some(rating) = input.rating {
            self.rating = rating.round_dp(2);
        }
        if let Some(num_reviews) = input.num_reviews {
            self.num_reviews = i32::try_from(num_reviews).map_err(|_| {
                AppError::BadRequest("Review count is out of range".to_string())
            })?;
        }
        if let Some(featured) = input.featured {
            self.featured = featured;
        }
        if let Some(visibility) = visibility {
            self.visibility = visibility;
        }
        if let Some(seo_title) = input.seo_title {
            self.seo_title = non_blank(seo_title);
        }
        if let Some(seo_description) = input.seo_description {
            self.seo_description = non_blank(seo_description);
        }
        if let Some(seo_keywords) = input.seo_keywords {
            self.seo_keywords = clean_list(seo_keywords);
        }

        self.validate()?;
        Ok(name_changed)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(AppError::BadRequest("Product name is required".to_string()));
        }
        if self.name.chars().count() > MAX_NAME_LENGTH {
            return Err(AppError::BadRequest(
                "Product name must not exceed 200 characters".to_string(),
            ));
        }
        if self.description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(AppError::BadRequest(
                "Description must not exceed 2000 characters".to_string(),
            ));
        }
        if self.brand.is_empty() {
            return Err(AppError::BadRequest("Brand is required".to_string()));
        }
        if self.brand.chars().count() > MAX_BRAND_LENGTH {
            return Err(AppError::BadRequest(
                "Brand must not exceed 100 characters".to_string(),
            ));
        }
        if self
            .seo_title
            .as_ref()
            .is_some_and(|t| t.chars().count() > MAX_SEO_TITLE_LENGTH)
        {
            return Err(AppError::BadRequest(
                "SEO title must not exceed 200 characters".to_string(),
            ));
        }
        if self.price.is_sign_negative() {
            return Err(AppError::BadRequest("Price cannot be negative".to_string()));
        }
        if self.price > MAX_MONEY {
            return Err(AppError::BadRequest("Price is too large".to_string()));
        }
        if self.compare_at_price.is_some_and(|p| p.is_sign_negative()) {
            return Err(AppError::BadRequest(
                "Compare-at price cannot be negative".to_string(),
            ));
        }
        if self.compare_at_price.is_some_and(|p| p > MAX_MONEY) {
            return Err(AppError::BadRequest(
                "Compare-at price is too large".to_string(),
            ));
        }
        if self.stock < 0 {
            return Err(AppError::BadRequest("Stock cannot be negative".to_string()));
        }
        if self.rating.is_sign_negative() || self.rating > MAX_RATING {
            return Err(AppError::BadRequest(
                "Rating must be between 0 and 5".to_string(),
            ));
        }
        if self.num_reviews < 0 {
            return Err(AppError::BadRequest(
                "Review count cannot be negative".to_string(),
            ));
        }
        if self.images.0.iter().any(|img| img.url.is_empty()) {
            return Err(AppError::BadRequest(
                "Invalid image: expected a URL or {url, alt}".to_string(),
            ));
        }
        Ok(())
    }
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Lets a JSON `null` clear a field while an absent key leaves it alone.
fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "nullable")]
    pub compare_at_price: Option<Option<Decimal>>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub stock: Option<i64>,
    pub count_in_stock: Option<i64>,
    pub images: Option<Vec<ImageInput>>,
    pub ingredients: Option<Vec<String>>,
    pub benefits: Option<Vec<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub how_to_use: Option<Option<String>>,
    pub rating: Option<Decimal>,
    pub num_reviews: Option<i64>,
    pub featured: Option<bool>,
    pub visibility: Option<String>,
    pub is_active: Option<bool>,
    pub is_deleted: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub seo_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub seo_description: Option<Option<String>>,
    pub seo_keywords: Option<Vec<String>>,
}

impl ProductInput {
    /// `stock` and `countInStock` name the same quantity.
    fn resolved_stock(&self) -> Result<Option<i64>> {
        let stock = match (self.stock, self.count_in_stock) {
            (Some(a), Some(b)) if a != b => {
                return Err(AppError::BadRequest(
                    "stock and countInStock disagree".to_string(),
                ));
            }
            (Some(value), _) | (None, Some(value)) => Some(value),
            (None, None) => None,
        };

        if stock.is_some_and(|s| s < 0) {
            return Err(AppError::BadRequest("Stock cannot be negative".to_string()));
        }

        Ok(stock)
    }

    /// Folds `visibility`, `isActive` and `isDeleted` into one answer.
    fn resolved_visibility(&self) -> Result<Option<ProductVisibility>> {
        let mut candidates = Vec::with_capacity(3);

        if let Some(ref visibility) = self.visibility {
            candidates.push(visibility.parse::<ProductVisibility>()?);
        }
        if let Some(is_active) = self.is_active {
            candidates.push(if is_active {
                ProductVisibility::Active
            } else {
                ProductVisibility::Hidden
            });
        }
        if let Some(is_deleted) = self.is_deleted {
            candidates.push(if is_deleted {
                ProductVisibility::Hidden
            } else {
                ProductVisibility::Active
            });
        }

        match candidates.split_first() {
            None => Ok(None),
            Some((first, rest)) if rest.iter().all(|v| v == first) => Ok(Some(*first)),
            Some(_) => Err(AppError::BadRequest(
                "Conflicting visibility flags".to_string(),
            )),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<Decimal>,
    pub category: ProductCategory,
    pub brand: String,
    pub stock: i32,
    pub count_in_stock: i32,
    pub images: Vec<ProductImage>,
    pub ingredients: Vec<String>,
    pub benefits: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub how_to_use: Option<String>,
    pub rating: Decimal,
    pub num_reviews: i32,
    pub featured: bool,
    pub visibility: ProductVisibility,
    pub is_active: bool,
    pub is_deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seo_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seo_description: Option<String>,
    pub seo_keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        let f = product.fields;
        let is_active = f.visibility == ProductVisibility::Active;

        Self {
            id: product.id,
            name: f.name,
            slug: product.slug,
            description: f.description,
            price: f.price,
            compare_at_price: f.compare_at_price,
            category: f.category,
            brand: f.brand,
            stock: f.stock,
            count_in_stock: f.stock,
            images: f.images.0,
            ingredients: f.ingredients,
            benefits: f.benefits,
            how_to_use: f.how_to_use,
            rating: f.rating,
            num_reviews: f.num_reviews,
            featured: f.featured,
            visibility: f.visibility,
            is_active,
            is_deleted: !is_active,
            seo_title: f.seo_title,
            seo_description: f.seo_description,
            seo_keywords: f.seo_keywords,
            created_by: product.created_by,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct BestSellerRow {
    #[sqlx(flatten)]
    pub product: Product,
    pub total_sold: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BestSellerResponse {
    #[serde(flatten)]
    pub product: ProductResponse,
    pub total_sold: i64,
}

impl From<BestSellerRow> for BestSellerResponse {
    fn from(row: BestSellerRow) -> Self {
        Self {
            product: row.product.into(),
            total_sold: row.total_sold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

impl ProductSort {
    /// Unknown values fall back to newest first.
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("price_asc") => ProductSort::PriceAsc,
            Some("price_desc") => ProductSort::PriceDesc,
            Some("name") => ProductSort::Name,
            _ => ProductSort::Newest,
        }
    }

    pub fn order_by(self) -> &'static str {
        match self {
            ProductSort::Newest => " ORDER BY created_at DESC, id DESC",
            ProductSort::PriceAsc => " ORDER BY price ASC, id ASC",
            ProductSort::PriceDesc => " ORDER BY price DESC, id ASC",
            ProductSort::Name => " ORDER BY name ASC, id ASC",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: Option<ProductCategory>,
    pub brand: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: ProductSort,
}

impl ProductQuery {
    pub fn into_filter(self) -> Result<(ProductFilter, Pagination)> {
        let pagination = Pagination::new(self.page, self.limit, DEFAULT_PUBLIC_PAGE_SIZE);
        let filter = ProductFilter {
            category: non_empty(self.category)
                .map(|c| c.parse())
                .transpose()?,
            brand: non_empty(self.brand),
            search: non_empty(self.search),
            min_price: self.min_price,
            max_price: self.max_price,
            sort: ProductSort::from_query(self.sort.as_deref()),
        };
        Ok((filter, pagination))
    }
}

#[derive(Debug, Deserialize)]
pub struct AdminProductQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub active: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisibilityFilter {
    #[default]
    All,
    Only(ProductVisibility),
}

#[derive(Debug, Clone, Default)]
pub struct AdminProductFilter {
    pub visibility: VisibilityFilter,
    pub search: Option<String>,
}

impl AdminProductQuery {
    pub fn into_filter(self) -> Result<(AdminProductFilter, Pagination)> {
        let pagination = Pagination::new(self.page, self.limit, DEFAULT_ADMIN_PAGE_SIZE);
        let visibility = match non_empty(self.active).as_deref() {
            None | Some("all") => VisibilityFilter::All,
            Some("true") => VisibilityFilter::Only(ProductVisibility::Active),
            Some("false") => VisibilityFilter::Only(ProductVisibility::Hidden),
            Some(other) => {
                return Err(AppError::BadRequest(format!(
                    "Invalid active filter: {} (expected true, false or all)",
                    other
                )));
            }
        };
        Ok((
            AdminProductFilter {
                visibility,
                search: non_empty(self.search),
            },
            pagination,
        ))
    }
}

#[derive(Debug, Deserialize)]
pub struct ShowcaseQuery {
    pub limit: Option<i64>,
}

impl ShowcaseQuery {
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_SHOWCASE_SIZE)
            .clamp(1, MAX_SHOWCASE_SIZE)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
