use axum::{Extension, Json, extract::State, http::StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;

use crate::{
    AppState,
    error::{AppError, Result},
    models::{
        AdminProductQuery, ApiResponse, BestSellerResponse, PageResponse, ProductFields,
        ProductInput, ProductQuery, ProductResponse, ShowcaseQuery,
    },
    queries::{admin_queries, product_queries},
    utils::{
        extractors::{JsonBody, OptionalJsonBody, PathParam, QueryParams, extract_user_id},
        jwt::Claims,
        slug,
    },
};

pub async fn list_products(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<ProductQuery>,
) -> Result<Json<PageResponse<ProductResponse>>> {
    let (filter, pagination) = params.into_filter()?;

    let (products, total) = product_queries::search_products(&state.db, &filter, pagination).await?;

    Ok(Json(PageResponse::new(
        products.into_iter().map(ProductResponse::from).collect(),
        total,
        pagination,
    )))
}

pub async fn get_product_by_slug(
    State(state): State<AppState>,
    PathParam(slug): PathParam<String>,
) -> Result<Json<ApiResponse<ProductResponse>>> {
    let product = product_queries::find_active_by_slug(&state.db, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    Ok(Json(ApiResponse::new(product.into())))
}

pub async fn list_featured(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<ShowcaseQuery>,
) -> Result<Json<ApiResponse<Vec<ProductResponse>>>> {
    let products = product_queries::find_featured(&state.db, params.limit()).await?;

    Ok(Json(ApiResponse::new(
        products.into_iter().map(ProductResponse::from).collect(),
    )))
}

pub async fn list_best_sellers(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<ShowcaseQuery>,
) -> Result<Json<ApiResponse<Vec<BestSellerResponse>>>> {
    let rows = product_queries::find_best_sellers(&state.db, params.limit()).await?;

    Ok(Json(ApiResponse::new(
        rows.into_iter().map(BestSellerResponse::from).collect(),
    )))
}

pub async fn list_admin_products(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<AdminProductQuery>,
) -> Result<Json<PageResponse<ProductResponse>>> {
    let (filter, pagination) = params.into_filter()?;

    let (products, total) = admin_queries::search_products(&state.db, &filter, pagination).await?;

    Ok(Json(PageResponse::new(
        products.into_iter().map(ProductResponse::from).collect(),
        total,
        pagination,
    )))
}

pub async fn get_admin_product(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<Json<ApiResponse<ProductResponse>>> {
    let product = product_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    Ok(Json(ApiResponse::new(product.into())))
}

pub async fn create_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    OptionalJsonBody(input): OptionalJsonBody<ProductInput>,
) -> Result<(StatusCode, Json<ApiResponse<ProductResponse>>)> {
    let admin_id = extract_user_id(&claims)?;

    let mut fields = ProductFields::placeholder();
    fields.apply(input)?;

    let slug = unique_slug(&state.db, &fields.name, None).await?;
    let product = admin_queries::create_product(&state.db, &slug, &fields, admin_id).await?;

    tracing::info!("Admin {} created product {} ({})", admin_id, product.id, product.slug);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(product.into()).with_message("Product created")),
    ))
}

pub async fn update_product(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(input): JsonBody<ProductInput>,
) -> Result<Json<ApiResponse<ProductResponse>>> {
    let existing = product_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let mut fields = existing.fields;
    let name_changed = fields.apply(input)?;

    let slug = if name_changed {
        unique_slug(&state.db, &fields.name, Some(id)).await?
    } else {
        existing.slug
    };

    let product = admin_queries::update_product(&state.db, id, &slug, &fields)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    Ok(Json(
        ApiResponse::new(product.into()).with_message("Product updated"),
    ))
}

pub async fn delete_product(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<Json<Value>> {
    let deleted = admin_queries::delete_product(&state.db, id).await?;

    if deleted == 0 {
        return Err(AppError::NotFound("Product not found".to_string()));
    }

    tracing::info!("Deleted product {}", id);

    Ok(Json(json!({
        "success": true,
        "message": "Product deleted",
    })))
}

async fn unique_slug(pool: &PgPool, name: &str, exclude_id: Option<i32>) -> Result<String> {
    let base = slug::slugify(name);

    if product_queries::slug_taken(pool, &base, exclude_id).await? {
        Ok(slug::with_random_suffix(&base))
    } else {
        Ok(base)
    }
}
