use std::collections::HashMap;

use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::Result,
    models::{BestSellerRow, Pagination, Product, ProductFilter},
};

const PUBLIC_CONDITION: &str = " WHERE visibility = 'active' AND stock > 0";

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(product)
}

pub async fn find_by_ids(pool: &PgPool, ids: &[i32]) -> Result<HashMap<i32, Product>> {
    let products = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await?;

    Ok(products.into_iter().map(|p| (p.id, p)).collect())
}

pub async fn find_active_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE slug = $1 AND visibility = 'active'",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(product)
}

/// Whether `slug` belongs to a product other than `exclude_id`.
pub async fn slug_taken(pool: &PgPool, slug: &str, exclude_id: Option<i32>) -> Result<bool> {
    let taken = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM products WHERE slug = $1 AND ($2::int IS NULL OR id <> $2))",
    )
    .bind(slug)
    .bind(exclude_id)
    .fetch_one(pool)
    .await?;

    Ok(taken)
}

pub async fn count_all(pool: &PgPool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// `%` and `_` in user input match literally.
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len() + 2);
    escaped.push('%');
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn push_public_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    query.push(PUBLIC_CONDITION);

    if let Some(category) = filter.category {
        query.push(" AND category = ");
        query.push_bind(category);
    }

    if let Some(ref brand) = filter.brand {
        query.push(" AND LOWER(brand) = LOWER(");
        query.push_bind(brand.clone());
        query.push(")");
    }

    if let Some(ref search) = filter.search {
        let pattern = escape_like(search);
        query.push(" AND (name ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR description ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR brand ILIKE ");
        query.push_bind(pattern);
        query.push(")");
    }

    if let Some(min_price) = filter.min_price {
        query.push(" AND price >= ");
        query.push_bind(min_price);
    }

    if let Some(max_price) = filter.max_price {
        query.push(" AND price <= ");
        query.push_bind(max_price);
    }
}

/// One page of the public catalog plus the number of products matching the
/// filter across all pages.
pub async fn search_products(
    pool: &PgPool,
    filter: &ProductFilter,
    pagination: Pagination,
) -> Result<(Vec<Product>, i64)> {
    let mut count_query: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM products");
    push_public_filters(&mut count_query, filter);
    let total: i64 = count_query.build_query_scalar().fetch_one(pool).await?;

    let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM products");
    push_public_filters(&mut query, filter);
    query.push(filter.sort.order_by());
    query.push(" LIMIT ");
    query.push_bind(pagination.limit);
    query.push(" OFFSET ");
    query.push_bind(pagination.offset());

    let products = query.build_query_as::<Product>().fetch_all(pool).await?;

    Ok((products, total))
}

pub async fn find_featured(pool: &PgPool, limit: i64) -> Result<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products
         WHERE visibility = 'active' AND stock > 0 AND featured
         ORDER BY created_at DESC, id DESC
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(products)
}

/// Units sold per product, summed over every order that was not cancelled.
pub async fn find_best_sellers(pool: &PgPool, limit: i64) -> Result<Vec<BestSellerRow>> {
    let rows = sqlx::query_as::<_, BestSellerRow>(
        "SELECT p.*, sold.total_sold
         FROM (
             SELECT oi.product_id, SUM(oi.quantity)::BIGINT AS total_sold
             FROM order_items oi
             JOIN orders o ON o.id = oi.order_id
             WHERE o.status <> 'Cancelled' AND oi.product_id IS NOT NULL
             GROUP BY oi.product_id
         ) sold
         JOIN products p ON p.id = sold.product_id
         WHERE p.visibility = 'active' AND p.stock > 0 AND sold.total_sold > 0
         ORDER BY sold.total_sold DESC, p.created_at DESC, p.id DESC
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
