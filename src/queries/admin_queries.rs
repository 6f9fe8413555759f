use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::Result,
    models::{
        AdminProductFilter, AdminStats, LATEST_ORDERS_LIMIT, LatestOrder, LatestOrderRow,
        Pagination, Product, ProductFields, VisibilityFilter,
    },
    queries::{order_queries, product_queries::escape_like},
};

fn push_admin_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &AdminProductFilter) {
    query.push(" WHERE 1=1");

    if let VisibilityFilter::Only(visibility) = filter.visibility {
        query.push(" AND visibility = ");
        query.push_bind(visibility);
    }

    if let Some(ref search) = filter.search {
        query.push(" AND name ILIKE ");
        query.push_bind(escape_like(search));
    }
}

pub async fn search_products(
    pool: &PgPool,
    filter: &AdminProductFilter,
    pagination: Pagination,
) -> Result<(Vec<Product>, i64)> {
    let mut count_query: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM products");
    push_admin_filters(&mut count_query, filter);
    let total: i64 = count_query.build_query_scalar().fetch_one(pool).await?;

    let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM products");
    push_admin_filters(&mut query, filter);
    query.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    query.push_bind(pagination.limit);
    query.push(" OFFSET ");
    query.push_bind(pagination.offset());

    let products = query.build_query_as::<Product>().fetch_all(pool).await?;

    Ok((products, total))
}

pub async fn create_product(
    pool: &PgPool,
    slug: &str,
    fields: &ProductFields,
    created_by: i32,
) -> Result<Product> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (
            name, slug, description, price, compare_at_price, category, brand,
            stock, images, ingredients, benefits, how_to_use, rating, num_reviews,
            featured, visibility, seo_title, seo_description, seo_keywords, created_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
        RETURNING *
        "#,
    )
    .bind(&fields.name)
    .bind(slug)
    .bind(&fields.description)
    .bind(fields.price)
    .bind(fields.compare_at_price)
    .bind(fields.category)
    .bind(&fields.brand)
    .bind(fields.stock)
    .bind(&fields.images)
    .bind(&fields.ingredients)
    .bind(&fields.benefits)
    .bind(&fields.how_to_use)
    .bind(fields.rating)
    .bind(fields.num_reviews)
    .bind(fields.featured)
    .bind(fields.visibility)
    .bind(&fields.seo_title)
    .bind(&fields.seo_description)
    .bind(&fields.seo_keywords)
    .bind(created_by)
    .fetch_one(pool)
    .await?;

    Ok(product)
}

/// Writes the full merged record; the caller has already validated it.
pub async fn update_product(
    pool: &PgPool,
    id: i32,
    slug: &str,
    fields: &ProductFields,
) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET
            name = $1,
            slug = $2,
            description = $3,
            price = $4,
            compare_at_price = $5,
            category = $6,
            brand = $7,
            stock = $8,
            images = $9,
            ingredients = $10,
            benefits = $11,
            how_to_use = $12,
            rating = $13,
            num_reviews = $14,
            featured = $15,
            visibility = $16,
            seo_title = $17,
            seo_description = $18,
            seo_keywords = $19,
            updated_at = NOW()
        WHERE id = $20
        RETURNING *
        "#,
    )
    .bind(&fields.name)
    .bind(slug)
    .bind(&fields.description)
    .bind(fields.price)
    .bind(fields.compare_at_price)
    .bind(fields.category)
    .bind(&fields.brand)
    .bind(fields.stock)
    .bind(&fields.images)
    .bind(&fields.ingredients)
    .bind(&fields.benefits)
    .bind(&fields.how_to_use)
    .bind(fields.rating)
    .bind(fields.num_reviews)
    .bind(fields.featured)
    .bind(fields.visibility)
    .bind(&fields.seo_title)
    .bind(&fields.seo_description)
    .bind(&fields.seo_keywords)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(product)
}

pub async fn delete_product(pool: &PgPool, id: i32) -> Result<u64> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

async fn count(pool: &PgPool, sql: &'static str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(sql).fetch_one(pool).await?;
    Ok(count)
}

pub async fn get_stats(pool: &PgPool) -> Result<AdminStats> {
    let (users, products, orders, revenue) = tokio::try_join!(
        count(pool, "SELECT COUNT(*) FROM users"),
        count(
            pool,
            "SELECT COUNT(*) FROM products WHERE visibility = 'active'"
        ),
        count(pool, "SELECT COUNT(*) FROM orders"),
        order_queries::total_revenue(pool),
    )?;

    Ok(AdminStats {
        users,
        products,
        orders,
        revenue,
    })
}

pub async fn latest_orders(pool: &PgPool) -> Result<Vec<LatestOrder>> {
    let rows = sqlx::query_as::<_, LatestOrderRow>(
        "SELECT o.id, o.order_number, u.name AS customer_name, o.total_price, o.status, o.created_at
         FROM orders o
         LEFT JOIN users u ON u.id = o.user_id
         ORDER BY o.created_at DESC, o.id DESC
         LIMIT $1",
    )
    .bind(LATEST_ORDERS_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(LatestOrder::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductVisibility;

    #[test]
    fn all_filter_adds_no_visibility_condition() {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM products");
        push_admin_filters(&mut query, &AdminProductFilter::default());
        assert_eq!(query.sql(), "SELECT * FROM products WHERE 1=1");
    }

    #[test]
    fn hidden_filter_binds_visibility() {
        let filter = AdminProductFilter {
            visibility: VisibilityFilter::Only(ProductVisibility::Hidden),
            search: Some("serum".into()),
        };
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM products");
        push_admin_filters(&mut query, &filter);
        assert_eq!(
            query.sql(),
            "SELECT * FROM products WHERE 1=1 AND visibility = $1 AND name ILIKE $2"
        );
    }
}
