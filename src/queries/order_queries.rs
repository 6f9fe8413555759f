use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::Result,
    models::{
        CustomerSummary, NewOrder, Order, OrderItem, OrderItemDraft, OrderResponse,
        OrderStatus, OrderWithCustomer, Pagination,
    },
};

const WITH_CUSTOMER: &str = "SELECT o.*, u.name AS customer_name, u.email AS customer_email
     FROM orders o
     LEFT JOIN users u ON u.id = o.user_id";

/// Inserts the order and its line snapshots in one transaction.
pub async fn create_order_with_items(
    pool: &PgPool,
    new_order: &NewOrder,
    items: &[OrderItemDraft],
) -> Result<(Order, Vec<OrderItem>)> {
    let mut tx = pool.begin().await?;

    let order = sqlx::query_as::<_, Order>(
        "INSERT INTO orders (order_number, user_id, shipping_address, payment_method,
         items_price, shipping_price, tax_price, total_price)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING *",
    )
    .bind(&new_order.order_number)
    .bind(new_order.user_id)
    .bind(sqlx::types::Json(&new_order.shipping_address))
    .bind(new_order.payment_method)
    .bind(new_order.items_price)
    .bind(new_order.shipping_price)
    .bind(new_order.tax_price)
    .bind(new_order.total_price)
    .fetch_one(&mut *tx)
    .await?;

    let product_ids: Vec<i32> = items.iter().map(|i| i.product_id).collect();
    let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
    let quantities: Vec<i32> = items.iter().map(|i| i.quantity).collect();
    let prices: Vec<Decimal> = items.iter().map(|i| i.price).collect();
    let images: Vec<Option<&str>> = items.iter().map(|i| i.image.as_deref()).collect();

    let saved_items = sqlx::query_as::<_, OrderItem>(
        "INSERT INTO order_items (order_id, product_id, name, quantity, price, image)
         SELECT $1, * FROM UNNEST($2::int[], $3::varchar[], $4::int[], $5::numeric[], $6::text[])
         RETURNING *",
    )
    .bind(order.id)
    .bind(&product_ids)
    .bind(&names)
    .bind(&quantities)
    .bind(&prices)
    .bind(&images)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok((order, saved_items))
}

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(order)
}

pub async fn find_with_customer(pool: &PgPool, id: i32) -> Result<Option<OrderWithCustomer>> {
    let order = sqlx::query_as::<_, OrderWithCustomer>(&format!("{} WHERE o.id = $1", WITH_CUSTOMER))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(order)
}

pub async fn find_by_user(pool: &PgPool, user_id: i32) -> Result<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(orders)
}

pub async fn find_items(pool: &PgPool, order_id: i32) -> Result<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT * FROM order_items WHERE order_id = $1 ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;

    Ok(items)
}

/// Items for several orders in one round trip, grouped by order id.
pub async fn find_items_for_orders(
    pool: &PgPool,
    order_ids: &[i32],
) -> Result<HashMap<i32, Vec<OrderItem>>> {
    if order_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT * FROM order_items WHERE order_id = ANY($1) ORDER BY order_id, id",
    )
    .bind(order_ids)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<i32, Vec<OrderItem>> = HashMap::new();
    for item in items {
        grouped.entry(item.order_id).or_default().push(item);
    }

    Ok(grouped)
}

/// Pairs every order with its items, keeping the given order.
pub async fn with_items(
    pool: &PgPool,
    orders: Vec<(Order, Option<CustomerSummary>)>,
) -> Result<Vec<OrderResponse>> {
    let ids: Vec<i32> = orders.iter().map(|(o, _)| o.id).collect();
    let mut items = find_items_for_orders(pool, &ids).await?;

    Ok(orders
        .into_iter()
        .map(|(order, customer)| OrderResponse {
            items: items.remove(&order.id).unwrap_or_default(),
            order,
            customer,
        })
        .collect())
}

pub async fn save_status(pool: &PgPool, order: &Order) -> Result<()> {
    sqlx::query(
        "UPDATE orders
         SET status = $1, is_delivered = $2, delivered_at = $3, updated_at = $4
         WHERE id = $5",
    )
    .bind(order.status)
    .bind(order.is_delivered)
    .bind(order.delivered_at)
    .bind(order.updated_at)
    .bind(order.id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn save_payment(pool: &PgPool, order: &Order) -> Result<()> {
    sqlx::query(
        "UPDATE orders
         SET is_paid = $1, paid_at = $2, payment_result = $3, updated_at = $4
         WHERE id = $5",
    )
    .bind(order.is_paid)
    .bind(order.paid_at)
    .bind(&order.payment_result)
    .bind(order.updated_at)
    .bind(order.id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_orders(
    pool: &PgPool,
    status: Option<OrderStatus>,
    pagination: Pagination,
) -> Result<(Vec<OrderWithCustomer>, i64)> {
    let mut count_query: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM orders o");
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new(WITH_CUSTOMER);

    if let Some(status) = status {
        count_query.push(" WHERE o.status = ");
        count_query.push_bind(status);
        query.push(" WHERE o.status = ");
        query.push_bind(status);
    }

    let total: i64 = count_query.build_query_scalar().fetch_one(pool).await?;

    query.push(" ORDER BY o.created_at DESC, o.id DESC LIMIT ");
    query.push_bind(pagination.limit);
    query.push(" OFFSET ");
    query.push_bind(pagination.offset());

    let orders = query
        .build_query_as::<OrderWithCustomer>()
        .fetch_all(pool)
        .await?;

    Ok((orders, total))
}

/// Sum of order totals, cancelled orders excluded.
pub async fn total_revenue(pool: &PgPool) -> Result<Decimal> {
    let revenue = sqlx::query_scalar::<_, Decimal>(
        "SELECT COALESCE(SUM(total_price), 0) FROM orders WHERE status <> 'Cancelled'",
    )
    .fetch_one(pool)
    .await?;

    Ok(revenue)
}
