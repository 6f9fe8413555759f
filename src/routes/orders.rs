use axum::{Extension, Json, extract::State, http::StatusCode};
use chrono::Utc;

use crate::{
    AppState,
    error::{AppError, Result},
    models::{
        ApiResponse, CreateOrderRequest, CustomerSummary, ListResponse, NewOrder, Order,
        OrderQuery, OrderResponse, OrderStatus, PageResponse, PayOrderRequest, PaymentMethod,
        UpdateStatusRequest,
    },
    queries::{order_queries, product_queries, user_queries},
    services::{email_templates, pricing_service},
    utils::{
        extractors::{JsonBody, OptionalJsonBody, PathParam, QueryParams, extract_user_id},
        jwt::Claims,
        order_number,
    },
};

const ORDER_NUMBER_ATTEMPTS: usize = 3;

pub async fn create_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonBody(payload): JsonBody<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderResponse>>)> {
    let user_id = extract_user_id(&claims)?;

    if payload.items.is_empty() {
        return Err(AppError::BadRequest("No items in order".to_string()));
    }

    if let Some(item) = payload.items.iter().find(|i| i.quantity < 1) {
        return Err(AppError::BadRequest(format!(
            "Invalid quantity for product {}",
            item.product
        )));
    }

    let shipping_address = payload
        .shipping_address
        .ok_or_else(|| AppError::BadRequest("Shipping address is required".to_string()))?
        .normalized()?;

    let payment_method: PaymentMethod = payload
        .payment_method
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("Payment method is required".to_string()))?
        .parse()?;

    let product_ids: Vec<i32> = payload.items.iter().map(|i| i.product).collect();
    let products = product_queries::find_by_ids(&state.db, &product_ids).await?;
    let drafts = pricing_service::price_cart(&payload.items, &products)?;
    let totals = state.pricing.quote(&drafts)?;

    let mismatches = totals.mismatches(
        payload.items_price,
        payload.shipping_price,
        payload.tax_price,
        payload.total_price,
    );
    if !mismatches.is_empty() {
        tracing::warn!(
            "User {} sent totals that differ from server pricing ({}); using server values",
            user_id,
            mismatches.join(", ")
        );
    }

    let mut new_order = NewOrder {
        order_number: order_number::generate(Utc::now()),
        user_id,
        shipping_address,
        payment_method,
        items_price: totals.items_price,
        shipping_price: totals.shipping_price,
        tax_price: totals.tax_price,
        total_price: totals.total_price,
    };

    let mut attempt = 1;
    let (order, items) = loop {
        match order_queries::create_order_with_items(&state.db, &new_order, &drafts).await {
            Err(AppError::Conflict(_)) if attempt < ORDER_NUMBER_ATTEMPTS => {
                attempt += 1;
                new_order.order_number = order_number::generate(Utc::now());
            }
            result => break result?,
        }
    };

    tracing::info!(
        "Order {} created for user {} ({} items, total {})",
        order.order_number,
        user_id,
        items.len(),
        order.total_price
    );

    let customer = CustomerSummary {
        name: claims.name.clone(),
        email: claims.email.clone(),
    };
    state
        .notifier
        .dispatch(email_templates::order_confirmation(&order, &items, &customer));
    state.notifier.dispatch(email_templates::admin_order_alert(
        &order,
        &items,
        &customer,
        &state.admin_email,
    ));

    Ok((
        StatusCode::CREATED,
        Json(
            ApiResponse::new(OrderResponse {
                order,
                items,
                customer: None,
            })
            .with_message("Order created. A confirmation email is on its way."),
        ),
    ))
}

pub async fn get_my_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ListResponse<OrderResponse>>> {
    let user_id = extract_user_id(&claims)?;

    let orders = order_queries::find_by_user(&state.db, user_id).await?;
    let orders = order_queries::with_items(
        &state.db,
        orders.into_iter().map(|order| (order, None)).collect(),
    )
    .await?;

    Ok(Json(ListResponse::new(orders)))
}

pub async fn get_order_by_id(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    PathParam(id): PathParam<i32>,
) -> Result<Json<ApiResponse<OrderResponse>>> {
    let user_id = extract_user_id(&claims)?;

    let (order, customer) = order_queries::find_with_customer(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?
        .split();

    order.ensure_visible_to(user_id, claims.is_admin())?;

    let items = order_queries::find_items(&state.db, order.id).await?;

    Ok(Json(ApiResponse::new(OrderResponse {
        order,
        items,
        customer,
    })))
}

pub async fn update_order_status(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    OptionalJsonBody(payload): OptionalJsonBody<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>> {
    let status = payload.parse()?;

    let mut order = find_order(&state, id).await?;
    let old_status = order.status;

    let changed = order.apply_status(status, Utc::now());
    let message = if changed {
        order_queries::save_status(&state.db, &order).await?;
        tracing::info!(
            "Order {} moved from {} to {}",
            order.order_number,
            old_status,
            order.status
        );
        notify_status_change(&state, &order, old_status).await;
        "Status updated. The customer has been notified by email."
    } else {
        "Status unchanged"
    };

    let items = order_queries::find_items(&state.db, order.id).await?;

    Ok(Json(
        ApiResponse::new(OrderResponse {
            order,
            items,
            customer: None,
        })
        .with_message(message),
    ))
}

pub async fn mark_order_paid(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    PathParam(id): PathParam<i32>,
    OptionalJsonBody(payload): OptionalJsonBody<PayOrderRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>> {
    let user_id = extract_user_id(&claims)?;

    let mut order = find_order(&state, id).await?;
    order.ensure_visible_to(user_id, claims.is_admin())?;

    order.mark_paid(payload.into(), Utc::now());
    order_queries::save_payment(&state.db, &order).await?;

    tracing::info!("Order {} marked as paid by user {}", order.order_number, user_id);

    let items = order_queries::find_items(&state.db, order.id).await?;

    Ok(Json(ApiResponse::new(OrderResponse {
        order,
        items,
        customer: None,
    })))
}

pub async fn list_orders(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<OrderQuery>,
) -> Result<Json<PageResponse<OrderResponse>>> {
    let (status, pagination) = params.into_filter()?;

    let (rows, total) = order_queries::list_orders(&state.db, status, pagination).await?;
    let orders = order_queries::with_items(
        &state.db,
        rows.into_iter().map(|row| row.split()).collect(),
    )
    .await?;

    Ok(Json(PageResponse::new(orders, total, pagination)))
}

async fn find_order(state: &AppState, id: i32) -> Result<Order> {
    order_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
}

/// Best effort: a failed owner lookup is logged, never surfaced.
async fn notify_status_change(state: &AppState, order: &Order, old_status: OrderStatus) {
    let owner = match user_queries::find_by_id(&state.db, order.user_id).await {
        Ok(Some(owner)) => owner,
        Ok(None) => {
            tracing::warn!(
                "Order {} has no owner account, skipping status email",
                order.order_number
            );
            return;
        }
        Err(e) => {
            tracing::error!(
                "Could not load owner of order {} for status email: {}",
                order.order_number,
                e
            );
            return;
        }
    };

    let customer = CustomerSummary {
        name: owner.name,
        email: owner.email,
    };
    state
        .notifier
        .dispatch(email_templates::status_update(order, &customer, old_status));
}
