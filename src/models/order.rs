use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use crate::{
    error::{AppError, Result},
    models::Pagination,
};

pub const DEFAULT_ORDER_PAGE_SIZE: i64 = 10;
pub const LATEST_ORDERS_LIMIT: i64 = 10;
const DELETED_USER: &str = "Deleted user";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status")]
pub enum OrderStatus {
    Pending,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            other => Err(AppError::BadRequest(format!(
                "Invalid order status: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Paypal,
    CashOnDelivery,
}

impl PaymentMethod {
    pub fn label(self) -> &'static str {
        match self {
            PaymentMethod::Card => "Credit card",
            PaymentMethod::Paypal => "PayPal",
            PaymentMethod::CashOnDelivery => "Cash on delivery",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "card" => Ok(PaymentMethod::Card),
            "paypal" => Ok(PaymentMethod::Paypal),
            "cash_on_delivery" => Ok(PaymentMethod::CashOnDelivery),
            other => Err(AppError::BadRequest(format!(
                "Invalid payment method: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingAddress {
    pub name: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ShippingAddress {
    /// Trims every field and rejects blanks in the required ones.
    pub fn normalized(self) -> Result<Self> {
        let required = |value: String, label: &str| -> Result<String> {
            let value = value.trim().to_string();
            if value.is_empty() {
                Err(AppError::BadRequest(format!(
                    "Shipping address {} is required",
                    label
                )))
            } else {
                Ok(value)
            }
        };

        Ok(Self {
            name: required(self.name, "name")?,
            street: required(self.street, "street")?,
            city: required(self.city, "city")?,
            postal_code: required(self.postal_code, "postal code")?,
            country: required(self.country, "country")?,
            phone: self
                .phone
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResult {
    pub id: Option<String>,
    pub status: Option<String>,
    pub update_time: Option<String>,
    pub email_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i32,
    pub order_number: String,
    pub user_id: i32,
    pub shipping_address: Json<ShippingAddress>,
    pub payment_method: PaymentMethod,
    pub items_price: Decimal,
    pub shipping_price: Decimal,
    pub tax_price: Decimal,
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_result: Option<Json<PaymentResult>>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Moves the order to `status`. Returns false, touching nothing, when the
    /// order is already there.
    pub fn apply_status(&mut self, status: OrderStatus, now: DateTime<Utc>) -> bool {
        if self.status == status {
            return false;
        }

        self.status = status;
        if status == OrderStatus::Delivered {
            self.is_delivered = true;
            self.delivered_at.get_or_insert(now);
        }
        self.updated_at = now;
        true
    }

    pub fn mark_paid(&mut self, result: PaymentResult, now: DateTime<Utc>) {
        self.is_paid = true;
        self.paid_at = Some(now);
        self.payment_result = Some(Json(result));
        self.updated_at = now;
    }

    pub fn ensure_visible_to(&self, user_id: i32, is_admin: bool) -> Result<()> {
        if self.user_id == user_id || is_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Not authorized to access this order".to_string(),
            ))
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: i32,
    #[serde(skip)]
    pub order_id: i32,
    #[serde(rename = "product")]
    pub product_id: Option<i32>,
    pub name: String,
    pub quantity: i32,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Line snapshot taken from the product record at checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItemDraft {
    pub product_id: i32,
    pub name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: String,
    pub user_id: i32,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub items_price: Decimal,
    pub shipping_price: Decimal,
    pub tax_price: Decimal,
    pub total_price: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    #[serde(alias = "productId")]
    pub product: i32,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
    pub shipping_address: Option<ShippingAddress>,
    pub payment_method: Option<String>,
    pub items_price: Option<Decimal>,
    pub shipping_price: Option<Decimal>,
    pub tax_price: Option<Decimal>,
    pub total_price: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

impl UpdateStatusRequest {
    pub fn parse(&self) -> Result<OrderStatus> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Err(AppError::BadRequest("Status is required".to_string())),
            Some(raw) => raw.parse(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Payer {
    pub email_address: Option<String>,
}

/// Provider callback payload, stored as-is.
#[derive(Debug, Default, Deserialize)]
pub struct PayOrderRequest {
    pub id: Option<String>,
    pub status: Option<String>,
    pub update_time: Option<String>,
    pub payer: Option<Payer>,
}

impl From<PayOrderRequest> for PaymentResult {
    fn from(req: PayOrderRequest) -> Self {
        Self {
            id: req.id,
            status: req.status,
            update_time: req.update_time,
            email_address: req.payer.and_then(|p| p.email_address),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
}

impl OrderQuery {
    pub fn into_filter(self) -> Result<(Option<OrderStatus>, Pagination)> {
        let pagination = Pagination::new(self.page, self.limit, DEFAULT_ORDER_PAGE_SIZE);
        let status = self
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .transpose()?;
        Ok((status, pagination))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerSummary {
    pub name: String,
    pub email: String,
}

#[derive(Debug, sqlx::FromRow)]
pub struct OrderWithCustomer {
    #[sqlx(flatten)]
    pub order: Order,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
}

impl OrderWithCustomer {
    pub fn split(self) -> (Order, Option<CustomerSummary>) {
        let customer = match (self.customer_name, self.customer_email) {
            (Some(name), Some(email)) => Some(CustomerSummary { name, email }),
            _ => None,
        };
        (self.order, customer)
    }
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    #[serde(rename = "user", skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerSummary>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct LatestOrderRow {
    pub id: i32,
    pub order_number: String,
    pub customer_name: Option<String>,
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestOrder {
    pub id: i32,
    pub order_number: String,
    pub client_name: String,
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub date: DateTime<Utc>,
}

impl From<LatestOrderRow> for LatestOrder {
    fn from(row: LatestOrderRow) -> Self {
        Self {
            id: row.id,
            order_number: row.order_number,
            client_name: row
                .customer_name
                .unwrap_or_else(|| DELETED_USER.to_string()),
            total_price: row.total_price,
            status: row.status,
            date: row.created_at,
        }
    }
}
