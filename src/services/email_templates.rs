use rust_decimal::Decimal;

use crate::{
    models::{CustomerSummary, Order, OrderItem, OrderStatus},
    services::email_service::{EmailKind, EmailMessage},
};

const ORDER_CONFIRMATION: &str = include_str!("../templates/order_confirmation.html");
const ADMIN_ORDER_ALERT: &str = include_str!("../templates/admin_order_alert.html");
const STATUS_UPDATE: &str = include_str!("../templates/status_update.html");

pub fn order_confirmation(
    order: &Order,
    items: &[OrderItem],
    customer: &CustomerSummary,
) -> EmailMessage {
    let html = fill(
        ORDER_CONFIRMATION,
        &[
            ("customer_name", escape_html(&customer.name)),
            ("order_number", escape_html(&order.order_number)),
            ("order_date", order.created_at.format("%d/%m/%Y").to_string()),
            ("status", order.status.as_str().to_string()),
            ("items", item_rows(items)),
            ("items_price", money(order.items_price)),
            ("shipping_price", money(order.shipping_price)),
            ("tax_price", money(order.tax_price)),
            ("total_price", money(order.total_price)),
            ("shipping_address", shipping_block(order)),
            ("payment_method", order.payment_method.label().to_string()),
        ],
    );

    EmailMessage {
        kind: EmailKind::OrderConfirmation,
        to: customer.email.clone(),
        subject: format!("Order confirmed - {}", order.order_number),
        html,
    }
}

pub fn admin_order_alert(
    order: &Order,
    items: &[OrderItem],
    customer: &CustomerSummary,
    admin_email: &str,
) -> EmailMessage {
    let html = fill(
        ADMIN_ORDER_ALERT,
        &[
            ("order_number", escape_html(&order.order_number)),
            ("customer_name", escape_html(&customer.name)),
            ("customer_email", escape_html(&customer.email)),
            ("order_date", order.created_at.format("%d/%m/%Y %H:%M").to_string()),
            ("payment_method", order.payment_method.label().to_string()),
            ("total_price", money(order.total_price)),
            ("items", item_rows(items)),
            ("shipping_address", shipping_block(order)),
        ],
    );

    EmailMessage {
        kind: EmailKind::AdminOrderAlert,
        to: admin_email.to_string(),
        subject: format!(
            "New order {} - {} €",
            order.order_number,
            money(order.total_price)
        ),
        html,
    }
}

pub fn status_update(
    order: &Order,
    customer: &CustomerSummary,
    old_status: OrderStatus,
) -> EmailMessage {
    let html = fill(
        STATUS_UPDATE,
        &[
            ("customer_name", escape_html(&customer.name)),
            ("order_number", escape_html(&order.order_number)),
            ("old_status", old_status.as_str().to_string()),
            ("new_status", order.status.as_str().to_string()),
            ("status_message", status_message(order.status).to_string()),
            ("total_price", money(order.total_price)),
        ],
    );

    EmailMessage {
        kind: EmailKind::StatusUpdate,
        to: customer.email.clone(),
        subject: format!("Order {} is now {}", order.order_number, order.status),
        html,
    }
}

fn status_message(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "Your order has been received and is awaiting processing.",
        OrderStatus::Shipped => "Your parcel is on its way.",
        OrderStatus::Delivered => "Your parcel has been delivered. Enjoy your products!",
        OrderStatus::Cancelled => {
            "Your order has been cancelled. Contact us if this is unexpected."
        }
    }
}

fn item_rows(items: &[OrderItem]) -> String {
    items
        .iter()
        .map(|item| {
            format!(
                "<tr><td>{}</td><td align=\"center\">{}</td><td align=\"right\">{} €</td><td align=\"right\">{} €</td></tr>",
                escape_html(&item.name),
                item.quantity,
                money(item.price),
                money(item.price * Decimal::from(item.quantity)),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn shipping_block(order: &Order) -> String {
    let address = &order.shipping_address.0;
    let mut lines = vec![
        escape_html(&address.name),
        escape_html(&address.street),
        format!(
            "{} {}",
            escape_html(&address.postal_code),
            escape_html(&address.city)
        ),
        escape_html(&address.country),
    ];
    if let Some(phone) = &address.phone {
        lines.push(escape_html(phone));
    }
    lines.join("<br>")
}

fn money(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

fn fill(template: &str, slots: &[(&str, String)]) -> String {
    slots
        .iter()
        .fold(template.to_string(), |html, (key, value)| {
            html.replace(&format!("{{{{{}}}}}", key), value)
        })
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
