use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::{
    config::PricingConfig,
    error::{AppError, Result},
    models::{MAX_MONEY, OrderItemDraft, OrderItemRequest, Product, ProductVisibility},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    pub free_shipping_threshold: Decimal,
    pub shipping_flat_rate: Decimal,
    pub tax_rate: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub items_price: Decimal,
    pub shipping_price: Decimal,
    pub tax_price: Decimal,
    pub total_price: Decimal,
}

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

impl PricingPolicy {
    pub fn from_config(config: &PricingConfig) -> Self {
        Self {
            free_shipping_threshold: config.free_shipping_threshold,
            shipping_flat_rate: config.shipping_flat_rate,
            tax_rate: config.tax_rate,
        }
    }

    /// Fails when the total does not fit the order's money columns.
    pub fn quote(&self, items: &[OrderItemDraft]) -> Result<OrderTotals> {
        let items_price = round2(
            items
                .iter()
                .map(|item| item.price * Decimal::from(item.quantity))
                .sum(),
        );

        let shipping_price = if items_price >= self.free_shipping_threshold {
            Decimal::ZERO
        } else {
            round2(self.shipping_flat_rate)
        };

        let tax_price = round2(items_price * self.tax_rate);

        let total_price = items_price + shipping_price + tax_price;
        if total_price > MAX_MONEY {
            return Err(AppError::BadRequest(
                "Order total exceeds the maximum allowed amount".to_string(),
            ));
        }

        Ok(OrderTotals {
            items_price,
            shipping_price,
            tax_price,
            total_price,
        })
    }
}

impl OrderTotals {
    /// Names of client-supplied totals that disagree with the computed ones.
    pub fn mismatches(
        &self,
        items_price: Option<Decimal>,
        shipping_price: Option<Decimal>,
        tax_price: Option<Decimal>,
        total_price: Option<Decimal>,
    ) -> Vec<&'static str> {
        [
            ("itemsPrice", items_price, self.items_price),
            ("shippingPrice", shipping_price, self.shipping_price),
            ("taxPrice", tax_price, self.tax_price),
            ("totalPrice", total_price, self.total_price),
        ]
        .into_iter()
        .filter(|(_, claimed, computed)| claimed.is_some_and(|c| round2(c) != *computed))
        .map(|(name, _, _)| name)
        .collect()
    }
}

/// Turns requested lines into priced snapshots. Demand for a product is
/// summed across lines before the stock check.
pub fn price_cart(
    requested: &[OrderItemRequest],
    products: &HashMap<i32, Product>,
) -> Result<Vec<OrderItemDraft>> {
    let mut demand: HashMap<i32, i64> = HashMap::new();
    for item in requested {
        if item.quantity < 1 {
            return Err(AppError::BadRequest(format!(
                "Invalid quantity for product {}",
                item.product
            )));
        }
        let total = demand.entry(item.product).or_insert(0);
        *total = total.saturating_add(item.quantity);
    }

    let mut drafts = Vec::with_capacity(requested.len());
    for item in requested {
        let product = products
            .get(&item.product)
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", item.product)))?;

        if product.fields.visibility != ProductVisibility::Active {
            return Err(AppError::BadRequest(format!(
                "Product {} is not available",
                product.fields.name
            )));
        }

        if i64::from(product.fields.stock) < demand[&item.product] {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for {}",
                product.fields.name
            )));
        }

        let quantity = i32::try_from(item.quantity).map_err(|_| {
            AppError::BadRequest(format!("Invalid quantity for product {}", item.product))
        })?;

        drafts.push(OrderItemDraft {
            product_id: product.id,
            name: product.fields.name.clone(),
            quantity,
            price: product.fields.price,
            image: product.primary_image().map(str::to_string),
        });
    }

    Ok(drafts)
}
