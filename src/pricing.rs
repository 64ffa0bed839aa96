//! Checkout arithmetic.
//!
//! Everything here is pure: callers resolve products and discounts from
//! storage first, then hand the priced lines to [`quote`]. Amounts are
//! integer minor units, so a subtotal is exact and a discount is rounded
//! once, half-up, to the cent.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::Discount,
    money::{Money, Percentage},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("Product {0} not found")]
    ProductNotFound(Uuid),
    #[error("Quantity for product {0} must be at least 1")]
    InvalidQuantity(Uuid),
    #[error("Order total is too large")]
    Overflow,
}

impl From<PricingError> for AppError {
    fn from(err: PricingError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// A cart line resolved against the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    #[schema(value_type = String, example = "90.00")]
    pub subtotal: Money,
    #[schema(value_type = String, example = "18.00")]
    pub discount_amount: Money,
    /// Subtotal after discount; this is what an order stores.
    #[schema(value_type = String, example = "72.00")]
    pub total: Money,
    #[schema(value_type = String, example = "5.76")]
    pub tax: Money,
    #[schema(value_type = String, example = "77.76")]
    pub grand_total: Money,
    /// The code that was actually applied.
    pub discount_code: Option<String>,
}

/// Resolves each requested `(product_id, quantity)` to a priced line.
///
/// `lookup` returns the current unit price of a product, or `None` when the
/// product does not exist.
pub fn price_lines<F>(
    requested: impl IntoIterator<Item = (Uuid, i32)>,
    mut lookup: F,
) -> Result<Vec<PricedLine>, PricingError>
where
    F: FnMut(Uuid) -> Option<Money>,
{
    requested
        .into_iter()
        .map(|(product_id, quantity)| {
            if quantity < 1 {
                return Err(PricingError::InvalidQuantity(product_id));
            }
            let unit_price = lookup(product_id).ok_or(PricingError::ProductNotFound(product_id))?;
            Ok(PricedLine {
                product_id,
                quantity,
                unit_price,
            })
        })
        .collect()
}

pub fn subtotal(lines: &[PricedLine]) -> Result<Money, PricingError> {
    lines.iter().try_fold(Money::ZERO, |acc, line| {
        line.unit_price
            .checked_mul(i64::from(line.quantity))
            .and_then(|amount| acc.checked_add(amount))
            .ok_or(PricingError::Overflow)
    })
}

/// The discount that applies at `now`, if any. Missing, inactive and expired
/// codes all yield `None`.
pub fn applicable_discount(discount: Option<&Discount>, now: DateTime<Utc>) -> Option<&Discount> {
    discount.filter(|d| d.is_usable_at(now))
}

pub fn quote(
    lines: &[PricedLine],
    discount: Option<&Discount>,
    tax_rate: Percentage,
    now: DateTime<Utc>,
) -> Result<Quote, PricingError> {
    let subtotal = subtotal(lines)?;
    let applied = applicable_discount(discount, now);
    let discount_amount = applied
        .map(|d| subtotal.portion(d.percentage))
        .unwrap_or(Money::ZERO);
    let total = subtotal
        .checked_sub(discount_amount)
        .ok_or(PricingError::Overflow)?;
    let tax = total.portion(tax_rate);
    let grand_total = total.checked_add(tax).ok_or(PricingError::Overflow)?;

    Ok(Quote {
        subtotal,
        discount_amount,
        total,
        tax,
        grand_total,
        discount_code: applied.map(|d| d.code.clone()),
    })
}
