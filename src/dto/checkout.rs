use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::orders::{check_quantities, check_shipping_address},
    error::AppResult,
    models::{Order, ShippingAddress},
    validation::{Validate, Violations},
};

/// One cart entry. Any price the client sends is ignored.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub items: Vec<CartItem>,
    pub shipping_address: Option<ShippingAddress>,
    pub discount_code: Option<String>,
}

impl Validate for CheckoutRequest {
    fn validate(&self) -> AppResult<()> {
        let mut v = Violations::new();
        check_items(&mut v, &self.items);
        check_shipping_address(&mut v, self.shipping_address.as_ref());
        v.finish()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    #[serde(default)]
    pub items: Vec<CartItem>,
    pub discount_code: Option<String>,
}

impl Validate for QuoteRequest {
    fn validate(&self) -> AppResult<()> {
        let mut v = Violations::new();
        check_items(&mut v, &self.items);
        v.finish()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub order: Order,
}

fn check_items(v: &mut Violations, items: &[CartItem]) {
    let quantities: Vec<i32> = items.iter().map(|item| item.quantity).collect();
    check_quantities(v, &quantities);
}

/// Blank codes count as no code.
pub fn normalize_code(code: Option<&str>) -> Option<&str> {
    code.map(str::trim).filter(|c| !c.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn address() -> ShippingAddress {
        ShippingAddress {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            address: "12 Analytical Row".into(),
            city: "London".into(),
            state: "LDN".into(),
            zip_code: "10001".into(),
        }
    }

    fn item(quantity: i32) -> CartItem {
        CartItem {
            product_id: Uuid::new_v4(),
            quantity,
            size: None,
            color: None,
        }
    }

    fn fields(result: AppResult<()>) -> Vec<String> {
        match result {
            Err(AppError::Validation(errors)) => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn checkout_requires_items_and_address() {
        let req = CheckoutRequest {
            items: vec![],
            shipping_address: None,
            discount_code: None,
        };
        assert_eq!(fields(req.validate()), ["items", "shippingAddress"]);
    }

    #[test]
    fn checkout_flags_bad_quantities_and_blank_address_fields() {
        let mut addr = address();
        addr.city = " ".into();
        let req = CheckoutRequest {
            items: vec![item(1), item(0)],
            shipping_address: Some(addr),
            discount_code: Some("SAVE20".into()),
        };
        assert_eq!(
            fields(req.validate()),
            ["items[1].quantity", "shippingAddress.city"]
        );
    }

    #[test]
    fn valid_checkout_passes() {
        let req = CheckoutRequest {
            items: vec![item(2)],
            shipping_address: Some(address()),
            discount_code: None,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn client_prices_are_accepted_but_not_kept() {
        let item: CartItem = serde_json::from_value(serde_json::json!({
            "productId": "0d3c3c52-7a8e-4f0e-8d3e-7c1f7f0d9b21",
            "quantity": 1,
            "price": "0.01"
        }))
        .unwrap();
        assert_eq!(item.quantity, 1);
    }

    #[test]
    fn blank_discount_codes_are_dropped() {
        assert_eq!(normalize_code(Some("  ")), None);
        assert_eq!(normalize_code(Some(" SAVE20 ")), Some("SAVE20"));
        assert_eq!(normalize_code(None), None);
    }
}
