use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    models::{Order, OrderLineItem, ShippingAddress},
    money::Money,
    validation::Violations,
};

/// Direct order creation; the owner is always the requester.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub items: Vec<OrderLineItem>,
    pub shipping_address: Option<ShippingAddress>,
    /// Optional client-side total; must match the line items when present.
    #[schema(value_type = Option<String>, example = "90.00")]
    pub total: Option<Money>,
    /// Initial status as text; defaults to `pending`.
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OrderList {
    #[schema(value_type = Vec<Order>)]
    pub items: Vec<Order>,
}

/// At least one line, and no line with a quantity below one.
pub fn check_quantities(v: &mut Violations, quantities: &[i32]) {
    v.check(!quantities.is_empty(), "items", "Items are required");
    for (index, quantity) in quantities.iter().enumerate() {
        v.check(
            *quantity >= 1,
            format!("items[{index}].quantity"),
            "quantity must be at least 1",
        );
    }
}

/// Every address field must be filled in.
pub fn check_shipping_address(v: &mut Violations, address: Option<&ShippingAddress>) {
    let Some(address) = address else {
        v.push("shippingAddress", "Shipping address is required");
        return;
    };
    let fields = [
        ("shippingAddress.firstName", &address.first_name),
        ("shippingAddress.lastName", &address.last_name),
        ("shippingAddress.email", &address.email),
        ("shippingAddress.address", &address.address),
        ("shippingAddress.city", &address.city),
        ("shippingAddress.state", &address.state),
        ("shippingAddress.zipCode", &address.zip_code),
    ];
    for (field, value) in fields {
        v.require_text(value, field);
    }
}
