use std::{fmt, str::FromStr};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::{discounts, orders, products, users},
    error::AppError,
    money::{Money, Percentage},
};

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            profile_image_url: model.profile_image_url,
            is_admin: model.is_admin,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[schema(value_type = String, example = "25.00")]
    pub price: Money,
    pub category: String,
    pub images: Vec<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub stock: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<products::Model> for Product {
    type Error = AppError;

    fn try_from(model: products::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            images: decode_column(model.images, "products.images")?,
            sizes: decode_column(model.sizes, "products.sizes")?,
            colors: decode_column(model.colors, "products.colors")?,
            id: model.id,
            name: model.name,
            description: model.description,
            price: Money::from_cents(model.price),
            category: model.category,
            stock: model.stock,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "status must be one of: {}",
                    OrderStatus::ALL.map(OrderStatus::as_str).join(", ")
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
    /// Unit price at the time of purchase.
    #[schema(value_type = String, example = "25.00")]
    pub price: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<OrderLineItem>,
    #[schema(value_type = String, example = "72.00")]
    pub total: Money,
    pub shipping_address: ShippingAddress,
    pub status: OrderStatus,
    pub discount_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<orders::Model> for Order {
    type Error = AppError;

    fn try_from(model: orders::Model) -> Result<Self, Self::Error> {
        let status = model
            .status
            .parse::<OrderStatus>()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("order {}: {e}", model.id)))?;
        Ok(Self {
            items: decode_column(model.items, "orders.items")?,
            shipping_address: decode_column(model.shipping_address, "orders.shipping_address")?,
            id: model.id,
            user_id: model.user_id,
            total: Money::from_cents(model.total),
            status,
            discount_code: model.discount_code,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    pub id: Uuid,
    pub code: String,
    #[schema(value_type = String, example = "20.00")]
    pub percentage: Percentage,
    pub valid_until: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Discount {
    /// Active and not yet expired; `valid_until` itself is already expired.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.valid_until > now
    }
}

impl TryFrom<discounts::Model> for Discount {
    type Error = AppError;

    fn try_from(model: discounts::Model) -> Result<Self, Self::Error> {
        let percentage = Percentage::from_basis_points(model.percentage)
            .with_context(|| format!("discount {} has an invalid percentage", model.id))?;
        Ok(Self {
            id: model.id,
            code: model.code,
            percentage,
            valid_until: model.valid_until.with_timezone(&Utc),
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
        })
    }
}

fn decode_column<T: serde::de::DeserializeOwned>(
    value: serde_json::Value,
    column: &str,
) -> Result<T, AppError> {
    serde_json::from_value(value)
        .with_context(|| format!("column {column} holds malformed JSON"))
        .map_err(AppError::Internal)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn discount(is_active: bool, valid_until: DateTime<Utc>) -> Discount {
        Discount {
            id: Uuid::new_v4(),
            code: "SAVE20".into(),
            percentage: Percentage::from_basis_points(2000).unwrap(),
            valid_until,
            is_active,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn discount_usable_only_while_active_and_unexpired() {
        let now = Utc::now();
        assert!(discount(true, now + Duration::days(1)).is_usable_at(now));
        assert!(!discount(true, now - Duration::days(1)).is_usable_at(now));
        assert!(!discount(true, now).is_usable_at(now));
        assert!(!discount(false, now + Duration::days(1)).is_usable_at(now));
    }

    #[test]
    fn order_status_parses_known_values_only() {
        assert_eq!("shipped".parse::<OrderStatus>(), Ok(OrderStatus::Shipped));
        assert!("paid".parse::<OrderStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&OrderStatus::Processing).unwrap(),
            "\"processing\""
        );
    }

    #[test]
    fn line_items_use_camel_case_and_decimal_prices() {
        let item: OrderLineItem = serde_json::from_value(serde_json::json!({
            "productId": "2b0e5a8c-3f57-4d2a-9a51-0c5a8f1f6d11",
            "quantity": 2,
            "size": "M",
            "color": null,
            "price": "25.00"
        }))
        .unwrap();
        assert_eq!(item.price, Money::from_cents(2500));
        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back["price"], "25.00");
        assert_eq!(back["productId"], "2b0e5a8c-3f57-4d2a-9a51-0c5a8f1f6d11");
    }
}
