use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    audit,
    dto::checkout::{CartItem, CheckoutRequest, CheckoutResponse, QuoteRequest, normalize_code},
    entity::products::{Column as ProdCol, Entity as Products, Model as ProductModel},
    error::{AppError, AppResult},
    middleware::auth::CurrentUser,
    models::{OrderLineItem, OrderStatus},
    money::Money,
    pricing::{self, PricedLine, Quote},
    response::{ApiResponse, Meta},
    services::{
        discount_service::find_active_by_code,
        order_service::{NewOrder, insert_order},
    },
    state::AppState,
    validation::Validate,
};

/// A cart priced against current catalog data.
struct PricedCart {
    lines: Vec<PricedLine>,
    quote: Quote,
}

async fn load_products(state: &AppState, items: &[CartItem]) -> AppResult<HashMap<Uuid, ProductModel>> {
    let ids: Vec<Uuid> = items.iter().map(|item| item.product_id).collect();
    Ok(Products::find()
        .filter(ProdCol::Id.is_in(ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|product| (product.id, product))
        .collect())
}

async fn price_cart(
    state: &AppState,
    items: &[CartItem],
    discount_code: Option<&str>,
) -> AppResult<PricedCart> {
    let products = load_products(state, items).await?;
    let lines = pricing::price_lines(
        items.iter().map(|item| (item.product_id, item.quantity)),
        |id| products.get(&id).map(|p| Money::from_cents(p.price)),
    )?;

    // Stock is neither reserved nor decremented at checkout.
    for line in &lines {
        if let Some(product) = products.get(&line.product_id) {
            if line.quantity > product.stock {
                tracing::warn!(
                    product_id = %line.product_id,
                    requested = line.quantity,
                    stock = product.stock,
                    "checkout quantity exceeds stock"
                );
            }
        }
    }

    let discount = match normalize_code(discount_code) {
        Some(code) => find_active_by_code(&state.orm, code).await?,
        None => None,
    };

    let now = Utc::now();
    let quote = pricing::quote(&lines, discount.as_ref(), state.config.tax_rate, now)?;
    if let (Some(code), None) = (normalize_code(discount_code), &quote.discount_code) {
        tracing::debug!(code, "discount code unknown or expired, ignored");
    }

    Ok(PricedCart { lines, quote })
}

pub async fn quote(
    state: &AppState,
    _user: &CurrentUser,
    payload: QuoteRequest,
) -> AppResult<ApiResponse<Quote>> {
    payload.validate()?;
    let priced = price_cart(state, &payload.items, payload.discount_code.as_deref()).await?;
    Ok(ApiResponse::success("Quote", priced.quote, Some(Meta::empty())))
}

pub async fn checkout(
    state: &AppState,
    user: &CurrentUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<CheckoutResponse>> {
    payload.validate()?;
    let CheckoutRequest {
        items,
        shipping_address,
        discount_code,
    } = payload;
    let shipping_address = shipping_address
        .ok_or_else(|| AppError::BadRequest("Shipping address is required".into()))?;

    let PricedCart { lines, quote } = price_cart(state, &items, discount_code.as_deref()).await?;

    let line_items = items
        .into_iter()
        .zip(&lines)
        .map(|(item, line)| OrderLineItem {
            product_id: line.product_id,
            quantity: line.quantity,
            size: item.size,
            color: item.color,
            price: line.unit_price,
        })
        .collect();

    let order = insert_order(
        &state.orm,
        NewOrder {
            user_id: user.id(),
            items: line_items,
            total: quote.total,
            shipping_address,
            status: OrderStatus::Processing,
            discount_code: quote.discount_code.clone(),
        },
    )
    .await?;
    tracing::info!(
        order_id = %order.id,
        user_id = %user.id(),
        subtotal = %quote.subtotal,
        total = %order.total,
        discount = ?order.discount_code,
        "checkout completed"
    );

    audit::record(
        state,
        user.id(),
        "checkout",
        "orders",
        serde_json::json!({ "order_id": order.id, "total": order.total }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order placed successfully",
        CheckoutResponse { order },
        Some(Meta::empty()),
    ))
}
