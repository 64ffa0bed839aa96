use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{CreateOrderRequest, OrderList, UpdateOrderStatusRequest, check_quantities, check_shipping_address},
    entity::orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
    error::{AppError, AppResult},
    middleware::auth::{AdminUser, CurrentUser},
    models::{Order, OrderLineItem, OrderStatus, ShippingAddress},
    money::Money,
    pricing::{PricedLine, subtotal},
    response::{ApiResponse, Meta},
    state::AppState,
    validation::{FieldError, Violations},
};

/// Everything needed to persist a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub items: Vec<OrderLineItem>,
    pub total: Money,
    pub shipping_address: ShippingAddress,
    pub status: OrderStatus,
    pub discount_code: Option<String>,
}

pub async fn insert_order<C: ConnectionTrait>(conn: &C, order: NewOrder) -> AppResult<Order> {
    let model = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(order.user_id),
        items: Set(serde_json::to_value(&order.items).map_err(anyhow::Error::from)?),
        total: Set(order.total.cents()),
        shipping_address: Set(
            serde_json::to_value(&order.shipping_address).map_err(anyhow::Error::from)?
        ),
        status: Set(order.status.as_str().to_string()),
        discount_code: Set(order.discount_code),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(conn)
    .await?;

    Order::try_from(model)
}

/// Admins see every order, everyone else only their own.
pub async fn list_orders(state: &AppState, user: &CurrentUser) -> AppResult<ApiResponse<OrderList>> {
    let mut finder = Orders::find();
    if !user.is_admin() {
        finder = finder.filter(OrderCol::UserId.eq(user.id()));
    }

    let items = finder
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::try_from)
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Ok", OrderList { items }, Some(meta)))
}

pub async fn get_order(
    state: &AppState,
    user: &CurrentUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;

    if !user.is_admin() && order.user_id != user.id() {
        return Err(AppError::Forbidden("Access denied".into()));
    }

    Ok(ApiResponse::success("OK", Order::try_from(order)?, Some(Meta::empty())))
}

/// Creates an order from client-priced line items. The stored total is
/// always recomputed from those items.
pub async fn create_order(
    state: &AppState,
    user: &CurrentUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    let mut v = Violations::new();
    let quantities: Vec<i32> = payload.items.iter().map(|item| item.quantity).collect();
    check_quantities(&mut v, &quantities);
    check_shipping_address(&mut v, payload.shipping_address.as_ref());
    let status = match payload.status.as_deref().map(|raw| raw.trim().parse::<OrderStatus>()) {
        None => OrderStatus::Pending,
        Some(Ok(status)) => status,
        Some(Err(message)) => {
            v.push("status", message);
            OrderStatus::Pending
        }
    };
    v.finish()?;

    let lines: Vec<PricedLine> = payload
        .items
        .iter()
        .map(|item| PricedLine {
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.price,
        })
        .collect();
    let total = subtotal(&lines)?;
    if let Some(claimed) = payload.total.filter(|claimed| *claimed != total) {
        return Err(AppError::Validation(vec![FieldError::new(
            "total",
            format!("total {claimed} does not match line items ({total})"),
        )]));
    }

    let shipping_address = payload
        .shipping_address
        .ok_or_else(|| AppError::BadRequest("Shipping address is required".into()))?;

    let order = insert_order(
        &state.orm,
        NewOrder {
            user_id: user.id(),
            items: payload.items,
            total,
            shipping_address,
            status,
            discount_code: None,
        },
    )
    .await?;
    tracing::info!(order_id = %order.id, user_id = %user.id(), total = %order.total, "order created");

    audit::record(
        state,
        user.id(),
        "order_create",
        "orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::success("Order created", order, Some(Meta::empty())))
}

pub async fn update_order_status(
    state: &AppState,
    admin: &AdminUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    if payload.status.trim().is_empty() {
        return Err(AppError::BadRequest("Status is required".into()));
    }
    let status = payload
        .status
        .trim()
        .parse::<OrderStatus>()
        .map_err(AppError::BadRequest)?;

    let existing = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;

    let mut active: OrderActive = existing.into();
    active.status = Set(status.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;
    tracing::info!(order_id = %order.id, status = %status, admin_id = %admin.id(), "order status updated");

    audit::record(
        state,
        admin.id(),
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "status": order.status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order updated",
        Order::try_from(order)?,
        Some(Meta::empty()),
    ))
}
