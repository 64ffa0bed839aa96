use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::products::{
        CreateProductRequest, ProductChange, ProductFilter, ProductList, UpdateProductRequest,
        clean_list,
    },
    entity::products::{ActiveModel, Column, Entity as Products},
    error::{AppError, AppResult},
    middleware::auth::AdminUser,
    models::Product,
    response::{ApiResponse, Meta},
    state::AppState,
    validation::Validate,
};

/// Active products only; every supplied filter must hold.
pub fn filter_condition(filter: &ProductFilter) -> Condition {
    let mut condition = Condition::all().add(Column::IsActive.eq(true));

    if let Some(category) = &filter.category {
        condition = condition.add(Column::Category.eq(category.as_str()));
    }
    if let Some(min_price) = filter.min_price {
        condition = condition.add(Column::Price.gte(min_price.cents()));
    }
    if let Some(max_price) = filter.max_price {
        condition = condition.add(Column::Price.lte(max_price.cents()));
    }
    if let Some(search) = &filter.search {
        condition = condition.add(Column::Name.contains(search.as_str()));
    }

    condition
}

pub async fn list_products(
    state: &AppState,
    filter: ProductFilter,
) -> AppResult<ApiResponse<ProductList>> {
    let items = Products::find()
        .filter(filter_condition(&filter))
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::try_from)
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;
    Ok(ApiResponse::success("Product", Product::try_from(product)?, None))
}

pub async fn create_product(
    state: &AppState,
    admin: &AdminUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    payload.validate()?;

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        price: Set(payload.price.cents()),
        category: Set(payload.category.trim().to_string()),
        images: Set(serde_json::json!(clean_list(payload.images))),
        sizes: Set(serde_json::json!(clean_list(payload.sizes))),
        colors: Set(serde_json::json!(clean_list(payload.colors))),
        stock: Set(payload.stock),
        is_active: Set(payload.is_active),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let product = active.insert(&state.orm).await?;
    tracing::info!(product_id = %product.id, admin_id = %admin.id(), "product created");

    audit::record(
        state,
        admin.id(),
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        Product::try_from(product)?,
        Some(Meta::empty()),
    ))
}

fn apply_change(active: &mut ActiveModel, change: ProductChange) {
    match change {
        ProductChange::Rename(name) => active.name = Set(name),
        ProductChange::Describe(description) => active.description = Set(description),
        ProductChange::Reprice(price) => active.price = Set(price.cents()),
        ProductChange::Recategorize(category) => active.category = Set(category),
        ProductChange::SetImages(images) => active.images = Set(serde_json::json!(images)),
        ProductChange::SetSizes(sizes) => active.sizes = Set(serde_json::json!(sizes)),
        ProductChange::SetColors(colors) => active.colors = Set(serde_json::json!(colors)),
        ProductChange::SetStock(stock) => active.stock = Set(stock),
        ProductChange::SetActive(is_active) => active.is_active = Set(is_active),
    }
}

pub async fn update_product(
    state: &AppState,
    admin: &AdminUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let changes = payload.into_changes()?;

    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    let mut active: ActiveModel = existing.into();
    let applied = changes.len();
    for change in changes {
        apply_change(&mut active, change);
    }
    active.updated_at = Set(Utc::now().into());
    let product = active.update(&state.orm).await?;

    audit::record(
        state,
        admin.id(),
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id, "changes": applied }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        Product::try_from(product)?,
        Some(Meta::empty()),
    ))
}

/// Soft delete: the row stays, it just stops being listed.
pub async fn delete_product(
    state: &AppState,
    admin: &AdminUser,
    id: Uuid,
) -> AppResult<ApiResponse<Product>> {
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    let mut active: ActiveModel = existing.into();
    apply_change(&mut active, ProductChange::SetActive(false));
    active.updated_at = Set(Utc::now().into());
    let product = active.update(&state.orm).await?;
    tracing::info!(product_id = %id, admin_id = %admin.id(), "product deactivated");

    audit::record(
        state,
        admin.id(),
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        Product::try_from(product)?,
        Some(Meta::empty()),
    ))
}
