use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::discounts::{CreateDiscountRequest, DiscountChange, DiscountList, UpdateDiscountRequest},
    entity::discounts::{ActiveModel, Column, Entity as Discounts, Model as DiscountModel},
    error::{AppError, AppResult},
    middleware::auth::AdminUser,
    models::Discount,
    response::{ApiResponse, Meta},
    state::AppState,
    validation::Validate,
};

const CODE_TAKEN: &str = "Discount code already exists";

/// Looks up an active discount by code. Expiry is left to the caller.
pub async fn find_active_by_code<C: ConnectionTrait>(
    conn: &C,
    code: &str,
) -> AppResult<Option<Discount>> {
    Discounts::find()
        .filter(
            Condition::all()
                .add(Column::Code.eq(code))
                .add(Column::IsActive.eq(true)),
        )
        .one(conn)
        .await?
        .map(Discount::try_from)
        .transpose()
}

async fn find_any_by_code(state: &AppState, code: &str) -> AppResult<DiscountModel> {
    Discounts::find()
        .filter(Column::Code.eq(code))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Discount code"))
}

async fn ensure_code_free(state: &AppState, code: &str, except: Option<Uuid>) -> AppResult<()> {
    let mut condition = Condition::all().add(Column::Code.eq(code));
    if let Some(id) = except {
        condition = condition.add(Column::Id.ne(id));
    }
    let taken = Discounts::find().filter(condition).one(&state.orm).await?;
    if taken.is_some() {
        return Err(AppError::BadRequest(CODE_TAKEN.into()));
    }
    Ok(())
}

pub async fn list_active(
    state: &AppState,
    _admin: &AdminUser,
) -> AppResult<ApiResponse<DiscountList>> {
    let items = Discounts::find()
        .filter(Column::IsActive.eq(true))
        .order_by_asc(Column::ValidUntil)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Discount::try_from)
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Discounts", DiscountList { items }, Some(meta)))
}

/// Direct lookup: an expired code is a client error here, unlike checkout.
pub async fn get_by_code(state: &AppState, code: &str) -> AppResult<ApiResponse<Discount>> {
    let discount = find_active_by_code(&state.orm, code.trim())
        .await?
        .ok_or_else(|| AppError::not_found("Discount code"))?;

    if !discount.is_usable_at(Utc::now()) {
        return Err(AppError::BadRequest("Discount code has expired".into()));
    }

    Ok(ApiResponse::success("Discount", discount, None))
}

pub async fn create_discount(
    state: &AppState,
    admin: &AdminUser,
    payload: CreateDiscountRequest,
) -> AppResult<ApiResponse<Discount>> {
    payload.validate()?;
    let code = payload.code.trim().to_string();
    ensure_code_free(state, &code, None).await?;

    let discount = ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set(code),
        percentage: Set(payload.percentage.basis_points()),
        valid_until: Set(payload.valid_until.into()),
        is_active: Set(payload.is_active),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|err| AppError::unique_violation(err, CODE_TAKEN))?;
    tracing::info!(code = %discount.code, admin_id = %admin.id(), "discount created");

    audit::record(
        state,
        admin.id(),
        "discount_create",
        "discounts",
        serde_json::json!({ "discount_id": discount.id, "code": discount.code }),
    )
    .await;

    Ok(ApiResponse::success(
        "Discount created",
        Discount::try_from(discount)?,
        Some(Meta::empty()),
    ))
}

pub async fn update_discount(
    state: &AppState,
    admin: &AdminUser,
    code: &str,
    payload: UpdateDiscountRequest,
) -> AppResult<ApiResponse<Discount>> {
    let changes = payload.into_changes()?;
    let existing = find_any_by_code(state, code.trim()).await?;
    let id = existing.id;
    let mut active: ActiveModel = existing.into();

    for change in changes {
        match change {
            DiscountChange::Recode(new_code) => {
                ensure_code_free(state, &new_code, Some(id)).await?;
                active.code = Set(new_code);
            }
            DiscountChange::SetPercentage(percentage) => {
                active.percentage = Set(percentage.basis_points())
            }
            DiscountChange::SetValidUntil(valid_until) => {
                active.valid_until = Set(valid_until.into())
            }
            DiscountChange::SetActive(is_active) => active.is_active = Set(is_active),
        }
    }
    let discount = active
        .update(&state.orm)
        .await
        .map_err(|err| AppError::unique_violation(err, CODE_TAKEN))?;

    audit::record(
        state,
        admin.id(),
        "discount_update",
        "discounts",
        serde_json::json!({ "discount_id": discount.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Discount updated",
        Discount::try_from(discount)?,
        Some(Meta::empty()),
    ))
}

pub async fn delete_discount(
    state: &AppState,
    admin: &AdminUser,
    code: &str,
) -> AppResult<ApiResponse<Discount>> {
    let existing = find_any_by_code(state, code.trim()).await?;
    let mut active: ActiveModel = existing.into();
    active.is_active = Set(false);
    let discount = active.update(&state.orm).await?;
    tracing::info!(code = %discount.code, admin_id = %admin.id(), "discount deactivated");

    audit::record(
        state,
        admin.id(),
        "discount_delete",
        "discounts",
        serde_json::json!({ "discount_id": discount.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        Discount::try_from(discount)?,
        Some(Meta::empty()),
    ))
}
