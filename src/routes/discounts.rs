use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::discounts::{CreateDiscountRequest, DiscountList, UpdateDiscountRequest},
    error::AppResult,
    extract::AppJson,
    middleware::auth::{AdminUser, AuthUser},
    models::Discount,
    response::ApiResponse,
    services::discount_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_discounts).post(create_discount))
        .route(
            "/{code}",
            get(get_discount)
                .put(update_discount)
                .delete(delete_discount),
        )
}

#[utoipa::path(
    get,
    path = "/api/discounts",
    responses(
        (status = 200, description = "Active discounts, soonest expiry first", body = ApiResponse<DiscountList>),
        (status = 403, description = "Admin access required"),
    ),
    security(("bearer_auth" = [])),
    tag = "Discounts"
)]
pub async fn list_discounts(
    State(state): State<AppState>,
    admin: AdminUser,
) -> AppResult<Json<ApiResponse<DiscountList>>> {
    let resp = discount_service::list_active(&state, &admin).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/discounts/{code}",
    params(
        ("code" = String, Path, description = "Discount code")
    ),
    responses(
        (status = 200, description = "Usable discount", body = ApiResponse<Discount>),
        (status = 400, description = "Discount code has expired"),
        (status = 404, description = "Discount code not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Discounts"
)]
pub async fn get_discount(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(code): Path<String>,
) -> AppResult<Json<ApiResponse<Discount>>> {
    let resp = discount_service::get_by_code(&state, &code).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/discounts",
    request_body = CreateDiscountRequest,
    responses(
        (status = 201, description = "Discount created", body = ApiResponse<Discount>),
        (status = 400, description = "Invalid discount data"),
        (status = 403, description = "Admin access required"),
    ),
    security(("bearer_auth" = [])),
    tag = "Discounts"
)]
pub async fn create_discount(
    State(state): State<AppState>,
    admin: AdminUser,
    AppJson(payload): AppJson<CreateDiscountRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Discount>>)> {
    let resp = discount_service::create_discount(&state, &admin, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/discounts/{code}",
    params(
        ("code" = String, Path, description = "Discount code")
    ),
    request_body = UpdateDiscountRequest,
    responses(
        (status = 200, description = "Discount updated", body = ApiResponse<Discount>),
        (status = 400, description = "Invalid discount data"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Discount code not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Discounts"
)]
pub async fn update_discount(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(code): Path<String>,
    AppJson(payload): AppJson<UpdateDiscountRequest>,
) -> AppResult<Json<ApiResponse<Discount>>> {
    let resp = discount_service::update_discount(&state, &admin, &code, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/discounts/{code}",
    params(
        ("code" = String, Path, description = "Discount code")
    ),
    responses(
        (status = 200, description = "Discount deactivated", body = ApiResponse<Discount>),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Discount code not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Discounts"
)]
pub async fn delete_discount(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(code): Path<String>,
) -> AppResult<Json<ApiResponse<Discount>>> {
    let resp = discount_service::delete_discount(&state, &admin, &code).await?;
    Ok(Json(resp))
}
