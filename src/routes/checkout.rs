use axum::{Json, Router, extract::State, http::StatusCode, routing::post};

use crate::{
    dto::checkout::{CheckoutRequest, CheckoutResponse, QuoteRequest},
    error::AppResult,
    extract::AppJson,
    middleware::auth::CurrentUser,
    pricing::Quote,
    response::ApiResponse,
    services::checkout_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout))
        .route("/quote", post(quote))
}

#[utoipa::path(
    post,
    path = "/api/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order placed from server-side prices", body = ApiResponse<CheckoutResponse>),
        (status = 400, description = "Invalid cart, address or unknown product"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn checkout(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(payload): AppJson<CheckoutRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CheckoutResponse>>)> {
    let resp = checkout_service::checkout(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

/// Prices a cart, tax included, without placing an order.
#[utoipa::path(
    post,
    path = "/api/checkout/quote",
    request_body = QuoteRequest,
    responses(
        (status = 200, description = "Price breakdown", body = ApiResponse<Quote>),
        (status = 400, description = "Invalid cart or unknown product"),
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn quote(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(payload): AppJson<QuoteRequest>,
) -> AppResult<Json<ApiResponse<Quote>>> {
    let resp = checkout_service::quote(&state, &user, payload).await?;
    Ok(Json(resp))
}
