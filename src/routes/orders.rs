use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::orders::{
        CreateOrderRequest, OrderAck, OrderListResponse, OrderResponse, UpdateOrderStatusRequest,
    },
    error::{AppError, AppResult},
    middleware::identity::SessionIdentity,
    routes::params::OrderListQuery,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_orders).post(create_order).patch(update_order_status),
        )
        .route("/{id}", get(get_order))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "List orders, most recent first", body = OrderListResponse)
    ),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<OrderListResponse>> {
    let orders = order_service::list_orders(&state, query).await?;
    Ok(Json(OrderListResponse { orders }))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = String, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Get one order", body = OrderResponse),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "Not Found"),
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<OrderResponse>> {
    let id = Uuid::parse_str(id.trim())
        .map_err(|_| AppError::Validation(format!("invalid order id {id}")))?;
    let order = order_service::get_order(&state, id).await?;
    Ok(Json(OrderResponse { order }))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderAck),
        (status = 400, description = "Validation failed"),
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    identity: SessionIdentity,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<OrderAck>)> {
    let order = order_service::create_order(&state, identity.0, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(OrderAck {
            success: true,
            order,
        }),
    ))
}

#[utoipa::path(
    patch,
    path = "/api/orders",
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = OrderAck),
        (status = 400, description = "Malformed id, unknown status, or invalid transition"),
        (status = 404, description = "Not Found"),
    ),
    tag = "Orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<OrderAck>> {
    let order = order_service::update_order_status(&state, payload).await?;
    Ok(Json(OrderAck {
        success: true,
        order,
    }))
}
