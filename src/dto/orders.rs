use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Acting user; falls back to the session identity when absent.
    pub user: Option<Uuid>,
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
    pub shipping_address: Option<ShippingAddressRequest>,
    pub payment_method: Option<String>,
    pub payment_details: Option<PaymentDetailsRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderItemRequest {
    pub product: Uuid,
    pub quantity: i32,
    /// Client-sent unit price. The catalog price is authoritative; a
    /// mismatch is logged and the sent value discarded.
    pub price: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddressRequest {
    pub full_name: Option<String>,
    pub address: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetailsRequest {
    pub transaction_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusRequest {
    pub order_id: String,
    pub status: String,
}

/// Identifier-and-status pair returned by the write endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderRef {
    pub id: Uuid,
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderAck {
    pub success: bool,
    pub order: OrderRef,
}

/// Flattened read model, decoupled from the storage schema. Unresolved
/// user/product references are normalized to neutral defaults in
/// `order_service::build_order_dto`, never at the call sites.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub id: Uuid,
    pub order_number: String,
    pub customer: CustomerDto,
    pub date: DateTime<Utc>,
    pub status: String,
    pub total: i64,
    pub items: Vec<OrderItemDto>,
    pub shipping: ShippingDto,
    pub payment: PaymentDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemDto {
    pub id: String,
    pub name: String,
    pub quantity: i32,
    pub price: i64,
    pub image: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShippingDto {
    pub address: String,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDto {
    pub method: String,
    pub transaction_id: Option<String>,
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderListResponse {
    pub orders: Vec<OrderDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub order: OrderDto,
}
