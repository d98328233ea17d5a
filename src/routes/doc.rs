use utoipa::{OpenApi, openapi::OpenApi as OpenApiSpec};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        orders::{
            CreateOrderRequest, CustomerDto, OrderAck, OrderDto, OrderItemDto, OrderItemRequest,
            OrderListResponse, OrderRef, OrderResponse, PaymentDetailsRequest, PaymentDto,
            ShippingAddressRequest, ShippingDto, UpdateOrderStatusRequest,
        },
        products::{
            CreateProductRequest, Deleted, ProductListResponse, ProductResponse,
            UpdateProductRequest,
        },
    },
    models::{OrderStatus, Product},
    routes::{health, orders, params, products},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        orders::list_orders,
        orders::get_order,
        orders::create_order,
        orders::update_order_status,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
    ),
    components(
        schemas(
            OrderStatus,
            Product,
            OrderDto,
            CustomerDto,
            OrderItemDto,
            ShippingDto,
            PaymentDto,
            OrderRef,
            OrderAck,
            OrderListResponse,
            OrderResponse,
            CreateOrderRequest,
            OrderItemRequest,
            ShippingAddressRequest,
            PaymentDetailsRequest,
            UpdateOrderStatusRequest,
            CreateProductRequest,
            UpdateProductRequest,
            ProductListResponse,
            ProductResponse,
            Deleted,
            params::Pagination,
            params::OrderListQuery,
            params::ProductQuery,
            health::HealthData,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Orders", description = "Order intake, status, and read endpoints"),
        (name = "Products", description = "Product catalog endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
