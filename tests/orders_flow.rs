use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use uuid::Uuid;

use storefront_order_api::{
    db::Db,
    dto::orders::{
        CreateOrderRequest, OrderItemRequest, PaymentDetailsRequest, ShippingAddressRequest,
        UpdateOrderStatusRequest,
    },
    entity::{products::ActiveModel as ProductActive, users::ActiveModel as UserActive},
    error::AppError,
    routes::params::{OrderListQuery, Pagination},
    services::{order_service, product_service},
    state::AppState,
};

// Both tests truncate the same database; run them one at a time.
static DB_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

// Allow skipping when no DB is configured in the environment.
fn test_database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
}

// Integration flow: intake -> read with joins -> status transitions.
#[tokio::test]
async fn order_intake_read_and_status_flow() -> anyhow::Result<()> {
    let Some(database_url) = test_database_url() else {
        eprintln!(
            "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
        );
        return Ok(());
    };

    let _guard = DB_LOCK.lock().await;
    let state = setup_state(&database_url).await?;

    // Seed a known user and two catalog products.
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set("Asha Verma".into()),
        email: Set("asha@example.com".into()),
        phone: Set(Some("+91 98100 00000".into())),
        role: Set("customer".into()),
        created_at: NotSet,
    }
    .insert(state.db.orm().await?)
    .await?;

    let mug = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set("Ceramic Mug".into()),
        description: Set(Some("Hand-glazed stoneware mug".into())),
        price: Set(450),
        stock: Set(100),
        images: Set(vec!["https://cdn.example.com/mug.jpg".into()]),
        created_at: NotSet,
    }
    .insert(state.db.orm().await?)
    .await?;

    let tote = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set("Linen Tote".into()),
        description: Set(None),
        price: Set(1200),
        stock: Set(50),
        images: Set(vec![]),
        created_at: NotSet,
    }
    .insert(state.db.orm().await?)
    .await?;

    // Intake: the client-sent price is ignored, the total comes from the
    // catalog (2 * 450 + 1 * 1200).
    let created = order_service::create_order(
        &state,
        None,
        CreateOrderRequest {
            user: Some(user.id),
            items: vec![
                OrderItemRequest {
                    product: mug.id,
                    quantity: 2,
                    price: Some(1),
                },
                OrderItemRequest {
                    product: tote.id,
                    quantity: 1,
                    price: None,
                },
            ],
            shipping_address: Some(address()),
            payment_method: Some("COD".into()),
            payment_details: Some(PaymentDetailsRequest {
                transaction_id: Some("txn-100".into()),
            }),
        },
    )
    .await?;
    assert_eq!(created.status, "pending");

    // Read-one joins user and products into the flat DTO.
    let dto = order_service::get_order(&state, created.id).await?;
    assert_eq!(dto.id, created.id);
    assert!(dto.order_number.starts_with("ORD-"));
    assert_eq!(dto.total, 2 * 450 + 1200);
    assert_eq!(dto.status, "pending");
    assert_eq!(dto.customer.name, "Asha Verma");
    assert_eq!(dto.customer.email, "asha@example.com");
    assert_eq!(dto.items.len(), 2);
    let mug_line = dto
        .items
        .iter()
        .find(|item| item.id == mug.id.to_string())
        .expect("mug line");
    assert_eq!(mug_line.name, "Ceramic Mug");
    assert_eq!(mug_line.quantity, 2);
    assert_eq!(mug_line.price, 450);
    assert_eq!(mug_line.image, "https://cdn.example.com/mug.jpg");
    assert_eq!(dto.shipping.city, "Bengaluru");
    assert_eq!(dto.payment.method, "COD");
    assert_eq!(dto.payment.transaction_id.as_deref(), Some("txn-100"));
    assert_eq!(dto.payment.status, "pending");

    // Session identity is the fallback when the payload has no user field.
    let via_session = order_service::create_order(
        &state,
        Some(user.id),
        CreateOrderRequest {
            user: None,
            items: vec![OrderItemRequest {
                product: mug.id,
                quantity: 1,
                price: None,
            }],
            shipping_address: Some(address()),
            payment_method: Some("card".into()),
            payment_details: None,
        },
    )
    .await?;

    // Neither payload user nor session identity -> rejected before any write.
    let err = order_service::create_order(
        &state,
        None,
        CreateOrderRequest {
            user: None,
            items: vec![OrderItemRequest {
                product: mug.id,
                quantity: 1,
                price: None,
            }],
            shipping_address: Some(address()),
            payment_method: Some("COD".into()),
            payment_details: None,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(expect_validation(err), "user id required");

    // Unknown product cannot be priced.
    let ghost = Uuid::new_v4();
    let err = order_service::create_order(
        &state,
        Some(user.id),
        CreateOrderRequest {
            user: None,
            items: vec![OrderItemRequest {
                product: ghost,
                quantity: 1,
                price: None,
            }],
            shipping_address: Some(address()),
            payment_method: Some("COD".into()),
            payment_details: None,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(expect_validation(err), format!("unknown product {ghost}"));

    // Read-all: most recent first.
    let orders = order_service::list_orders(&state, all_orders_query()).await?;
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].id, via_session.id);
    assert_eq!(orders[1].id, created.id);
    assert!(orders[0].date >= orders[1].date);

    // Status lifecycle: pending -> confirmed -> shipped -> delivered.
    for next in ["confirmed", "shipped", "delivered"] {
        let updated = order_service::update_order_status(
            &state,
            UpdateOrderStatusRequest {
                order_id: created.id.to_string(),
                status: next.into(),
            },
        )
        .await?;
        assert_eq!(updated.status, next);
    }
    let dto = order_service::get_order(&state, created.id).await?;
    assert_eq!(dto.status, "delivered");

    // Delivered is terminal.
    let err = order_service::update_order_status(
        &state,
        UpdateOrderStatusRequest {
            order_id: created.id.to_string(),
            status: "pending".into(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(
        expect_validation(err),
        "invalid status transition delivered -> pending"
    );

    // Skipping a state is not allowed either.
    let err = order_service::update_order_status(
        &state,
        UpdateOrderStatusRequest {
            order_id: via_session.id.to_string(),
            status: "delivered".into(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(
        expect_validation(err),
        "invalid status transition pending -> delivered"
    );

    // Cancellation from pending, then terminal.
    order_service::update_order_status(
        &state,
        UpdateOrderStatusRequest {
            order_id: via_session.id.to_string(),
            status: "cancelled".into(),
        },
    )
    .await?;
    let err = order_service::update_order_status(
        &state,
        UpdateOrderStatusRequest {
            order_id: via_session.id.to_string(),
            status: "confirmed".into(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(
        expect_validation(err),
        "invalid status transition cancelled -> confirmed"
    );

    // Malformed id, unknown status token, unknown id.
    let err = order_service::update_order_status(
        &state,
        UpdateOrderStatusRequest {
            order_id: "not-a-uuid".into(),
            status: "confirmed".into(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(expect_validation(err), "invalid order id not-a-uuid");

    let err = order_service::update_order_status(
        &state,
        UpdateOrderStatusRequest {
            order_id: created.id.to_string(),
            status: "paid".into(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(expect_validation(err), "unknown order status paid");

    let missing = Uuid::new_v4();
    let err = order_service::update_order_status(
        &state,
        UpdateOrderStatusRequest {
            order_id: missing.to_string(),
            status: "confirmed".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound), "got {err:?}");

    let err = order_service::get_order(&state, missing).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound), "got {err:?}");

    // Status filter on read-all.
    let delivered = order_service::list_orders(
        &state,
        OrderListQuery {
            pagination: Pagination {
                page: None,
                per_page: None,
            },
            status: Some("delivered".into()),
            sort_order: None,
        },
    )
    .await?;
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].id, created.id);

    Ok(())
}

// Orders referencing users the directory does not know, or products that
// left the catalog, read back with neutral defaults instead of failing.
#[tokio::test]
async fn unresolved_references_read_back_with_defaults() -> anyhow::Result<()> {
    let Some(database_url) = test_database_url() else {
        eprintln!(
            "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
        );
        return Ok(());
    };

    let _guard = DB_LOCK.lock().await;
    let state = setup_state(&database_url).await?;

    let lamp = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set("Desk Lamp".into()),
        description: Set(None),
        price: Set(3500),
        stock: Set(5),
        images: Set(vec!["https://cdn.example.com/lamp.jpg".into()]),
        created_at: NotSet,
    }
    .insert(state.db.orm().await?)
    .await?;

    // The intake never checks the user directory; any id is accepted.
    let stranger = Uuid::new_v4();
    let created = order_service::create_order(
        &state,
        Some(stranger),
        CreateOrderRequest {
            user: None,
            items: vec![OrderItemRequest {
                product: lamp.id,
                quantity: 1,
                price: None,
            }],
            shipping_address: Some(address()),
            payment_method: Some("COD".into()),
            payment_details: None,
        },
    )
    .await?;

    let dto = order_service::get_order(&state, created.id).await?;
    assert_eq!(dto.customer.id, stranger.to_string());
    assert_eq!(dto.customer.name, "Guest Customer");
    assert_eq!(dto.customer.email, "guest@example.com");
    assert_eq!(dto.items[0].name, "Desk Lamp");

    // Remove the product from the catalog; the order still reads, with the
    // item backfilled.
    product_service::delete_product(&state, lamp.id).await?;
    let dto = order_service::get_order(&state, created.id).await?;
    assert_eq!(dto.items.len(), 1);
    assert_eq!(dto.items[0].id, "");
    assert_eq!(dto.items[0].name, "Product");
    assert_eq!(dto.items[0].image, "");
    assert_eq!(dto.items[0].price, 3500);

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let db = Db::new(database_url.to_string());
    sqlx::migrate!("./migrations").run(db.pool().await?).await?;

    // Clean tables between runs
    let orm = db.orm().await?;
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, orders, products, users CASCADE",
    ))
    .await?;

    Ok(AppState::new(db))
}

fn address() -> ShippingAddressRequest {
    ShippingAddressRequest {
        full_name: Some("Asha Verma".into()),
        address: Some("1 MG Road".into()),
        address_line2: None,
        city: Some("Bengaluru".into()),
        state: Some("KA".into()),
        postal_code: Some("560001".into()),
        country: Some("IN".into()),
        phone: None,
    }
}

fn all_orders_query() -> OrderListQuery {
    OrderListQuery {
        pagination: Pagination {
            page: None,
            per_page: None,
        },
        status: None,
        sort_order: None,
    }
}

fn expect_validation(err: AppError) -> String {
    match err {
        AppError::Validation(msg) => msg,
        other => panic!("expected validation error, got {other:?}"),
    }
}
