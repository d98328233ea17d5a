use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    db::OrmConn,
    dto::orders::{
        CreateOrderRequest, CustomerDto, OrderDto, OrderItemDto, OrderItemRequest, OrderRef,
        PaymentDto, ShippingDto, UpdateOrderStatusRequest,
    },
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
        },
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
        users::{Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    models::OrderStatus,
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

/// Intake payload after validation: required fields materialized, optionals
/// carried through as-is.
#[derive(Debug)]
struct IntakeOrder {
    items: Vec<OrderItemRequest>,
    shipping: ShippingAddress,
    payment_method: String,
    transaction_id: Option<String>,
}

#[derive(Debug)]
struct ShippingAddress {
    full_name: String,
    address: String,
    address_line2: Option<String>,
    city: String,
    state: Option<String>,
    postal_code: String,
    country: String,
    phone: Option<String>,
}

pub async fn create_order(
    state: &AppState,
    session_user: Option<Uuid>,
    payload: CreateOrderRequest,
) -> AppResult<OrderRef> {
    // Explicit user field wins over the session identity.
    let user_id = payload
        .user
        .or(session_user)
        .ok_or_else(|| AppError::Validation("user id required".into()))?;

    let intake = validate_intake(payload)?;

    let orm = state.db.orm().await?;

    let product_ids: Vec<Uuid> = intake.items.iter().map(|item| item.product).collect();
    let catalog: HashMap<Uuid, ProductModel> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .all(orm)
        .await?
        .into_iter()
        .map(|product| (product.id, product))
        .collect();

    // The catalog price is authoritative; client-sent prices are never
    // trusted for the total.
    let mut total_amount: i64 = 0;
    let mut lines: Vec<(Uuid, i32, i64)> = Vec::with_capacity(intake.items.len());
    for item in &intake.items {
        let product = catalog
            .get(&item.product)
            .ok_or_else(|| AppError::Validation(format!("unknown product {}", item.product)))?;
        if item.price.is_some_and(|sent| sent != product.price) {
            tracing::debug!(
                product_id = %product.id,
                sent = item.price,
                catalog = product.price,
                "ignoring client-sent price"
            );
        }
        total_amount += product.price * i64::from(item.quantity);
        lines.push((item.product, item.quantity, product.price));
    }

    let order_id = Uuid::new_v4();
    let txn = orm.begin().await?;

    let order = OrderActive {
        id: Set(order_id),
        order_number: Set(build_order_number(order_id)),
        user_id: Set(Some(user_id)),
        total_amount: Set(total_amount),
        status: Set(OrderStatus::Pending.as_str().into()),
        payment_method: Set(intake.payment_method),
        payment_status: Set("pending".into()),
        payment_transaction_id: Set(intake.transaction_id),
        shipping_full_name: Set(intake.shipping.full_name),
        shipping_address: Set(intake.shipping.address),
        shipping_address_line2: Set(intake.shipping.address_line2),
        shipping_city: Set(intake.shipping.city),
        shipping_state: Set(intake.shipping.state),
        shipping_postal_code: Set(intake.shipping.postal_code),
        shipping_country: Set(intake.shipping.country),
        shipping_phone: Set(intake.shipping.phone),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    for (product_id, quantity, price) in lines {
        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            price: Set(price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    tracing::info!(order_id = %order.id, order_number = %order.order_number, "order created");

    Ok(OrderRef {
        id: order.id,
        status: order.status,
    })
}

pub async fn update_order_status(
    state: &AppState,
    payload: UpdateOrderStatusRequest,
) -> AppResult<OrderRef> {
    let order_id = Uuid::parse_str(payload.order_id.trim())
        .map_err(|_| AppError::Validation(format!("invalid order id {}", payload.order_id)))?;
    let next = OrderStatus::parse(&payload.status)
        .ok_or_else(|| AppError::Validation(format!("unknown order status {}", payload.status)))?;

    let orm = state.db.orm().await?;
    let existing = Orders::find_by_id(order_id)
        .one(orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let current = OrderStatus::parse(&existing.status).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "order {} carries unrecognized status {:?}",
            existing.id,
            existing.status
        ))
    })?;

    if !current.can_transition_to(next) {
        return Err(AppError::Validation(format!(
            "invalid status transition {current} -> {next}"
        )));
    }

    let mut active: OrderActive = existing.into();
    active.status = Set(next.as_str().into());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(orm).await?;

    tracing::info!(order_id = %order.id, status = %order.status, "order status updated");

    Ok(OrderRef {
        id: order.id,
        status: order.status,
    })
}

pub async fn get_order(state: &AppState, id: Uuid) -> AppResult<OrderDto> {
    let orm = state.db.orm().await?;
    let order = Orders::find_by_id(id)
        .one(orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(orm)
        .await?;

    let user = match order.user_id {
        Some(user_id) => Users::find_by_id(user_id).one(orm).await?,
        None => None,
    };

    let products = load_products(orm, &items).await?;
    Ok(build_order_dto(order, items, user.as_ref(), &products))
}

pub async fn list_orders(state: &AppState, query: OrderListQuery) -> AppResult<Vec<OrderDto>> {
    let orm = state.db.orm().await?;
    let (_page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(orm)
        .await?;

    let order_ids: Vec<Uuid> = orders.iter().map(|order| order.id).collect();
    let mut items_by_order: HashMap<Uuid, Vec<OrderItemModel>> = HashMap::new();
    if !order_ids.is_empty() {
        let all_items = OrderItems::find()
            .filter(OrderItemCol::OrderId.is_in(order_ids))
            .all(orm)
            .await?;
        for item in all_items {
            items_by_order.entry(item.order_id).or_default().push(item);
        }
    }

    let user_ids: Vec<Uuid> = orders.iter().filter_map(|order| order.user_id).collect();
    let users: HashMap<Uuid, UserModel> = if user_ids.is_empty() {
        HashMap::new()
    } else {
        Users::find()
            .filter(UserCol::Id.is_in(user_ids))
            .all(orm)
            .await?
            .into_iter()
            .map(|user| (user.id, user))
            .collect()
    };

    let flat_items: Vec<OrderItemModel> = items_by_order.values().flatten().cloned().collect();
    let products = load_products(orm, &flat_items).await?;

    Ok(orders
        .into_iter()
        .map(|order| {
            let items = items_by_order.remove(&order.id).unwrap_or_default();
            let user = order.user_id.and_then(|user_id| users.get(&user_id));
            build_order_dto(order, items, user, &products)
        })
        .collect())
}

fn validate_intake(payload: CreateOrderRequest) -> Result<IntakeOrder, AppError> {
    let mut missing: Vec<String> = Vec::new();

    if payload.items.is_empty() {
        missing.push("items".into());
    }

    let shipping = match &payload.shipping_address {
        Some(addr) => {
            let mut absent: Vec<&str> = Vec::new();
            let resolved = ShippingAddress {
                full_name: require(&mut absent, "fullName", &addr.full_name),
                address: require(&mut absent, "address", &addr.address),
                address_line2: addr.address_line2.clone(),
                city: require(&mut absent, "city", &addr.city),
                state: addr.state.clone(),
                postal_code: require(&mut absent, "postalCode", &addr.postal_code),
                country: require(&mut absent, "country", &addr.country),
                phone: addr.phone.clone(),
            };
            if !absent.is_empty() {
                missing.push(format!("shippingAddress fields: {}", absent.join(", ")));
            }
            Some(resolved)
        }
        None => {
            missing.push("shippingAddress".into());
            None
        }
    };

    let payment_method = payload
        .payment_method
        .as_deref()
        .map(str::trim)
        .filter(|method| !method.is_empty())
        .map(str::to_owned);
    if payment_method.is_none() {
        missing.push("paymentMethod".into());
    }

    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    }

    if let Some(item) = payload.items.iter().find(|item| item.quantity < 1) {
        return Err(AppError::Validation(format!(
            "quantity for product {} must be at least 1",
            item.product
        )));
    }

    // Both are Some here: a missing one would have been collected above.
    let (Some(shipping), Some(payment_method)) = (shipping, payment_method) else {
        return Err(AppError::Validation("missing required fields".into()));
    };

    Ok(IntakeOrder {
        items: payload.items,
        shipping,
        payment_method,
        transaction_id: payload.payment_details.and_then(|details| details.transaction_id),
    })
}

fn require(absent: &mut Vec<&'static str>, name: &'static str, value: &Option<String>) -> String {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_owned(),
        _ => {
            absent.push(name);
            String::new()
        }
    }
}

async fn load_products(
    orm: &OrmConn,
    items: &[OrderItemModel],
) -> AppResult<HashMap<Uuid, ProductModel>> {
    let ids: Vec<Uuid> = items.iter().map(|item| item.product_id).collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(Products::find()
        .filter(ProdCol::Id.is_in(ids))
        .all(orm)
        .await?
        .into_iter()
        .map(|product| (product.id, product))
        .collect())
}

/// Single normalization step from storage rows to the flat read model.
/// Unresolved references never fail the read; they fall back to neutral
/// defaults.
fn build_order_dto(
    order: OrderModel,
    items: Vec<OrderItemModel>,
    user: Option<&UserModel>,
    products: &HashMap<Uuid, ProductModel>,
) -> OrderDto {
    let customer = match user {
        Some(user) => CustomerDto {
            id: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
        },
        None => CustomerDto {
            id: order.user_id.map(|id| id.to_string()).unwrap_or_default(),
            name: "Guest Customer".into(),
            email: "guest@example.com".into(),
            phone: None,
        },
    };

    let items = items
        .into_iter()
        .map(|item| match products.get(&item.product_id) {
            Some(product) => OrderItemDto {
                id: product.id.to_string(),
                name: product.name.clone(),
                quantity: item.quantity,
                price: item.price,
                image: product.images.first().cloned().unwrap_or_default(),
            },
            None => OrderItemDto {
                id: String::new(),
                name: "Product".into(),
                quantity: item.quantity,
                price: item.price,
                image: String::new(),
            },
        })
        .collect();

    OrderDto {
        id: order.id,
        order_number: order.order_number,
        customer,
        date: order.created_at.with_timezone(&Utc),
        status: order.status,
        total: order.total_amount,
        items,
        shipping: ShippingDto {
            address: order.shipping_address,
            city: order.shipping_city,
            state: order.shipping_state,
            postal_code: order.shipping_postal_code,
            country: order.shipping_country,
        },
        payment: PaymentDto {
            method: order.payment_method,
            transaction_id: order.payment_transaction_id,
            status: order.payment_status,
        },
    }
}

fn build_order_number(order_id: Uuid) -> String {
    let date = Utc::now().format("%Y%m%d");
    let id = order_id.to_string();
    format!("ORD-{}-{}", date, &id[..8])
}
