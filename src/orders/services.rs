use time::{OffsetDateTime, Time};
use tracing::info;
use uuid::Uuid;

use super::dto::{CreateOrderRequest, OrderDetails, OrderUser, UpdateStatusRequest};
use super::repo::{self, NewOrder, NewOrderItem, Order};
use crate::addresses::repo as addresses_repo;
use crate::cart::repo as cart_repo;
use crate::error::ApiError;
use crate::products::repo as products_repo;
use crate::state::AppState;
use crate::users::repo::User;

pub const ORDER_STATUSES: &[&str] = &[
    "PENDING",
    "CONFIRMED",
    "PROCESSING",
    "SHIPPED",
    "DELIVERED",
    "CANCELLED",
    "REFUNDED",
];

pub fn is_valid_status(status: &str) -> bool {
    ORDER_STATUSES.contains(&status)
}

/// Users may only cancel before the warehouse picks the order up.
pub fn user_cancellable(status: &str) -> bool {
    matches!(status, "PENDING" | "CONFIRMED")
}

pub fn start_of_day(now: OffsetDateTime) -> OffsetDateTime {
    now.replace_time(Time::MIDNIGHT)
}

pub fn start_of_month(now: OffsetDateTime) -> anyhow::Result<OffsetDateTime> {
    Ok(now.replace_day(1)?.replace_time(Time::MIDNIGHT))
}

pub fn start_of_year(now: OffsetDateTime) -> anyhow::Result<OffsetDateTime> {
    Ok(now.replace_ordinal(1)?.replace_time(Time::MIDNIGHT))
}

/// Places an order in one transaction: every line decrements stock with a
/// conditional UPDATE, so an insufficient line rolls the whole order back.
/// The user's cart is emptied in the same transaction.
pub async fn create_order(
    st: &AppState,
    user_id: Uuid,
    req: CreateOrderRequest,
) -> Result<OrderDetails, ApiError> {
    if req.items.is_empty() {
        return Err(ApiError::BadRequest("Order must contain items".into()));
    }
    if !matches!(req.payment_method.as_str(), "COD" | "ONLINE" | "WALLET") {
        return Err(ApiError::BadRequest("Invalid payment method".into()));
    }
    let address = addresses_repo::find_by_id(&st.db, user_id, req.shipping_address_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Shipping address not found".into()))?;

    let mut tx = st.db.begin().await?;
    let mut items_price = 0.0;
    let mut lines = Vec::with_capacity(req.items.len());
    for line in &req.items {
        if line.quantity < 1 {
            return Err(ApiError::BadRequest("Quantity must be at least 1".into()));
        }
        let product = products_repo::find_by_id(&st.db, line.product_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;

        if !repo::decrement_stock_tx(&mut tx, product.id, line.quantity).await? {
            return Err(ApiError::BadRequest(format!(
                "Insufficient stock for {}",
                product.name
            )));
        }

        let total_price = product.price * f64::from(line.quantity);
        items_price += total_price;
        lines.push(NewOrderItem {
            product_id: product.id,
            quantity: line.quantity,
            price: product.price,
            total_price,
            selected_size: line.selected_size.clone(),
            selected_color: line.selected_color.clone(),
            selected_ram: line.selected_ram.clone(),
        });
    }

    let order = repo::insert_order_tx(
        &mut tx,
        user_id,
        &NewOrder {
            shipping_address_id: address.id,
            payment_method: req.payment_method,
            items_price,
            tax_price: 0.0,
            shipping_price: 0.0,
            total_price: items_price,
            notes: req.notes,
        },
    )
    .await?;
    for line in &lines {
        repo::insert_item_tx(&mut tx, order.id, line).await?;
    }
    cart_repo::clear_tx(&mut tx, user_id).await?;
    tx.commit().await?;

    info!(user_id = %user_id, order_id = %order.id, total = order.total_price, "order placed");
    populate(st, order).await
}

/// Fills in the joined product lines, the buyer and the shipping address.
pub async fn populate(st: &AppState, order: Order) -> Result<OrderDetails, ApiError> {
    let items = repo::lines_for_order(&st.db, order.id).await?;
    let user = User::find_by_id(&st.db, order.user_id)
        .await?
        .map(OrderUser::from);
    let shipping_address = match order.shipping_address_id {
        Some(address_id) => addresses_repo::find_any_by_id(&st.db, address_id).await?,
        None => None,
    };
    Ok(OrderDetails {
        order,
        items,
        user,
        shipping_address,
    })
}

pub async fn cancel_order(
    st: &AppState,
    user_id: Uuid,
    order_id: Uuid,
    reason: &str,
) -> Result<OrderDetails, ApiError> {
    let mut tx = st.db.begin().await?;
    let order = repo::find_by_id_tx(&mut tx, order_id)
        .await?
        .filter(|o| o.user_id == user_id)
        .ok_or_else(|| ApiError::NotFound("Order not found".into()))?;
    if !user_cancellable(&order.status) {
        return Err(ApiError::BadRequest(format!(
            "Order in status {} can no longer be cancelled",
            order.status
        )));
    }

    repo::restore_stock_tx(&mut tx, order_id).await?;
    let order = repo::cancel_tx(&mut tx, order_id, reason)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".into()))?;
    tx.commit().await?;

    info!(user_id = %user_id, order_id = %order_id, "order cancelled by user");
    populate(st, order).await
}

/// Admin transition. Entering CANCELLED from any other state restores the
/// stock exactly once; repeated CANCELLED updates leave stock untouched.
pub async fn update_status(
    st: &AppState,
    order_id: Uuid,
    req: &UpdateStatusRequest,
) -> Result<OrderDetails, ApiError> {
    if !is_valid_status(&req.status) {
        return Err(ApiError::BadRequest(format!(
            "Invalid status: {}",
            req.status
        )));
    }

    let mut tx = st.db.begin().await?;
    let current = repo::find_by_id_tx(&mut tx, order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".into()))?;

    if req.status == "CANCELLED" && current.status != "CANCELLED" {
        repo::restore_stock_tx(&mut tx, order_id).await?;
    }
    let order = repo::set_status_tx(
        &mut tx,
        order_id,
        &req.status,
        req.tracking_number.as_deref(),
        req.notes.as_deref(),
        req.cancel_reason.as_deref(),
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Order not found".into()))?;
    tx.commit().await?;

    info!(order_id = %order_id, from = %current.status, to = %req.status, "order status updated");
    populate(st, order).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::dto::OrderLineRequest;
    use sqlx::PgPool;
    use time::macros::datetime;

    #[test]
    fn status_validation() {
        for s in ORDER_STATUSES {
            assert!(is_valid_status(s));
        }
        assert!(!is_valid_status("SHIPPED_BACK"));
        assert!(!is_valid_status("pending"));
    }

    #[test]
    fn user_can_cancel_only_early_states() {
        assert!(user_cancellable("PENDING"));
        assert!(user_cancellable("CONFIRMED"));
        assert!(!user_cancellable("PROCESSING"));
        assert!(!user_cancellable("SHIPPED"));
        assert!(!user_cancellable("DELIVERED"));
        assert!(!user_cancellable("CANCELLED"));
    }

    #[test]
    fn window_starts() {
        let now = datetime!(2026-08-26 13:45:12 UTC);
        assert_eq!(start_of_day(now), datetime!(2026-08-26 00:00:00 UTC));
        assert_eq!(start_of_month(now).unwrap(), datetime!(2026-08-01 00:00:00 UTC));
        assert_eq!(start_of_year(now).unwrap(), datetime!(2026-01-01 00:00:00 UTC));
    }

    #[test]
    fn window_starts_on_first_day() {
        let now = datetime!(2026-01-01 00:00:00 UTC);
        assert_eq!(start_of_month(now).unwrap(), now);
        assert_eq!(start_of_year(now).unwrap(), now);
    }

    async fn seed_user(db: &PgPool) -> Uuid {
        let (id,): (Uuid,) = sqlx::query_as(
            "INSERT INTO users (name, email, password_hash)
             VALUES ('Test Buyer', $1, 'x') RETURNING id",
        )
        .bind(format!("{}@test.local", Uuid::new_v4()))
        .fetch_one(db)
        .await
        .unwrap();
        id
    }

    async fn seed_address(db: &PgPool, user_id: Uuid) -> Uuid {
        let (id,): (Uuid,) = sqlx::query_as(
            "INSERT INTO addresses
                (user_id, full_name, phone, address_line1, city, state, postal_code, country)
             VALUES ($1, 'Test Buyer', '555-0100', '1 Main St', 'Metropolis', 'NY',
                     '10001', 'US')
             RETURNING id",
        )
        .bind(user_id)
        .fetch_one(db)
        .await
        .unwrap();
        id
    }

    async fn seed_product(db: &PgPool, name: &str, stock: i32) -> Uuid {
        let (id,): (Uuid,) = sqlx::query_as(
            "INSERT INTO products (name, price, count_in_stock)
             VALUES ($1, 10.0, $2) RETURNING id",
        )
        .bind(name)
        .bind(stock)
        .fetch_one(db)
        .await
        .unwrap();
        id
    }

    async fn stock_of(db: &PgPool, product_id: Uuid) -> i32 {
        let (n,): (i32,) =
            sqlx::query_as("SELECT count_in_stock FROM products WHERE id = $1")
                .bind(product_id)
                .fetch_one(db)
                .await
                .unwrap();
        n
    }

    fn line(product_id: Uuid, quantity: i32) -> OrderLineRequest {
        OrderLineRequest {
            product_id,
            quantity,
            selected_size: String::new(),
            selected_color: String::new(),
            selected_ram: String::new(),
        }
    }

    fn order_request(address_id: Uuid, lines: Vec<OrderLineRequest>) -> CreateOrderRequest {
        CreateOrderRequest {
            items: lines,
            shipping_address_id: address_id,
            payment_method: "COD".into(),
            notes: String::new(),
        }
    }

    #[sqlx::test]
    async fn oversell_is_rejected_and_stock_unchanged(pool: PgPool) {
        let st = AppState::for_tests(pool.clone());
        let user = seed_user(&pool).await;
        let address = seed_address(&pool, user).await;
        let product = seed_product(&pool, "Widget", 5).await;

        create_order(&st, user, order_request(address, vec![line(product, 3)]))
            .await
            .unwrap();
        assert_eq!(stock_of(&pool, product).await, 2);

        let err = create_order(&st, user, order_request(address, vec![line(product, 3)]))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
        assert_eq!(stock_of(&pool, product).await, 2);

        let orders = repo::count_for_user(&pool, user).await.unwrap();
        assert_eq!(orders, 1);
    }

    #[sqlx::test]
    async fn one_short_line_rolls_back_the_whole_order(pool: PgPool) {
        let st = AppState::for_tests(pool.clone());
        let user = seed_user(&pool).await;
        let address = seed_address(&pool, user).await;
        let plenty = seed_product(&pool, "Plenty", 5).await;
        let scarce = seed_product(&pool, "Scarce", 1).await;

        let err = create_order(
            &st,
            user,
            order_request(address, vec![line(plenty, 2), line(scarce, 3)]),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        assert_eq!(stock_of(&pool, plenty).await, 5);
        assert_eq!(stock_of(&pool, scarce).await, 1);
        assert_eq!(repo::count_for_user(&pool, user).await.unwrap(), 0);
    }

    #[sqlx::test]
    async fn user_cancel_restores_stock(pool: PgPool) {
        let st = AppState::for_tests(pool.clone());
        let user = seed_user(&pool).await;
        let address = seed_address(&pool, user).await;
        let product = seed_product(&pool, "Widget", 5).await;

        let details = create_order(&st, user, order_request(address, vec![line(product, 3)]))
            .await
            .unwrap();
        assert_eq!(stock_of(&pool, product).await, 2);

        let cancelled = cancel_order(&st, user, details.order.id, "Changed my mind")
            .await
            .unwrap();
        assert_eq!(cancelled.order.status, "CANCELLED");
        assert_eq!(stock_of(&pool, product).await, 5);

        // Already cancelled, so no second restore.
        let err = cancel_order(&st, user, details.order.id, "Again")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
        assert_eq!(stock_of(&pool, product).await, 5);
    }

    #[sqlx::test]
    async fn admin_cancel_restores_once_and_keeps_reason(pool: PgPool) {
        let st = AppState::for_tests(pool.clone());
        let user = seed_user(&pool).await;
        let address = seed_address(&pool, user).await;
        let product = seed_product(&pool, "Widget", 5).await;

        let details = create_order(&st, user, order_request(address, vec![line(product, 2)]))
            .await
            .unwrap();
        assert_eq!(stock_of(&pool, product).await, 3);

        let req = UpdateStatusRequest {
            status: "CANCELLED".into(),
            tracking_number: None,
            notes: Some("Buyer unreachable".into()),
            cancel_reason: Some("Damaged in warehouse".into()),
        };
        let cancelled = update_status(&st, details.order.id, &req).await.unwrap();
        assert_eq!(cancelled.order.status, "CANCELLED");
        assert_eq!(cancelled.order.cancel_reason, "Damaged in warehouse");
        assert_eq!(cancelled.order.notes, "Buyer unreachable");
        assert_eq!(stock_of(&pool, product).await, 5);

        let again = update_status(&st, details.order.id, &req).await.unwrap();
        assert_eq!(again.order.status, "CANCELLED");
        assert_eq!(stock_of(&pool, product).await, 5);
    }
}
