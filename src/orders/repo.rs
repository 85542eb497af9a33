use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub shipping_address_id: Option<Uuid>,
    pub payment_method: String,
    pub items_price: f64,
    pub tax_price: f64,
    pub shipping_price: f64,
    pub total_price: f64,
    pub status: String,
    pub is_paid: bool,
    pub paid_at: Option<OffsetDateTime>,
    pub is_delivered: bool,
    pub delivered_at: Option<OffsetDateTime>,
    pub tracking_number: String,
    pub notes: String,
    pub cancel_reason: String,
    pub created_at: OffsetDateTime,
}

const ORDER_COLS: &str = "id, user_id, shipping_address_id, payment_method, items_price, \
     tax_price, shipping_price, total_price, status, is_paid, paid_at, is_delivered, \
     delivered_at, tracking_number, notes, cancel_reason, created_at";

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Option<Uuid>,
    pub quantity: i32,
    pub price: f64,
    pub total_price: f64,
    pub selected_size: String,
    pub selected_color: String,
    pub selected_ram: String,
}

/// Order line joined with the current product name and image. The product
/// may be gone by now; the line keeps its prices either way.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub image: String,
    pub quantity: i32,
    pub price: f64,
    pub total_price: f64,
    pub selected_size: String,
    pub selected_color: String,
    pub selected_ram: String,
}

pub struct NewOrder {
    pub shipping_address_id: Uuid,
    pub payment_method: String,
    pub items_price: f64,
    pub tax_price: f64,
    pub shipping_price: f64,
    pub total_price: f64,
    pub notes: String,
}

pub struct NewOrderItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: f64,
    pub total_price: f64,
    pub selected_size: String,
    pub selected_color: String,
    pub selected_ram: String,
}

#[derive(Debug, Default)]
pub struct OrderFilter {
    pub status: Option<String>,
    pub search: Option<String>,
}

fn apply_filters<'a>(qb: &mut QueryBuilder<'a, Postgres>, f: &'a OrderFilter) {
    if let Some(status) = &f.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(search) = &f.search {
        qb.push(" AND (id::text ILIKE '%' || ")
            .push_bind(search)
            .push(" || '%' OR tracking_number ILIKE '%' || ")
            .push_bind(search)
            .push(" || '%')");
    }
}

pub async fn insert_order_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    o: &NewOrder,
) -> anyhow::Result<Order> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "INSERT INTO orders
            (user_id, shipping_address_id, payment_method, items_price, tax_price,
             shipping_price, total_price, notes)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING {ORDER_COLS}"
    ))
    .bind(user_id)
    .bind(o.shipping_address_id)
    .bind(&o.payment_method)
    .bind(o.items_price)
    .bind(o.tax_price)
    .bind(o.shipping_price)
    .bind(o.total_price)
    .bind(&o.notes)
    .fetch_one(&mut **tx)
    .await?;
    Ok(order)
}

pub async fn insert_item_tx(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
    item: &NewOrderItem,
) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO order_items
            (order_id, product_id, quantity, price, total_price,
             selected_size, selected_color, selected_ram)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(order_id)
    .bind(item.product_id)
    .bind(item.quantity)
    .bind(item.price)
    .bind(item.total_price)
    .bind(&item.selected_size)
    .bind(&item.selected_color)
    .bind(&item.selected_ram)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// One conditional UPDATE per line: succeeds only while enough stock is
/// left, so two concurrent orders can never both take the last unit.
pub async fn decrement_stock_tx(
    tx: &mut Transaction<'_, Postgres>,
    product_id: Uuid,
    quantity: i32,
) -> anyhow::Result<bool> {
    let done = sqlx::query(
        "UPDATE products SET count_in_stock = count_in_stock - $2
         WHERE id = $1 AND count_in_stock >= $2",
    )
    .bind(product_id)
    .bind(quantity)
    .execute(&mut **tx)
    .await?;
    Ok(done.rows_affected() > 0)
}

pub async fn restore_stock_tx(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
) -> anyhow::Result<()> {
    sqlx::query(
        "UPDATE products p
         SET count_in_stock = p.count_in_stock + oi.quantity
         FROM order_items oi
         WHERE oi.order_id = $1 AND p.id = oi.product_id",
    )
    .bind(order_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLS} FROM orders WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(order)
}

pub async fn find_by_id_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> anyhow::Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLS} FROM orders WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(order)
}

pub async fn lines_for_order(db: &PgPool, order_id: Uuid) -> anyhow::Result<Vec<OrderLine>> {
    let rows = sqlx::query_as::<_, OrderLine>(
        "SELECT oi.id, oi.product_id,
                COALESCE(p.name, '') AS product_name,
                COALESCE(p.images[1], '') AS image,
                oi.quantity, oi.price, oi.total_price,
                oi.selected_size, oi.selected_color, oi.selected_ram
         FROM order_items oi
         LEFT JOIN products p ON p.id = oi.product_id
         WHERE oi.order_id = $1",
    )
    .bind(order_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_for_user(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Order>> {
    let rows = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLS} FROM orders
         WHERE user_id = $1
         ORDER BY created_at DESC LIMIT $2 OFFSET $3"
    ))
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn count_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<i64> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(db)
        .await?;
    Ok(n)
}

pub async fn list_all(
    db: &PgPool,
    filter: &OrderFilter,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Order>> {
    let mut qb = QueryBuilder::<Postgres>::new(format!(
        "SELECT {ORDER_COLS} FROM orders WHERE TRUE"
    ));
    apply_filters(&mut qb, filter);
    qb.push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let rows = qb.build_query_as::<Order>().fetch_all(db).await?;
    Ok(rows)
}

pub async fn count_all(db: &PgPool, filter: &OrderFilter) -> anyhow::Result<i64> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders WHERE TRUE");
    apply_filters(&mut qb, filter);
    let (n,): (i64,) = qb.build_query_as().fetch_one(db).await?;
    Ok(n)
}

pub async fn set_status_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    status: &str,
    tracking_number: Option<&str>,
    notes: Option<&str>,
    cancel_reason: Option<&str>,
) -> anyhow::Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "UPDATE orders SET
            status = $2,
            tracking_number = COALESCE($3, tracking_number),
            notes = COALESCE($4, notes),
            cancel_reason = COALESCE($5, cancel_reason),
            is_delivered = ($2 = 'DELIVERED') OR is_delivered,
            delivered_at = CASE WHEN $2 = 'DELIVERED' AND delivered_at IS NULL
                                THEN now() ELSE delivered_at END
         WHERE id = $1
         RETURNING {ORDER_COLS}"
    ))
    .bind(id)
    .bind(status)
    .bind(tracking_number)
    .bind(notes)
    .bind(cancel_reason)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(order)
}

pub async fn cancel_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    reason: &str,
) -> anyhow::Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "UPDATE orders SET status = 'CANCELLED', cancel_reason = $2
         WHERE id = $1
         RETURNING {ORDER_COLS}"
    ))
    .bind(id)
    .bind(reason)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(order)
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_orders: i64,
    pub today_orders: i64,
    pub month_orders: i64,
    pub year_orders: i64,
    pub pending_orders: i64,
    pub delivered_orders: i64,
    pub cancelled_orders: i64,
    pub total_revenue: f64,
    pub today_revenue: f64,
    pub month_revenue: f64,
    pub year_revenue: f64,
}

/// Single scan; revenue sums exclude cancelled orders.
pub async fn stats(
    db: &PgPool,
    today: OffsetDateTime,
    month: OffsetDateTime,
    year: OffsetDateTime,
) -> anyhow::Result<OrderStats> {
    let stats = sqlx::query_as::<_, OrderStats>(
        "SELECT
            COUNT(*) AS total_orders,
            COUNT(*) FILTER (WHERE created_at >= $1) AS today_orders,
            COUNT(*) FILTER (WHERE created_at >= $2) AS month_orders,
            COUNT(*) FILTER (WHERE created_at >= $3) AS year_orders,
            COUNT(*) FILTER (WHERE status = 'PENDING') AS pending_orders,
            COUNT(*) FILTER (WHERE status = 'DELIVERED') AS delivered_orders,
            COUNT(*) FILTER (WHERE status = 'CANCELLED') AS cancelled_orders,
            COALESCE(SUM(total_price) FILTER (WHERE status <> 'CANCELLED'), 0)
                AS total_revenue,
            COALESCE(SUM(total_price)
                FILTER (WHERE status <> 'CANCELLED' AND created_at >= $1), 0)
                AS today_revenue,
            COALESCE(SUM(total_price)
                FILTER (WHERE status <> 'CANCELLED' AND created_at >= $2), 0)
                AS month_revenue,
            COALESCE(SUM(total_price)
                FILTER (WHERE status <> 'CANCELLED' AND created_at >= $3), 0)
                AS year_revenue
         FROM orders",
    )
    .bind(today)
    .bind(month)
    .bind(year)
    .fetch_one(db)
    .await?;
    Ok(stats)
}
