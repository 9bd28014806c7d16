use chrono::{Duration, Utc};
use log::debug;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{DailyOrderCount, DrinkCount, ExportPeriod, NewOrder, Order, OrderId, OrderStatus},
    traits::OrderFlowError,
};

/// Inserts a new order using the given connection. This is not atomic on its own. Embed this call
/// inside a transaction and pass `&mut *tx` as the connection argument to compose it with the
/// loyalty and referral updates.
pub async fn insert_order(order: &NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderFlowError> {
    let inserted = sqlx::query_as(
        r#"
            INSERT INTO orders (
                user_id,
                username,
                first_name,
                drink,
                syrup,
                cup,
                croissant,
                pickup_minutes,
                is_free,
                total_price,
                payment_status,
                payment_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *;
        "#,
    )
    .bind(order.customer.telegram_id)
    .bind(&order.customer.username)
    .bind(&order.customer.first_name)
    .bind(order.items.drink)
    .bind(order.items.syrup)
    .bind(order.items.cup)
    .bind(order.items.croissant)
    .bind(order.items.pickup)
    .bind(order.is_free)
    .bind(order.total_price())
    .bind(order.payment_status())
    .bind(&order.payment_id)
    .fetch_one(conn)
    .await?;
    let order: Order = inserted;
    debug!("📝️ Order #{} inserted for customer {}", order.order_id, order.user_id);
    Ok(order)
}

pub async fn fetch_order(order_id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

/// Everything the barista still cares about: all orders that have not been completed, oldest
/// first so the board reads top-down in arrival order.
pub async fn active_orders(conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE status != 'completed' ORDER BY timestamp ASC")
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

pub async fn set_order_status(
    order_id: OrderId,
    status: OrderStatus,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderFlowError> {
    let order: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders
            SET status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $2
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    let order = order.ok_or(OrderFlowError::OrderNotFound(order_id))?;
    debug!("📝️ Order #{order_id} moved to '{status}'");
    Ok(order)
}

/// Whether the order is still inside its cancellation grace window.
pub fn within_grace_window(order: &Order, grace: Duration) -> bool {
    Utc::now() - order.timestamp <= grace
}

//--------------------------------------     analytics       ---------------------------------------------------------

pub async fn count_orders(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM orders").fetch_one(conn).await?;
    Ok(count)
}

pub async fn count_free_orders(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE is_free = TRUE").fetch_one(conn).await?;
    Ok(count)
}

pub async fn orders_per_day(conn: &mut SqliteConnection) -> Result<Vec<DailyOrderCount>, sqlx::Error> {
    let counts = sqlx::query_as(
        r#"
            SELECT DATE(created_at) AS date, COUNT(*) AS count
            FROM orders
            GROUP BY DATE(created_at)
            ORDER BY date ASC;
        "#,
    )
    .fetch_all(conn)
    .await?;
    Ok(counts)
}

pub async fn top_drinks(limit: i64, conn: &mut SqliteConnection) -> Result<Vec<DrinkCount>, sqlx::Error> {
    let counts = sqlx::query_as(
        r#"
            SELECT drink, COUNT(*) AS count
            FROM orders
            GROUP BY drink
            ORDER BY count DESC
            LIMIT $1;
        "#,
    )
    .bind(limit)
    .fetch_all(conn)
    .await?;
    Ok(counts)
}

/// Orders inside the export window, newest first. Weeks start on Monday, so "this week" reaches
/// back to the most recent Monday.
pub async fn orders_for_export(period: ExportPeriod, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    match period {
        ExportPeriod::Today => {
            builder.push("WHERE DATE(created_at) = DATE('now') ");
        },
        ExportPeriod::ThisWeek => {
            builder.push("WHERE DATE(created_at) >= DATE('now', 'weekday 0', '-6 days') ");
        },
        ExportPeriod::ThisMonth => {
            builder.push("WHERE DATE(created_at) >= DATE('now', 'start of month') ");
        },
        ExportPeriod::All => {},
        ExportPeriod::On(date) => {
            builder.push("WHERE DATE(created_at) = ");
            builder.push_bind(date.format("%Y-%m-%d").to_string());
            builder.push(" ");
        },
    }
    builder.push("ORDER BY created_at DESC");
    let orders = builder.build_query_as().fetch_all(conn).await?;
    Ok(orders)
}
