use chrono::Duration;
use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{NewPayment, OrderId, Payment, PaymentState};

pub async fn insert_payment(payment: &NewPayment, conn: &mut SqliteConnection) -> Result<Payment, sqlx::Error> {
    let payment = sqlx::query_as(
        r#"
            INSERT INTO payments (payment_id, user_id, amount, description, order_data)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(&payment.payment_id)
    .bind(payment.user_id)
    .bind(payment.amount)
    .bind(&payment.description)
    .bind(&payment.order_data)
    .fetch_one(conn)
    .await?;
    Ok(payment)
}

pub async fn fetch_payment(payment_id: &str, conn: &mut SqliteConnection) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as("SELECT * FROM payments WHERE payment_id = $1")
        .bind(payment_id)
        .fetch_optional(conn)
        .await?;
    Ok(payment)
}

/// The webhook claim. A single guarded UPDATE flips `pending` to `paid` and hands the row to
/// exactly one caller; replayed webhook deliveries find nothing left to claim.
pub async fn claim_pending_payment(
    payment_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as(
        r#"
            UPDATE payments
            SET status = 'paid', updated_at = CURRENT_TIMESTAMP
            WHERE payment_id = $1 AND status = 'pending'
            RETURNING *;
        "#,
    )
    .bind(payment_id)
    .fetch_optional(conn)
    .await?;
    if payment.is_some() {
        debug!("📝️ Payment {payment_id} claimed");
    }
    Ok(payment)
}

pub async fn attach_order(payment_id: &str, order_id: OrderId, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE payments SET order_id = $1, updated_at = CURRENT_TIMESTAMP WHERE payment_id = $2")
        .bind(order_id)
        .bind(payment_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Sets the payment state and returns the paying user's id when a row was touched.
pub async fn mark_payment_state(
    payment_id: &str,
    state: PaymentState,
    conn: &mut SqliteConnection,
) -> Result<Option<i64>, sqlx::Error> {
    let user_id = sqlx::query_scalar(
        r#"
            UPDATE payments
            SET status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE payment_id = $2
            RETURNING user_id;
        "#,
    )
    .bind(state)
    .bind(payment_id)
    .fetch_optional(conn)
    .await?;
    if user_id.is_some() {
        debug!("📝️ Payment {payment_id} marked '{state}'");
    }
    Ok(user_id)
}

/// Expires `pending` payments older than `older_than`. The gateway will never confirm these, so
/// reporting should not count them as open invoices.
pub async fn expire_stale_payments(older_than: Duration, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE payments
            SET status = 'expired', updated_at = CURRENT_TIMESTAMP
            WHERE status = 'pending'
              AND unixepoch(CURRENT_TIMESTAMP) - unixepoch(created_at) > $1;
        "#,
    )
    .bind(older_than.num_seconds())
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}
