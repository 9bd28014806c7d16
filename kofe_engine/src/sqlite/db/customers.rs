use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{Customer, ProfileUpdate};

/// Inserts the customer, or refreshes the stored names on conflict. Re-contact also reactivates a
/// previously bounced customer.
pub async fn upsert_customer(profile: &ProfileUpdate, conn: &mut SqliteConnection) -> Result<Customer, sqlx::Error> {
    let customer = sqlx::query_as(
        r#"
            INSERT INTO users (telegram_id, username, first_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (telegram_id) DO UPDATE
            SET username = excluded.username,
                first_name = excluded.first_name,
                is_active = TRUE
            RETURNING *;
        "#,
    )
    .bind(profile.telegram_id)
    .bind(&profile.username)
    .bind(&profile.first_name)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Customer {} upserted", profile.telegram_id);
    Ok(customer)
}

pub async fn fetch_customer(telegram_id: i64, conn: &mut SqliteConnection) -> Result<Option<Customer>, sqlx::Error> {
    let customer = sqlx::query_as("SELECT * FROM users WHERE telegram_id = $1")
        .bind(telegram_id)
        .fetch_optional(conn)
        .await?;
    Ok(customer)
}

/// Records a referral link. Returns `false` for self-referrals and for customers that already
/// carry a link (the UNIQUE constraint on `referred_id` makes repeats a no-op).
pub async fn link_referral(
    referrer_id: i64,
    referred_id: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    if referrer_id == referred_id {
        return Ok(false);
    }
    let result = sqlx::query(
        r#"
            INSERT INTO referral_links (referrer_id, referred_id)
            VALUES ($1, $2)
            ON CONFLICT (referred_id) DO NOTHING;
        "#,
    )
    .bind(referrer_id)
    .bind(referred_id)
    .execute(conn)
    .await?;
    let linked = result.rows_affected() > 0;
    if linked {
        debug!("📝️ Customer {referred_id} linked to referrer {referrer_id}");
    }
    Ok(linked)
}

pub async fn active_customer_ids(conn: &mut SqliteConnection) -> Result<Vec<i64>, sqlx::Error> {
    let ids = sqlx::query_scalar("SELECT telegram_id FROM users WHERE is_active = TRUE ORDER BY telegram_id")
        .fetch_all(conn)
        .await?;
    Ok(ids)
}

pub async fn deactivate_customer(telegram_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET is_active = FALSE WHERE telegram_id = $1")
        .bind(telegram_id)
        .execute(conn)
        .await?;
    debug!("📝️ Customer {telegram_id} marked inactive");
    Ok(())
}

pub async fn count_active_customers(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_active = TRUE").fetch_one(conn).await?;
    Ok(count)
}
