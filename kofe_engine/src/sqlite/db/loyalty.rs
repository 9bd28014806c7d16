use log::debug;
use sqlx::SqliteConnection;

use crate::{db_types::LoyaltyAccount, traits::OrderFlowError};

pub async fn ensure_account(user_id: i64, conn: &mut SqliteConnection) -> Result<LoyaltyAccount, sqlx::Error> {
    let account = sqlx::query_as(
        r#"
            INSERT INTO referral_program (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = user_id
            RETURNING *;
        "#,
    )
    .bind(user_id)
    .fetch_one(conn)
    .await?;
    Ok(account)
}

pub async fn fetch_account(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<LoyaltyAccount>, sqlx::Error> {
    let account = sqlx::query_as("SELECT * FROM referral_program WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(account)
}

/// Deducts one free coffee. The guarded UPDATE makes the deduction atomic: when the balance is
/// already zero no row changes and the caller's transaction must be abandoned.
pub async fn spend_free_coffee(user_id: i64, conn: &mut SqliteConnection) -> Result<(), OrderFlowError> {
    let result = sqlx::query(
        r#"
            UPDATE referral_program
            SET free_coffees = free_coffees - 1
            WHERE user_id = $1 AND free_coffees > 0;
        "#,
    )
    .bind(user_id)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(OrderFlowError::NoFreeCoffees(user_id));
    }
    debug!("📝️ Customer {user_id} spent a free coffee");
    Ok(())
}

pub async fn refund_free_coffee(user_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO referral_program (user_id, free_coffees)
            VALUES ($1, 1)
            ON CONFLICT (user_id) DO UPDATE SET free_coffees = free_coffees + 1;
        "#,
    )
    .bind(user_id)
    .execute(conn)
    .await?;
    debug!("📝️ Customer {user_id} got a free coffee refunded");
    Ok(())
}

/// If `referred_id` arrived via an invite link that has not paid out yet, credits the referrer one
/// free coffee and marks the link rewarded. Returns the rewarded referrer's id.
pub async fn reward_pending_referral(
    referred_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<i64>, sqlx::Error> {
    let referrer: Option<i64> =
        sqlx::query_scalar("SELECT referrer_id FROM referral_links WHERE referred_id = $1 AND rewarded = FALSE")
            .bind(referred_id)
            .fetch_optional(&mut *conn)
            .await?;
    let Some(referrer_id) = referrer else {
        return Ok(None);
    };
    sqlx::query(
        r#"
            INSERT INTO referral_program (user_id, free_coffees, referred_count)
            VALUES ($1, 1, 1)
            ON CONFLICT (user_id) DO UPDATE
            SET free_coffees = free_coffees + 1,
                referred_count = referred_count + 1;
        "#,
    )
    .bind(referrer_id)
    .execute(&mut *conn)
    .await?;
    sqlx::query("UPDATE referral_links SET rewarded = TRUE WHERE referred_id = $1")
        .bind(referred_id)
        .execute(conn)
        .await?;
    debug!("📝️ Referrer {referrer_id} rewarded for bringing in {referred_id}");
    Ok(Some(referrer_id))
}
