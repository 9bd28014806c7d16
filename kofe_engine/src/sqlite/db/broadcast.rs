use sqlx::SqliteConnection;

use crate::db_types::BroadcastMessage;

/// The broadcast table holds exactly one row (enforced by a CHECK on the id), seeded by the
/// initial migration, so both functions address `id = 1` directly.
pub async fn fetch_message(conn: &mut SqliteConnection) -> Result<BroadcastMessage, sqlx::Error> {
    let message =
        sqlx::query_as("SELECT message_text, photo_id FROM broadcast WHERE id = 1").fetch_one(conn).await?;
    Ok(message)
}

pub async fn set_message(
    message_text: Option<String>,
    photo_id: Option<String>,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE broadcast SET message_text = $1, photo_id = $2 WHERE id = 1")
        .bind(message_text)
        .bind(photo_id)
        .execute(conn)
        .await?;
    Ok(())
}
