use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Row of the `account` table.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    #[sqlx(rename = "user_id")]
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string, never serialized.
    pub password: String,
    pub created_at: OffsetDateTime,
}

/// Values for a fresh account row. `password_hash` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Full replacement of the mutable columns.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}
