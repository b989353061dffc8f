use axum::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::password::spawn_verify;
use crate::users::repo_types::{NewUser, User, UserChanges};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("email already registered: {0}")]
    EmailTaken(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Data access for the `account` table.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_one_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError>;

    async fn list(&self) -> Result<Vec<User>, RepoError>;

    /// Fails with [`RepoError::EmailTaken`] when the email is already claimed,
    /// including by a concurrent insert.
    async fn insert(&self, user: NewUser) -> Result<User, RepoError>;

    /// `None` when no row has this id.
    async fn update_by_id(&self, id: Uuid, changes: UserChanges)
        -> Result<Option<User>, RepoError>;

    /// Whether a row was removed.
    async fn delete_by_id(&self, id: Uuid) -> Result<bool, RepoError>;

    /// Returns the user only if the email exists and the password matches.
    /// Both failure cases look the same to the caller.
    async fn compare_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, RepoError> {
        let user = self.find_one_by_email(email).await?;
        let stored = user.as_ref().map(|u| u.password.as_str());
        if spawn_verify(password, stored).await? {
            Ok(user)
        } else {
            Ok(None)
        }
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn write_error(err: sqlx::Error, email: &str) -> RepoError {
    let unique = err
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());
    if unique {
        RepoError::EmailTaken(email.to_owned())
    } else {
        RepoError::Database(err)
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_one_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, username, email, password, created_at
            FROM account
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, username, email, password, created_at
            FROM account
            WHERE user_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, RepoError> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, username, email, password, created_at
            FROM account
            ORDER BY created_at ASC, user_id ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn insert(&self, user: NewUser) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO account (user_id, username, email, password)
            VALUES ($1, $2, $3, $4)
            RETURNING user_id, username, email, password, created_at
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| write_error(e, &user.email))
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        changes: UserChanges,
    ) -> Result<Option<User>, RepoError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE account
               SET username = $2, password = $3, email = $4
             WHERE user_id = $1
            RETURNING user_id, username, email, password, created_at
            "#,
        )
        .bind(id)
        .bind(&changes.username)
        .bind(&changes.password_hash)
        .bind(&changes.email)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| write_error(e, &changes.email))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query(r#"DELETE FROM account WHERE user_id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
