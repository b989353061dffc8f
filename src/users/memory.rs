use std::sync::Mutex;

use axum::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo::{RepoError, UserRepository};
use crate::users::repo_types::{NewUser, User, UserChanges};

/// Vec-backed stand-in for the `account` table, with the same unique email rule.
#[derive(Default)]
pub struct InMemoryUserRepository {
    rows: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_one_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|u| u.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, RepoError> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn insert(&self, user: NewUser) -> Result<User, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|u| u.email == user.email) {
            return Err(RepoError::EmailTaken(user.email));
        }
        let row = User {
            id: user.id,
            username: user.username,
            email: user.email,
            password: user.password_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        changes: UserChanges,
    ) -> Result<Option<User>, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|u| u.email == changes.email && u.id != id) {
            return Err(RepoError::EmailTaken(changes.email));
        }
        let Some(row) = rows.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        row.username = changes.username;
        row.email = changes.email;
        row.password = changes.password_hash;
        Ok(Some(row.clone()))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|u| u.id != id);
        Ok(rows.len() != before)
    }
}
