use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::user::models::NewUser;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::Username;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

/// Process-local user store with the same uniqueness and NotFound contract
/// as the PostgreSQL repository. Uniqueness checks and the write happen under
/// one write lock.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn find_conflict<'a>(
        users: impl Iterator<Item = &'a User>,
        id: UserId,
        username: &Username,
        email: &str,
    ) -> Option<UserError> {
        for existing in users.filter(|u| u.id != id) {
            if existing.username == *username {
                return Some(UserError::UsernameAlreadyExists(username.to_string()));
            }
            if existing.email.as_str() == email {
                return Some(UserError::EmailAlreadyExists(email.to_string()));
            }
        }
        None
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, UserError> {
        let mut users = self.users.write().await;

        if users.contains_key(&user.id) {
            return Err(UserError::DatabaseError(format!(
                "duplicate primary key {}",
                user.id
            )));
        }
        if let Some(conflict) =
            Self::find_conflict(users.values(), user.id, &user.username, user.email.as_str())
        {
            return Err(conflict);
        }

        let now = Utc::now();
        let stored = User {
            id: user.id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.insert(stored.id, stored.clone());

        Ok(stored)
    }

    async fn get_by_username(&self, username: &Username) -> Result<User, UserError> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.username == *username)
            .cloned()
            .ok_or_else(|| UserError::NotFound(username.to_string()))
    }

    async fn get_by_id(&self, id: &UserId) -> Result<User, UserError> {
        self.users
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| UserError::NotFound(id.to_string()))
    }

    async fn update(&self, user: User) -> Result<User, UserError> {
        let mut users = self.users.write().await;

        let Some(created_at) = users.get(&user.id).map(|u| u.created_at) else {
            return Err(UserError::NotFound(user.id.to_string()));
        };
        if let Some(conflict) =
            Self::find_conflict(users.values(), user.id, &user.username, user.email.as_str())
        {
            return Err(conflict);
        }

        let updated = User {
            created_at,
            updated_at: Utc::now(),
            ..user
        };
        users.insert(updated.id, updated.clone());

        Ok(updated)
    }

    async fn delete(&self, id: &UserId) -> Result<(), UserError> {
        self.users
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| UserError::NotFound(id.to_string()))
    }
}
