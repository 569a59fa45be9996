//! In-process user store
//!
//! Used by the test suites and by local runs started with
//! `database.url = "memory://"`. Uniqueness of username and email is
//! enforced the same way the Postgres indexes enforce it.

use super::user::{NewUser, StoreError, StoreResult, UserRecord, UserStore};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, UserRecord>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

fn taken_field(
    users: &HashMap<Uuid, UserRecord>,
    skip: Option<Uuid>,
    username: Option<&str>,
    email: &str,
) -> Option<&'static str> {
    users
        .values()
        .filter(|u| Some(u.id) != skip)
        .find_map(|u| {
            if username == Some(u.username.as_str()) {
                Some("username")
            } else if u.email == email {
                Some("email")
            } else {
                None
            }
        })
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUser) -> StoreResult<UserRecord> {
        let mut users = self.users.write().await;

        if let Some(field) = taken_field(&users, None, Some(&user.username), &user.email) {
            return Err(StoreError::Conflict(field.to_string()));
        }

        let now = Utc::now();
        let record = UserRecord {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            password_hash: user.password_hash,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(record.id, record.clone());

        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> StoreResult<Option<UserRecord>> {
        let users = self.users.read().await;
        let found = users
            .values()
            .filter(|u| u.username == username || u.email == email)
            .min_by_key(|u| u.created_at)
            .cloned();
        Ok(found)
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> StoreResult<()> {
        if let Some(user) = self.users.write().await.get_mut(&id) {
            user.refresh_token = token.map(str::to_string);
        }
        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> StoreResult<()> {
        if let Some(user) = self.users.write().await.get_mut(&id) {
            user.password_hash = password_hash.to_string();
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_account(
        &self,
        id: Uuid,
        full_name: &str,
        email: &str,
    ) -> StoreResult<Option<UserRecord>> {
        let mut users = self.users.write().await;

        if !users.contains_key(&id) {
            return Ok(None);
        }
        if let Some(field) = taken_field(&users, Some(id), None, email) {
            return Err(StoreError::Conflict(field.to_string()));
        }

        Ok(users.get_mut(&id).map(|user| {
            user.full_name = full_name.to_string();
            user.email = email.to_string();
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            full_name: "Test User".to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = MemoryUserStore::new();
        let user = store.create(new_user("alice", "alice@example.com")).await.unwrap();

        let by_id = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");
        assert!(by_id.refresh_token.is_none());

        let by_email = store
            .find_by_username_or_email("nobody", "alice@example.com")
            .await
            .unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn test_duplicate_username_and_email_rejected() {
        let store = MemoryUserStore::new();
        store.create(new_user("alice", "alice@example.com")).await.unwrap();

        let err = store.create(new_user("alice", "other@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(ref f) if f == "username"));

        let err = store.create(new_user("bob", "alice@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(ref f) if f == "email"));

        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_set_refresh_token_overwrites_and_clears() {
        let store = MemoryUserStore::new();
        let user = store.create(new_user("alice", "alice@example.com")).await.unwrap();

        store.set_refresh_token(user.id, Some("first")).await.unwrap();
        store.set_refresh_token(user.id, Some("second")).await.unwrap();
        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.refresh_token.as_deref(), Some("second"));

        store.set_refresh_token(user.id, None).await.unwrap();
        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert!(stored.refresh_token.is_none());
    }

    #[tokio::test]
    async fn test_update_account_email_conflict() {
        let store = MemoryUserStore::new();
        let alice = store.create(new_user("alice", "alice@example.com")).await.unwrap();
        store.create(new_user("bob", "bob@example.com")).await.unwrap();

        let err = store
            .update_account(alice.id, "Alice", "bob@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // Keeping one's own email is not a conflict
        let updated = store
            .update_account(alice.id, "Alice L.", "alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.full_name, "Alice L.");

        assert!(store
            .update_account(Uuid::new_v4(), "Ghost", "ghost@example.com")
            .await
            .unwrap()
            .is_none());
    }
}
