use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{NewUser, StoreError, User, UserStore};

/// In-memory credential store. Interchangeable with [`super::PostgresStore`]
/// behind the same trait; also the unit-test double.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.read().expect("store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().expect("store lock poisoned");
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.read().expect("store lock poisoned");
        Ok(users.get(&id).cloned())
    }

    async fn insert(&self, new: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().expect("store lock poisoned");
        if users.values().any(|u| u.email == new.email) {
            return Err(StoreError::Conflict);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            photo_url: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, StoreError> {
        let mut users = self.users.write().expect("store lock poisoned");
        match users.get_mut(&id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                user.updated_at = OffsetDateTime::now_utc();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut users = self.users.write().expect("store lock poisoned");
        Ok(users.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            username: Some("tester".into()),
            email: email.into(),
            password_hash: "$argon2id$fake".into(),
        }
    }

    #[tokio::test]
    async fn insert_and_find_back() {
        let store = MemoryStore::new();
        let created = store.insert(new_user("a@x.com")).await.expect("insert");

        let by_email = store.find_by_email("a@x.com").await.unwrap();
        assert_eq!(by_email.as_ref().map(|u| u.id), Some(created.id));

        let by_id = store.find_by_id(created.id).await.unwrap();
        assert_eq!(by_id.map(|u| u.email), Some("a@x.com".to_string()));
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store.insert(new_user("a@x.com")).await.expect("insert");
        let err = store.insert(new_user("a@x.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn update_password_overwrites_hash() {
        let store = MemoryStore::new();
        let created = store.insert(new_user("a@x.com")).await.expect("insert");

        let updated = store.update_password(created.id, "$argon2id$new").await.unwrap();
        assert!(updated);

        let user = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(user.password_hash, "$argon2id$new");
        assert!(user.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn update_password_for_unknown_user_is_false() {
        let store = MemoryStore::new();
        let updated = store.update_password(Uuid::new_v4(), "x").await.unwrap();
        assert!(!updated);
    }

    #[tokio::test]
    async fn delete_removes_user() {
        let store = MemoryStore::new();
        let created = store.insert(new_user("a@x.com")).await.expect("insert");
        assert!(store.delete_by_id(created.id).await.unwrap());
        assert!(!store.delete_by_id(created.id).await.unwrap());
        assert!(store.find_by_id(created.id).await.unwrap().is_none());
    }
}
