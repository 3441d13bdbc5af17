//! In-memory user record store.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// A stored user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
}

/// Body of a create request. The client never chooses the id.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

/// Body of an update request. `id` must repeat the id in the URL.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserUpdate {
    pub id: u64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),

    #[error("user {0} not found")]
    NotFound(u64),
}

impl StoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

const REQUIRED_FIELDS: &str = "Name and email are required.";
const ID_MISMATCH: &str = "User id in the URL does not match the request body.";

/// Concurrent map of users plus a monotonic id counter.
///
/// Every operation is atomic with respect to the others. Ids come from a
/// single `fetch_add`, so two creates never share an id and a deleted id is
/// never handed out again. Racing updates to one record resolve as last
/// write wins; an update racing a delete either lands first or reports
/// [`StoreError::NotFound`], it never brings the record back.
#[derive(Debug)]
pub struct UserStore {
    users: DashMap<u64, User>,
    next_id: AtomicU64,
}

impl UserStore {
    /// An empty store whose first id is 1.
    pub fn new() -> Self {
        Self { users: DashMap::new(), next_id: AtomicU64::new(1) }
    }

    /// The startup state: Alice (1) and Bob (2), next id 3.
    pub fn seeded() -> Self {
        let store = Self::new();
        for (name, email) in [("Alice", "alice@example.com"), ("Bob", "bob@example.com")] {
            let id = store.reserve_id();
            store.users.insert(id, User { id, name: name.into(), email: email.into() });
        }
        store
    }

    /// All records, ordered by id.
    pub fn list(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.iter().map(|e| e.value().clone()).collect();
        users.sort_by_key(|u| u.id);
        users
    }

    pub fn get(&self, id: u64) -> Option<User> {
        self.users.get(&id).map(|e| e.value().clone())
    }

    pub fn create(&self, new: NewUser) -> Result<User, StoreError> {
        validate(&new.name, &new.email)?;
        let id = self.reserve_id();
        let user = User { id, name: new.name, email: new.email };
        self.users.insert(id, user.clone());
        Ok(user)
    }

    /// Replaces record `id`. The id check runs first, so a mismatched body
    /// is rejected whether or not `id` exists.
    pub fn update(&self, id: u64, update: UserUpdate) -> Result<User, StoreError> {
        if update.id != id {
            return Err(StoreError::validation(ID_MISMATCH));
        }
        validate(&update.name, &update.email)?;

        let mut entry = self.users.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        *entry = User { id, name: update.name, email: update.email };
        Ok(entry.value().clone())
    }

    pub fn delete(&self, id: u64) -> Result<(), StoreError> {
        self.users.remove(&id).map(|_| ()).ok_or(StoreError::NotFound(id))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn reserve_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for UserStore {
    fn default() -> Self { Self::new() }
}

fn validate(name: &str, email: &str) -> Result<(), StoreError> {
    if name.trim().is_empty() || email.trim().is_empty() {
        return Err(StoreError::validation(REQUIRED_FIELDS));
    }
    Ok(())
}
