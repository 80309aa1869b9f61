use async_trait::async_trait;
use chrono::Utc;
use database::FilterPayload;
use serde_json::Value as Json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};
use tokio::sync::RwLock;

use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, UpdateUser, User};

/// Storage seam for [`User`] records.
///
/// Absence is never an error here: lookups return empty collections and
/// mutations of unknown ids return `None`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Page of users matching every entry of `filters`, ordered by id.
    async fn get_all(&self, filters: FilterPayload, skip: u64, limit: u64)
    -> UserResult<Vec<User>>;

    /// Stores a new user. `input.password` must already be hashed.
    async fn create(&self, input: CreateUser) -> UserResult<Option<User>>;

    /// All users whose columns equal the given values.
    async fn get_by_element(&self, filters: FilterPayload) -> UserResult<Vec<User>>;

    /// Applies the supplied fields. `None` when `id` does not exist.
    async fn update(&self, id: i32, input: UpdateUser) -> UserResult<Option<User>>;

    /// Removes the row and returns it. `None` when `id` does not exist.
    async fn delete(&self, id: i32) -> UserResult<Option<User>>;

    /// Users whose name contains `name`, ignoring case.
    async fn get_filter_by_name(&self, name: String) -> UserResult<Vec<User>>;
}

/// In-memory implementation of UserRepository (for development/testing)
#[derive(Debug, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<BTreeMap<i32, User>>>,
    next_id: Arc<AtomicI32>,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(BTreeMap::new())),
            next_id: Arc::new(AtomicI32::new(1)),
        }
    }
}

/// Compares filters against the serialized user. Keys that are not user
/// fields are ignored, as the Postgres repository does.
fn matches(user: &User, filters: &FilterPayload) -> UserResult<bool> {
    let serialized = serde_json::to_value(user).map_err(|e| UserError::Internal(e.to_string()))?;
    for (key, expected) in filters {
        if matches!(expected, Json::Array(_) | Json::Object(_)) {
            return Err(UserError::InvalidFilter(format!(
                "Invalid filter on column '{key}': expected a scalar"
            )));
        }
        match serialized.get(key) {
            Some(actual) if actual != expected => return Ok(false),
            _ => {}
        }
    }
    Ok(true)
}

fn email_taken(users: &BTreeMap<i32, User>, email: &str, except: Option<i32>) -> bool {
    users
        .values()
        .any(|u| Some(u.id) != except && u.email == email)
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get_all(
        &self,
        filters: FilterPayload,
        skip: u64,
        limit: u64,
    ) -> UserResult<Vec<User>> {
        let users = self.users.read().await;
        let mut result = Vec::new();
        for user in users.values() {
            if matches(user, &filters)? {
                result.push(user.clone());
            }
        }
        Ok(result
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect())
    }

    async fn create(&self, input: CreateUser) -> UserResult<Option<User>> {
        let mut users = self.users.write().await;

        if email_taken(&users, &input.email, None) {
            return Err(UserError::DuplicateEmail(input.email));
        }

        let now = Utc::now();
        let user = User {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            email: input.email,
            name: input.name,
            password_hash: input.password,
            is_active: input.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());

        tracing::info!(user_id = user.id, "Created user");
        Ok(Some(user))
    }

    async fn get_by_element(&self, filters: FilterPayload) -> UserResult<Vec<User>> {
        self.get_all(filters, 0, u64::MAX).await
    }

    async fn update(&self, id: i32, input: UpdateUser) -> UserResult<Option<User>> {
        let mut users = self.users.write().await;

        if !users.contains_key(&id) {
            return Ok(None);
        }
        if let Some(email) = &input.email {
            if email_taken(&users, email, Some(id)) {
                return Err(UserError::DuplicateEmail(email.clone()));
            }
        }

        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(email) = input.email {
            user.email = email;
        }
        if let Some(name) = input.name {
            user.name = name;
        }
        if let Some(hash) = input.password {
            user.password_hash = hash;
        }
        if let Some(is_active) = input.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();

        tracing::info!(user_id = id, "Updated user");
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: i32) -> UserResult<Option<User>> {
        let removed = self.users.write().await.remove(&id);
        if removed.is_some() {
            tracing::info!(user_id = id, "Deleted user");
        }
        Ok(removed)
    }

    async fn get_filter_by_name(&self, name: String) -> UserResult<Vec<User>> {
        let needle = name.to_lowercase();
        let users = self.users.read().await;
        Ok(users
            .values()
            .filter(|u| u.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}
