use database::FilterPayload;
use std::sync::Arc;
use tracing::instrument;

use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, UpdateUser, User, filter_on};
use crate::password::{hash_password, verify_password};
use crate::repository::UserRepository;

/// Service layer for User business logic
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> Clone for UserService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Filtered page of users. An empty vector means no match.
    #[instrument(skip(self))]
    pub async fn get_all(
        &self,
        payload: FilterPayload,
        skip: u64,
        limit: u64,
    ) -> UserResult<Vec<User>> {
        self.repository.get_all(payload, skip, limit).await
    }

    /// Hashes the password in place, then stores the user.
    #[instrument(skip(self, new_user), fields(email = %new_user.email))]
    pub async fn create(&self, mut new_user: CreateUser) -> UserResult<Option<User>> {
        new_user.password = hash_password(&new_user.password)?;
        self.repository.create(new_user).await
    }

    #[instrument(skip(self))]
    pub async fn get_one_by_id(&self, id: i32) -> UserResult<Option<User>> {
        self.first_matching(filter_on("id", id)).await
    }

    /// The one lookup that treats absence as an error.
    #[instrument(skip(self))]
    pub async fn get_one_by_email(&self, email: &str) -> UserResult<User> {
        self.first_matching(filter_on("email", email))
            .await?
            .ok_or(UserError::EmailNotFound)
    }

    /// Re-hashes the password only when one is supplied.
    #[instrument(skip(self, updated_user))]
    pub async fn update(&self, id: i32, mut updated_user: UpdateUser) -> UserResult<Option<User>> {
        if let Some(password) = updated_user.password.as_deref() {
            updated_user.password = Some(hash_password(password)?);
        }
        self.repository.update(id, updated_user).await
    }

    pub async fn deactivate(&self, id: i32) -> UserResult<Option<User>> {
        self.update(id, UpdateUser::deactivation()).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> UserResult<Option<User>> {
        self.repository.delete(id).await
    }

    /// `None` instead of an empty vector when nothing matches.
    #[instrument(skip(self))]
    pub async fn get_filter_by_name(&self, name: &str) -> UserResult<Option<Vec<User>>> {
        let users = self.repository.get_filter_by_name(name.to_string()).await?;
        Ok(Some(users).filter(|u| !u.is_empty()))
    }

    /// The active user owning `email` when `password` matches its hash.
    #[instrument(skip(self, password))]
    pub async fn verify_credentials(&self, email: &str, password: &str) -> UserResult<Option<User>> {
        let Some(user) = self.first_matching(filter_on("email", email)).await? else {
            return Ok(None);
        };
        if !user.is_active || !verify_password(password, &user.password_hash)? {
            return Ok(None);
        }
        Ok(Some(user))
    }

    async fn first_matching(&self, filters: FilterPayload) -> UserResult<Option<User>> {
        let users = self.repository.get_by_element(filters).await?;
        Ok(users.into_iter().next())
    }
}
