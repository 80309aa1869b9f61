use async_trait::async_trait;
use database::{BaseRepository, FilterPayload};
use sea_orm::sea_query::{Expr, ExprTrait, Func};
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, SqlErr};

use crate::{
    entity,
    error::{UserError, UserResult},
    models::{CreateUser, UpdateUser, User},
    repository::UserRepository,
};

pub struct PgUserRepository {
    base: BaseRepository<entity::Entity>,
}

impl PgUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

/// Turns a unique violation on `email` into [`UserError::DuplicateEmail`].
fn map_write_error(err: DbErr, email: Option<&str>) -> UserError {
    match (err.sql_err(), email) {
        (Some(SqlErr::UniqueConstraintViolation(_)), Some(email)) => {
            UserError::DuplicateEmail(email.to_string())
        }
        _ => UserError::Database(err),
    }
}

/// Escapes LIKE wildcards so user input only matches literally.
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn get_all(
        &self,
        filters: FilterPayload,
        skip: u64,
        limit: u64,
    ) -> UserResult<Vec<User>> {
        let models = self.base.find_all(&filters, skip, Some(limit)).await?;
        Ok(models.into_iter().map(User::from).collect())
    }

    async fn create(&self, input: CreateUser) -> UserResult<Option<User>> {
        let email = input.email.clone();
        let active_model: entity::ActiveModel = input.into();

        let model = self
            .base
            .insert(active_model)
            .await
            .map_err(|e| map_write_error(e, Some(&email)))?;

        tracing::info!(user_id = model.id, "Created user");
        Ok(Some(model.into()))
    }

    async fn get_by_element(&self, filters: FilterPayload) -> UserResult<Vec<User>> {
        let models = self.base.find_by_columns(&filters).await?;
        Ok(models.into_iter().map(User::from).collect())
    }

    async fn update(&self, id: i32, input: UpdateUser) -> UserResult<Option<User>> {
        let Some(model) = self.base.find_by_id(id).await? else {
            return Ok(None);
        };

        let email = input.email.clone();
        let mut active_model: entity::ActiveModel = model.into();
        active_model.apply_update(input);

        match self.base.update(active_model).await {
            Ok(updated) => {
                tracing::info!(user_id = id, "Updated user");
                Ok(Some(updated.into()))
            }
            // Row removed between the read and the write.
            Err(DbErr::RecordNotUpdated) => Ok(None),
            Err(e) => Err(map_write_error(e, email.as_deref())),
        }
    }

    async fn delete(&self, id: i32) -> UserResult<Option<User>> {
        let Some(model) = self.base.find_by_id(id).await? else {
            return Ok(None);
        };

        if self.base.delete_by_id(id).await? == 0 {
            return Ok(None);
        }

        tracing::info!(user_id = id, "Deleted user");
        Ok(Some(model.into()))
    }

    async fn get_filter_by_name(&self, name: String) -> UserResult<Vec<User>> {
        let models = entity::Entity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(entity::Column::Name))).like(like_pattern(&name)),
            )
            .order_by_asc(entity::Column::Id)
            .all(self.base.db())
            .await?;

        Ok(models.into_iter().map(User::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn row(id: i32, name: &str) -> entity::Model {
        let at = Utc::now().fixed_offset();
        entity::Model {
            id,
            email: format!("user{id}@example.com"),
            name: name.to_string(),
            password_hash: "$argon2id$hash".to_string(),
            is_active: true,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Ada"), "%ada%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[tokio::test]
    async fn update_of_missing_row_is_none() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<entity::Model>::new()])
            .into_connection();
        let repo = PgUserRepository::new(db);

        let updated = repo.update(9, UpdateUser::deactivation()).await.unwrap();
        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn delete_returns_the_removed_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row(4, "Ada")]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let repo = PgUserRepository::new(db);

        let deleted = repo.delete(4).await.unwrap().unwrap();
        assert_eq!(deleted.id, 4);
        assert_eq!(deleted.name, "Ada");
    }

    #[tokio::test]
    async fn filter_by_name_maps_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row(1, "Ada"), row(2, "Adam")]])
            .into_connection();
        let repo = PgUserRepository::new(db);

        let found = repo.get_filter_by_name("ad".into()).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].name, "Adam");
    }
}
