//! Generic SeaORM CRUD shared by domain repositories.
//!
//! Domain crates compose a [`BaseRepository`] for their entity and add
//! entity-specific queries on top of it:
//!
//! ```ignore
//! pub struct PgUserRepository {
//!     base: BaseRepository<entity::Entity>,
//! }
//! ```

use std::marker::PhantomData;
use std::str::FromStr;

use sea_orm::sea_query::ColumnType;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr,
    EntityTrait, IntoActiveModel, Iterable, PrimaryKeyToColumn, PrimaryKeyTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Value,
};
use serde_json::Value as Json;
use tracing::warn;

use crate::common::{DatabaseError, DatabaseResult};

const MAX_ROWS: u64 = i64::MAX as u64;

/// Column name to expected value, ANDed together by [`BaseRepository::find_by_columns`].
pub type FilterPayload = serde_json::Map<String, Json>;

/// CRUD over one SeaORM entity.
pub struct BaseRepository<E: EntityTrait> {
    db: DatabaseConnection,
    _entity: PhantomData<E>,
}

impl<E: EntityTrait> Clone for BaseRepository<E> {
    fn clone(&self) -> Self {
        Self::new(self.db.clone())
    }
}

impl<E> BaseRepository<E>
where
    E: EntityTrait,
{
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn insert<A>(&self, model: A) -> Result<E::Model, DbErr>
    where
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
        E::Model: IntoActiveModel<A>,
    {
        model.insert(&self.db).await
    }

    pub async fn find_by_id<K>(&self, id: K) -> Result<Option<E::Model>, DbErr>
    where
        K: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
    {
        E::find_by_id(id).one(&self.db).await
    }

    /// Writes the changed columns of `model`. Fails with
    /// `DbErr::RecordNotUpdated` when the row no longer exists.
    pub async fn update<A>(&self, model: A) -> Result<E::Model, DbErr>
    where
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
        E::Model: IntoActiveModel<A>,
    {
        model.update(&self.db).await
    }

    /// Returns the number of rows removed.
    pub async fn delete_by_id<K>(&self, id: K) -> Result<u64, DbErr>
    where
        K: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
    {
        let result = E::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected)
    }

    /// Every row matching all entries of `filters`, ordered by primary key.
    pub async fn find_by_columns(&self, filters: &FilterPayload) -> DatabaseResult<Vec<E::Model>> {
        self.find_all(filters, 0, None).await
    }

    /// Filtered page of rows ordered by primary key.
    ///
    /// Keys that do not name a column are skipped with a warning so that
    /// callers can forward loosely-typed query maps.
    pub async fn find_all(
        &self,
        filters: &FilterPayload,
        skip: u64,
        limit: Option<u64>,
    ) -> DatabaseResult<Vec<E::Model>> {
        let rows = Self::select_page(filters, skip, limit)?
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    /// Postgres binds OFFSET and LIMIT as BIGINT, so both are capped at
    /// `i64::MAX`.
    fn select_page(
        filters: &FilterPayload,
        skip: u64,
        limit: Option<u64>,
    ) -> DatabaseResult<Select<E>> {
        let mut query = E::find().filter(Self::condition(filters)?);
        for key in E::PrimaryKey::iter() {
            query = query.order_by_asc(key.into_column());
        }
        Ok(query
            .offset(skip.min(MAX_ROWS))
            .limit(limit.map(|l| l.min(MAX_ROWS))))
    }

    fn condition(filters: &FilterPayload) -> DatabaseResult<Condition> {
        let mut condition = Condition::all();
        for (key, value) in filters {
            let Ok(column) = E::Column::from_str(key) else {
                warn!(column = %key, "Ignoring filter on unknown column");
                continue;
            };
            condition = condition.add(match to_value(&column, key, value)? {
                Some(v) => column.eq(v),
                None => column.is_null(),
            });
        }
        Ok(condition)
    }
}

/// Converts a JSON scalar into a bind value shaped for `column`.
fn to_value<C: ColumnTrait>(column: &C, key: &str, value: &Json) -> DatabaseResult<Option<Value>> {
    let invalid = |reason: &str| DatabaseError::InvalidFilter {
        column: key.to_string(),
        reason: reason.to_string(),
    };

    let bound = match value {
        Json::Null => return Ok(None),
        Json::Bool(b) => Value::from(*b),
        Json::String(s) => Value::from(s.clone()),
        Json::Number(n) => match (column.def().get_column_type(), n.as_i64(), n.as_f64()) {
            (ColumnType::Integer, Some(i), _) => {
                Value::from(i32::try_from(i).map_err(|_| invalid("integer out of range"))?)
            }
            (ColumnType::SmallInteger, Some(i), _) => {
                Value::from(i16::try_from(i).map_err(|_| invalid("integer out of range"))?)
            }
            (_, Some(i), _) => Value::from(i),
            (_, None, Some(f)) => Value::from(f),
            _ => return Err(invalid("unsupported number")),
        },
        Json::Array(_) | Json::Object(_) => return Err(invalid("expected a scalar")),
    };
    Ok(Some(bound))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, QueryTrait, Set};
    use serde_json::json;

    mod person {
        use sea_orm::entity::prelude::*;

        #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
        #[sea_orm(table_name = "people")]
        pub struct Model {
            #[sea_orm(primary_key)]
            pub id: i32,
            pub name: String,
            pub active: bool,
            pub nickname: Option<String>,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {}

        impl ActiveModelBehavior for ActiveModel {}
    }

    fn payload(value: serde_json::Value) -> FilterPayload {
        value.as_object().cloned().unwrap_or_default()
    }

    fn ada() -> person::Model {
        person::Model {
            id: 1,
            name: "Ada".into(),
            active: true,
            nickname: None,
        }
    }

    #[test]
    fn condition_ands_known_columns_and_skips_unknown() {
        let condition = BaseRepository::<person::Entity>::condition(&payload(json!({
            "name": "Ada",
            "active": true,
            "nickname": null,
            "shoe_size": 44,
        })))
        .unwrap();

        let sql = person::Entity::find()
            .filter(condition)
            .build(DatabaseBackend::Postgres)
            .to_string();

        assert!(sql.contains(r#""people"."name" = 'Ada'"#), "{sql}");
        assert!(sql.contains(r#""people"."active" = "#), "{sql}");
        assert!(sql.contains(r#""people"."nickname" IS NULL"#), "{sql}");
        assert!(!sql.contains("shoe_size"), "{sql}");
    }

    #[test]
    fn integer_columns_bind_as_i32() {
        let value = to_value(&person::Column::Id, "id", &json!(7)).unwrap();
        assert_eq!(value, Some(Value::from(7i32)));

        let err = to_value(&person::Column::Id, "id", &json!(i64::MAX)).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidFilter { .. }));
    }

    #[test]
    fn nested_values_are_rejected() {
        let err = BaseRepository::<person::Entity>::condition(&payload(json!({ "name": ["a"] })))
            .unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn paging_is_capped_to_bigint() {
        let statement = BaseRepository::<person::Entity>::select_page(
            &FilterPayload::new(),
            u64::MAX,
            Some(u64::MAX),
        )
        .unwrap()
        .build(DatabaseBackend::Postgres);

        assert_eq!(
            statement.values.unwrap().0,
            vec![Value::from(i64::MAX as u64); 2]
        );
    }

    #[tokio::test]
    async fn find_all_accepts_largest_paging_values() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ada()]])
            .into_connection();
        let repo = BaseRepository::<person::Entity>::new(db);

        let rows = repo
            .find_all(&FilterPayload::new(), u64::MAX, Some(u64::MAX))
            .await
            .unwrap();
        assert_eq!(rows, vec![ada()]);
    }

    #[tokio::test]
    async fn find_all_returns_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ada()]])
            .into_connection();
        let repo = BaseRepository::<person::Entity>::new(db);

        let rows = repo
            .find_all(&payload(json!({ "active": true })), 10, Some(5))
            .await
            .unwrap();
        assert_eq!(rows, vec![ada()]);
    }

    #[tokio::test]
    async fn insert_update_delete_round_through_the_pool() {
        let renamed = person::Model {
            name: "Ada L.".into(),
            ..ada()
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ada()], vec![renamed.clone()]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let repo = BaseRepository::<person::Entity>::new(db);

        let created = repo
            .insert(person::ActiveModel {
                name: Set("Ada".into()),
                active: Set(true),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(created.id, 1);

        let mut active: person::ActiveModel = created.into();
        active.name = Set("Ada L.".into());
        assert_eq!(repo.update(active).await.unwrap(), renamed);

        assert_eq!(repo.delete_by_id(1).await.unwrap(), 1);
    }
}
