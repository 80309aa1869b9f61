use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;

use crate::models::{CreateUser, UpdateUser, User};

/// Row of the `users` table.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for User {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            password_hash: model.password_hash,
            is_active: model.is_active,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

/// Expects `input.password` to already hold the hash.
impl From<CreateUser> for ActiveModel {
    fn from(input: CreateUser) -> Self {
        let now = Utc::now().fixed_offset();
        ActiveModel {
            id: NotSet,
            email: Set(input.email),
            name: Set(input.name),
            password_hash: Set(input.password),
            is_active: Set(input.is_active.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }
}

impl ActiveModel {
    /// Marks the supplied fields of `input` as changed and bumps `updated_at`.
    pub fn apply_update(&mut self, input: UpdateUser) {
        if let Some(email) = input.email {
            self.email = Set(email);
        }
        if let Some(name) = input.name {
            self.name = Set(name);
        }
        if let Some(hash) = input.password {
            self.password_hash = Set(hash);
        }
        if let Some(is_active) = input.is_active {
            self.is_active = Set(is_active);
        }
        self.updated_at = Set(Utc::now().fixed_offset());
    }
}
