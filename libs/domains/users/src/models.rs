use chrono::{DateTime, Utc};
use database::FilterPayload;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Page size used by `GET /users` when `limit` is omitted.
pub const DEFAULT_LIMIT: u64 = 99_999;

/// A stored user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Store-assigned identifier
    pub id: i32,
    /// Lookup key for `get_by_email`, unique in the store
    pub email: String,
    /// Display name
    pub name: String,
    /// Argon2 PHC string. Never serialized into responses.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /users`.
///
/// `password` holds plaintext on the way in; the service replaces it with
/// its hash before the repository sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(email, length(max = 255))]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1))]
    pub password: String,
    /// Defaults to `true`
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Body of `PATCH /users/{id}`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(email, length(max = 255))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub password: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateUser {
    /// The partial update applied by `deactivate`.
    pub fn deactivation() -> Self {
        Self {
            is_active: Some(false),
            ..Default::default()
        }
    }
}

/// Query string of `GET /users`.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    pub id: Option<i32>,
    /// Exact email match
    pub email: Option<String>,
    /// Exact name match
    pub name: Option<String>,
    pub is_active: Option<bool>,
    /// Rows to skip
    #[serde(default)]
    #[param(default = 0)]
    pub skip: u64,
    /// Maximum rows returned
    #[serde(default = "default_limit")]
    #[param(default = 99999)]
    pub limit: u64,
}

fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            id: None,
            email: None,
            name: None,
            is_active: None,
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl UserQuery {
    /// Column filters built from the fields that were supplied.
    pub fn payload(&self) -> FilterPayload {
        let mut payload = FilterPayload::new();
        if let Some(id) = self.id {
            payload.insert("id".into(), json!(id));
        }
        if let Some(email) = &self.email {
            payload.insert("email".into(), json!(email));
        }
        if let Some(name) = &self.name {
            payload.insert("name".into(), json!(name));
        }
        if let Some(is_active) = self.is_active {
            payload.insert("is_active".into(), json!(is_active));
        }
        payload
    }
}

/// Query string of `GET /users/filter_by_name`.
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NameQuery {
    /// Case-insensitive substring of the user's name
    pub name: String,
}

/// Single-column filter, e.g. `filter_on("email", "a@b.io")`.
pub fn filter_on(column: &str, value: impl Serialize) -> FilterPayload {
    let mut payload = FilterPayload::new();
    payload.insert(
        column.to_string(),
        serde_json::to_value(value).unwrap_or_default(),
    );
    payload
}
