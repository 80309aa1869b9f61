//! Database access for the users service.
//!
//! # Features
//!
//! - `postgres` (default): SeaORM connector, migrations runner, health probe
//!   and the generic [`BaseRepository`]
//! - `config`: `core_config::FromEnv` for [`postgres::PostgresConfig`]
//!
//! ```ignore
//! use database::postgres;
//!
//! let db = postgres::connect_from_config_with_retry(config, None).await?;
//! postgres::run_migrations::<migration::Migrator>(&db, "users_api").await?;
//! ```

pub mod common;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "postgres")]
pub mod repository;

pub use common::{DatabaseError, DatabaseResult, RetryConfig};

#[cfg(feature = "postgres")]
pub use repository::{BaseRepository, FilterPayload};
