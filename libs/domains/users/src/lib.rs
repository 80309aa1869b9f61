//! Users Domain
//!
//! User accounts behind a small REST surface: filtered listing, lookup by
//! id or email, case-insensitive name search, partial update and delete.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, absence → 404 / [] / null
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Password hashing, lookup helpers
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + in-memory and Postgres)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← User, DTOs, query params
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_users::{
//!     handlers,
//!     repository::InMemoryUserRepository,
//!     service::UserService,
//! };
//!
//! let repository = InMemoryUserRepository::new();
//! let service = UserService::new(repository);
//!
//! let router: axum::Router = handlers::router(service);
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod password;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{UserError, UserResult};
pub use models::{CreateUser, DEFAULT_LIMIT, NameQuery, UpdateUser, User, UserQuery, filter_on};
pub use postgres::PgUserRepository;
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::UserService;
