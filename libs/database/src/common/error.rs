/// Error type shared by the connectors and [`crate::BaseRepository`].
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[cfg(feature = "postgres")]
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sea_orm::DbErr),

    #[error("Health check failed: {0}")]
    HealthCheckFailed(String),

    /// A filter value that cannot be bound to its column.
    #[error("Invalid filter on column '{column}': {reason}")]
    InvalidFilter { column: String, reason: String },
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;
