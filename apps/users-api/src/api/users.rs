use axum::Router;
use domain_users::{PgUserRepository, UserService, handlers};

/// Builds the single service instance shared by every users request.
pub fn router(state: &crate::state::AppState) -> Router {
    let repository = PgUserRepository::new(state.db.clone());
    let service = UserService::new(repository);
    handlers::router(service)
}
