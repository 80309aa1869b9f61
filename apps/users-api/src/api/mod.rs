use axum::Router;

pub mod health;
pub mod users;

/// Creates the API routes without the `/api` prefix.
/// The `/api` prefix will be added by the `create_router` helper.
///
/// Every sub-router has its state applied, so the result is stateless.
pub fn routes(state: &crate::state::AppState) -> Router {
    Router::new().nest("/users", users::router(state))
}

/// `/ready` with a live database probe. Merged next to the stateless app
/// router returned by `create_router`.
pub fn ready_router(state: crate::state::AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}
