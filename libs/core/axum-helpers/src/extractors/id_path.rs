//! Integer primary key taken from the last path segment.

use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

/// `/{id}` parsed as an `i32`.
///
/// ```ignore
/// async fn get_user(IdPath(id): IdPath) -> String {
///     format!("user {id}")
/// }
///
/// let app = Router::new().route("/users/{id}", get(get_user));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdPath(pub i32);

impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        raw.parse()
            .map(IdPath)
            .map_err(|_| AppError::InvalidId(format!("Invalid id '{raw}': expected an integer")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, http::StatusCode, routing::get};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new().route("/{id}", get(|IdPath(id): IdPath| async move { id.to_string() }))
    }

    #[tokio::test]
    async fn parses_integer_ids() {
        let response = app()
            .oneshot(Request::get("/42").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn rejects_non_numeric_ids() {
        for path in ["/abc", "/1.5", "/99999999999"] {
            let response = app()
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{path}");
        }
    }
}
