//! JSON body extractor that runs `validator` rules after deserializing.

use crate::errors::AppError;
use axum::extract::{FromRequest, Json, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

/// `Json<T>` followed by `T::validate()`.
///
/// Malformed bodies reject with the JSON rejection status; failed rules
/// reject with 400 and per-field details.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state).await?;
        data.validate()?;
        Ok(ValidatedJson(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, http::StatusCode, routing::post};
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize, Validate)]
    struct Signup {
        #[validate(email)]
        email: String,
    }

    fn app() -> Router {
        Router::new().route(
            "/",
            post(|ValidatedJson(body): ValidatedJson<Signup>| async move { body.email }),
        )
    }

    fn request(body: &str) -> Request<Body> {
        Request::post("/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    #[tokio::test]
    async fn accepts_valid_body() {
        let response = app().oneshot(request(r#"{"email":"a@b.io"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn rejects_rule_violations() {
        let response = app().oneshot(request(r#"{"email":"nope"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_malformed_json() {
        let response = app().oneshot(request("{")).await.unwrap();
        assert!(response.status().is_client_error());
    }
}
