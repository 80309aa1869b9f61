use axum::{
    Json, Router,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
};
use axum_helpers::{
    IdPath, ValidatedJson, ValidatedQuery,
    errors::responses::{
        BadRequestIdResponse, BadRequestQueryResponse, BadRequestValidationResponse,
        ConflictResponse, InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, NameQuery, UpdateUser, User, UserQuery};
use crate::repository::UserRepository;
use crate::service::UserService;

pub const TAG: &str = "users";

/// OpenAPI documentation for the users endpoints
#[derive(OpenApi)]
#[openapi(
    paths(
        get_all,
        create,
        get_one_by_email,
        get_by_filter_name,
        get_by_id,
        update_by_id,
        delete_by_id,
    ),
    components(
        schemas(User, CreateUser, UpdateUser),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestIdResponse,
            BadRequestQueryResponse,
            ConflictResponse,
            UnauthorizedResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "User management endpoints")
    )
)]
pub struct ApiDoc;

type SharedService<R> = State<Arc<UserService<R>>>;

/// Create the users router with all HTTP endpoints
pub fn router<R: UserRepository + 'static>(service: UserService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(get_all).post(create))
        .route("/get_by_email/{email}", get(get_one_by_email))
        .route("/filter_by_name", get(get_by_filter_name))
        .route(
            "/{id}",
            get(get_by_id).patch(update_by_id).delete(delete_by_id),
        )
        .with_state(shared_service)
}

/// List users matching the supplied fields
#[utoipa::path(
    get,
    path = "",
    tag = TAG,
    params(UserQuery),
    responses(
        (status = 200, description = "Users found, possibly none", body = Vec<User>),
        (status = 400, response = BadRequestQueryResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_all<R: UserRepository>(
    State(service): SharedService<R>,
    ValidatedQuery(query): ValidatedQuery<UserQuery>,
) -> UserResult<Json<Vec<User>>> {
    let users = service
        .get_all(query.payload(), query.skip, query.limit)
        .await?;
    Ok(Json(users))
}

/// Create a user
///
/// Responds with `[]` if the store hands nothing back.
#[utoipa::path(
    post,
    path = "",
    tag = TAG,
    request_body = CreateUser,
    responses(
        (status = 200, description = "User created", body = User),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create<R: UserRepository>(
    State(service): SharedService<R>,
    ValidatedJson(input): ValidatedJson<CreateUser>,
) -> UserResult<Response> {
    Ok(match service.create(input).await? {
        Some(user) => Json(user).into_response(),
        None => Json(Vec::<User>::new()).into_response(),
    })
}

/// Get a user by email
#[utoipa::path(
    get,
    path = "/get_by_email/{email}",
    tag = TAG,
    params(
        ("email" = String, Path, description = "Email address")
    ),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_one_by_email<R: UserRepository>(
    State(service): SharedService<R>,
    Path(email): Path<String>,
) -> UserResult<Json<User>> {
    let user = service.get_one_by_email(&email).await?;
    Ok(Json(user))
}

/// Users whose name contains `name`, ignoring case
#[utoipa::path(
    get,
    path = "/filter_by_name",
    tag = TAG,
    params(NameQuery),
    responses(
        (status = 200, description = "Users found, possibly none", body = Vec<User>),
        (status = 400, response = BadRequestQueryResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_by_filter_name<R: UserRepository>(
    State(service): SharedService<R>,
    ValidatedQuery(query): ValidatedQuery<NameQuery>,
) -> UserResult<Json<Vec<User>>> {
    let users = service.get_filter_by_name(&query.name).await?;
    Ok(Json(users.unwrap_or_default()))
}

/// Get a user by id
#[utoipa::path(
    get,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = i32, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 400, response = BadRequestIdResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_by_id<R: UserRepository>(
    State(service): SharedService<R>,
    IdPath(id): IdPath,
) -> UserResult<Json<User>> {
    let user = service
        .get_one_by_id(id)
        .await?
        .ok_or(UserError::NotFound(id))?;
    Ok(Json(user))
}

/// Update the supplied fields of a user
///
/// Responds with `null` when the id does not exist.
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = i32, Path, description = "User id")
    ),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "Updated user, or null", body = Option<User>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_by_id<R: UserRepository>(
    State(service): SharedService<R>,
    IdPath(id): IdPath,
    ValidatedJson(input): ValidatedJson<UpdateUser>,
) -> UserResult<Json<Option<User>>> {
    let user = service.update(id, input).await?;
    Ok(Json(user))
}

/// Delete a user
///
/// Responds with the removed user, or `null` when the id does not exist.
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = i32, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "Deleted user, or null", body = Option<User>),
        (status = 400, response = BadRequestIdResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_by_id<R: UserRepository>(
    State(service): SharedService<R>,
    IdPath(id): IdPath,
) -> UserResult<Json<Option<User>>> {
    let user = service.delete(id).await?;
    Ok(Json(user))
}
