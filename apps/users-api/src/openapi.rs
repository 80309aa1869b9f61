use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse)
    ),
    info(
        title = "Users API",
        version = "0.1.0",
        description = "User accounts: listing, lookup, name search, update and delete"
    ),
    servers(
        (url = "/api", description = "API base path")
    ),
    nest(
        (path = "/users", api = domain_users::handlers::ApiDoc)
    )
)]
pub struct ApiDoc;
