//! OpenAPI documentation for the HTTP API.
//!
//! Served as JSON at `/openapi.json` and rendered at `/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::{api, db, errors};

/// Bearer token issued by `POST /token`.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Obtain a token from `POST /token` with form fields `username` and `password`, \
                            then send it in the `Authorization` header:\n\n\
                            ```\nAuthorization: Bearer YOUR_TOKEN\n```",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Shelter API", description = "Dog and user records for an animal shelter."),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::root::root,
        api::handlers::root::healthz,
        api::handlers::auth::login,
        api::handlers::dogs::list_dogs,
        api::handlers::dogs::create_dog,
        api::handlers::dogs::create_dog_concurrently,
        api::handlers::dogs::update_dog,
        api::handlers::dogs::delete_dog,
        api::handlers::users::list_users,
        api::handlers::users::create_user,
        api::handlers::users::create_user_concurrently,
        api::handlers::users::update_user,
        api::handlers::users::delete_user,
    ),
    components(
        schemas(
            api::models::auth::LoginForm,
            api::models::auth::TokenResponse,
            api::models::dogs::DogResponse,
            api::models::users::UserResponse,
            db::models::dogs::DogFields,
            db::models::users::UserFields,
            errors::ErrorBody,
        )
    ),
    tags(
        (name = "root", description = "Greeting and health check"),
        (name = "authentication", description = "Exchange credentials for a bearer token"),
        (name = "dogs", description = "Dog records. Create and update require a bearer token."),
        (name = "users", description = "User records. Create and update require a bearer token."),
    )
)]
pub struct ApiDoc;
