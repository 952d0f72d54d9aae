//! Axum router construction.
//!
//! Builds the full application router with all routes and middleware
//! layers. The route table is the single place the HTTP surface is
//! declared.

use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::context::AppContext;
use crate::middleware::auth::auth_middleware;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health::health_check,
        routes::auth::login,
        routes::auth::logout,
        routes::auth::auth_status,
        routes::listings::list_listings,
        routes::listings::create_listing,
        routes::listings::buy_listing,
        routes::listings::delete_listing,
        routes::photos::get_photo,
    ),
    components(schemas(
        routes::auth::LoginRequest,
        routes::auth::AuthResponse,
        routes::auth::AuthStatusResponse,
        routes::listings::ListingResponse,
        routes::listings::PhotoResponse,
    ))
)]
struct ApiDoc;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        // Auth
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/logout", post(routes::auth::logout))
        .route("/auth/status", get(routes::auth::auth_status))
        // Listings
        .route(
            "/listings",
            get(routes::listings::list_listings)
                .post(routes::listings::create_listing)
                .delete(routes::listings::delete_listing),
        )
        .route("/listings/{id}/buy", put(routes::listings::buy_listing))
        // Photos
        .route("/photos/{key}", get(routes::photos::get_photo))
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Auth runs on every route; it injects the caller identity and only
        // rejects requests to the state-changing listing routes.
        .layer(middleware::from_fn_with_state(ctx.clone(), auth_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
