pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::story_service::StoryService;
use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::stories::save_story,
        api::handlers::stories::get_story,
        api::handlers::stories::browse_stories,
        api::handlers::stories::delete_story,
        api::handlers::client_config::get_client_config,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            services::story_service::SaveStoryResponse,
            services::story_service::DeleteStoryResponse,
            services::story_service::BrowseResponse,
            api::handlers::client_config::ClientConfig,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "stories", description = "Story authoring and media endpoints"),
        (name = "system", description = "Configuration and health endpoints")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub story_service: Arc<StoryService>,
    pub config: Arc<AppConfig>,
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
}

pub fn create_app(state: AppState) -> Router {
    let uploads_route = state
        .config
        .uploaded_files_handler_path
        .trim_end_matches('/')
        .to_string();
    let uploads_dir = ServeDir::new(state.config.uploads_path());

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/clientConfig",
            get(api::handlers::client_config::get_client_config),
        )
        .route(
            "/stories",
            get(api::handlers::stories::browse_stories).post(api::handlers::stories::save_story),
        )
        .route(
            "/stories/:id",
            get(api::handlers::stories::get_story).merge(
                delete(api::handlers::stories::delete_story).route_layer(from_fn_with_state(
                    state.clone(),
                    api::middleware::basic_auth::basic_auth_middleware,
                )),
            ),
        )
        .nest_service(&uploads_route, uploads_dir)
        .layer(cors_layer(&state.config))
        .layer(axum::extract::DefaultBodyLimit::max(
            state.config.max_file_size + 10 * 1024 * 1024, // Add 10MB buffer for multipart overhead
        ))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .with_state(state)
}
