//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the REST API and OpenAPI documentation.

use crate::{
    handlers,
    models::{ErrorResponse, GenerateRoadmapPayload, RoadmapResponse, WelcomeResponse},
    state::AppState,
};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::root,
        handlers::generate_roadmap,
    ),
    components(
        schemas(GenerateRoadmapPayload, RoadmapResponse, WelcomeResponse, ErrorResponse)
    ),
    tags(
        (name = "Roadmap API", description = "Study roadmap generation")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route("/", get(handlers::root))
        .route("/generate-roadmap", post(handlers::generate_roadmap))
        .route("/generate-roadmap/", post(handlers::generate_roadmap))
        .with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}
