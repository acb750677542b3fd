//! Axum Handlers for the REST API
//!
//! This module contains the logic for handling roadmap generation requests.
//! It uses `utoipa` doc comments to generate OpenAPI documentation.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{error, info};

use crate::{
    models::{ErrorResponse, GenerateRoadmapPayload, RoadmapResponse, WelcomeResponse},
    state::AppState,
};

pub enum ApiError {
    BadRequest(String),
    InternalServerError(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { message })).into_response()
            }
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                let message = "An internal server error occurred.".to_string();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse { message }),
                )
                    .into_response()
            }
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::InternalServerError(err.into())
    }
}

/// Service welcome message.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service is up", body = WelcomeResponse)
    )
)]
pub async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to the Study Roadmap Generator API".to_string(),
    })
}

/// Generate a complete study roadmap for a subject.
///
/// Runs the structure, content and assessment stages and returns the final
/// roadmap. Generated files are also written under the output directory.
/// Also served without the trailing slash.
#[utoipa::path(
    post,
    path = "/generate-roadmap/",
    request_body = GenerateRoadmapPayload,
    responses(
        (status = 200, description = "Roadmap generated successfully", body = RoadmapResponse),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn generate_roadmap(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GenerateRoadmapPayload>,
) -> Result<Json<RoadmapResponse>, ApiError> {
    let topic = payload.topic.trim();
    if topic.is_empty() {
        return Err(ApiError::BadRequest("topic must not be empty".to_string()));
    }

    info!(topic, "Received roadmap generation request");
    let roadmap = state.pipeline.generate_roadmap(topic).await?;

    Ok(Json(RoadmapResponse::success(topic.to_string(), roadmap)))
}
