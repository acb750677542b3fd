//! API Models
//!
//! Request and response bodies for the roadmap endpoints, annotated for
//! OpenAPI documentation with `utoipa`.

use roadmap_core::Roadmap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct GenerateRoadmapPayload {
    /// The subject to build a study roadmap for.
    #[schema(example = "Java")]
    pub topic: String,
}

#[derive(Serialize, ToSchema)]
pub struct RoadmapResponse {
    #[schema(example = "success")]
    pub status: String,
    pub topic: String,
    /// The roadmap tree: main topics, topics, flashcards and quizzes.
    #[schema(value_type = Object)]
    pub roadmap: Roadmap,
}

impl RoadmapResponse {
    pub fn success(topic: String, roadmap: Roadmap) -> Self {
        Self {
            status: "success".to_string(),
            topic,
            roadmap,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct WelcomeResponse {
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}
