//! Study roadmap generation.
//!
//! A subject is decomposed into main topics and subtopics, every subtopic gets
//! a lesson, and every lesson gets flashcards and a quiz. The two per-subtopic
//! stages fan out over the topic tree under a shared [`gate::ConcurrencyGate`],
//! retry failed LLM calls, and fall back to synthetic content rather than drop
//! a subtopic.

pub mod assessment;
pub mod config;
pub mod curriculum;
pub mod error;
pub mod gate;
pub mod lesson;
pub mod llm_client;
pub mod pipeline;
pub mod retry;
pub mod roadmap;
pub mod storage;
pub mod topic;

pub use error::PipelineError;
pub use pipeline::RoadmapPipeline;
pub use roadmap::Roadmap;
