//! Curriculum Generation Service
//!
//! This module decomposes a subject into main topics and subtopics. The
//! resulting [`TopicStructure`] is the skeleton every later generation stage
//! fills in, so it is produced in a single blocking call and validated before
//! anything fans out from it.

use crate::{
    llm_client::{CompletionRequest, FunctionSchema},
    retry::{CallOutcome, CompletionClient},
    topic::{MainTopic, Subtopic, TopicStructure},
};
use anyhow::{Context, Result};
use async_trait::async_trait;

const FUNCTION_NAME: &str = "generate_topic_structure";
const FUNCTION_DESCRIPTION: &str =
    "Generates a structured breakdown of topics and subtopics for a given subject";

const SYSTEM_PROMPT: &str = "You are an expert curriculum designer.

Your task is to generate a detailed and structured topic breakdown for a given subject.

Instructions:
1. Divide the subject into main topics that represent major domains or categories.
2. Under each main topic, generate detailed subtopics.
3. Subtopics should focus on individual concepts, terms, classes, tools, or methods, not broad chapter titles.

Examples:
- \"Lists\" is too broad. Split into: \"ArrayList\", \"LinkedList\", \"Array vs List\", \"List operations\"
- \"Cell Biology\" is too generic. Split into: \"Nucleus\", \"Mitochondria\", \"Golgi Apparatus\", \"Cell Membrane Transport\"

Each subtopic must be a standalone learning unit that represents a concrete concept or feature, \
is suitable for content, flashcards, and quizzes, and is something a student could look up individually.";

const USER_PROMPT_TEMPLATE: &str = "Generate a detailed and structured topic breakdown for: {subject}

Create 7-9 main topics that comprehensively cover the subject from beginner to advanced concepts.
For each main topic, provide exactly 5-10 specific subtopics that are concrete individual concepts.
Each subtopic should be specific enough to be taught in a single lesson (e.g., 'HashMap Implementation' rather than just 'Maps').
Cover both fundamental concepts and advanced applications.
Ensure subtopics are balanced in specificity and scope across all main topics.
Assign proper IDs to main topics (main-1, main-2, etc.) and subtopics (main-1-1, main-1-2, etc.).";

/// Defines the contract for any service that can generate a curriculum.
///
/// This abstraction allows the system to swap between different curriculum
/// generation approaches (e.g., AI-powered, static mock) while keeping the
/// roadmap pipeline unaware of where its skeleton comes from.
#[async_trait]
pub trait CurriculumService: Send + Sync {
    /// Breaks `subject` down into main topics and subtopics.
    ///
    /// # Returns
    ///
    /// A `Result` containing the topic tree or an error. Unlike per-subtopic
    /// generation there is no fallback: without a structure there is nothing
    /// to generate.
    async fn generate_structure(&self, subject: &str) -> Result<TopicStructure>;
}

/// An implementation of `CurriculumService` backed by a schema-constrained
/// LLM call.
pub struct LLMCurriculumService {
    client: CompletionClient,
    schema: FunctionSchema,
}

impl LLMCurriculumService {
    pub fn new(client: CompletionClient) -> Result<Self> {
        Ok(Self {
            client,
            schema: FunctionSchema::for_type::<TopicStructure>(
                FUNCTION_NAME,
                FUNCTION_DESCRIPTION,
            )?,
        })
    }
}

#[async_trait]
impl CurriculumService for LLMCurriculumService {
    async fn generate_structure(&self, subject: &str) -> Result<TopicStructure> {
        let request = CompletionRequest::structured(
            SYSTEM_PROMPT,
            USER_PROMPT_TEMPLATE.replace("{subject}", subject),
            self.schema.clone(),
        );

        let outcome = self
            .client
            .complete_with("topic-structure", request, |completion| {
                let structure: TopicStructure = serde_json::from_value(completion.into_arguments()?)
                    .context("Topic structure did not match the schema")?;
                structure.validate()?;
                Ok(structure)
            })
            .await;

        match outcome {
            CallOutcome::Success(structure) => Ok(structure),
            CallOutcome::Exhausted(exhausted) => Err(exhausted.into()),
        }
    }
}

/// A mock `CurriculumService` for development and integration testing.
///
/// This implementation provides predictable, deterministic output, which is
/// useful for testing scenarios without external dependencies or API costs.
pub struct MockCurriculumService {
    structure: Option<TopicStructure>,
}

impl MockCurriculumService {
    /// Serves a standard two-topic curriculum for any subject.
    pub fn new() -> Self {
        Self { structure: None }
    }

    /// Serves `structure` verbatim for any subject.
    pub fn with_structure(structure: TopicStructure) -> Self {
        Self {
            structure: Some(structure),
        }
    }
}

impl Default for MockCurriculumService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CurriculumService for MockCurriculumService {
    async fn generate_structure(&self, subject: &str) -> Result<TopicStructure> {
        if let Some(structure) = &self.structure {
            return Ok(structure.clone());
        }
        Ok(TopicStructure {
            topics: vec![
                MainTopic {
                    id: "main-1".to_string(),
                    title: format!("Introduction to {}", subject),
                    subtopics: vec![
                        Subtopic::new("main-1-1", "Core Concepts"),
                        Subtopic::new("main-1-2", "Key Terminology"),
                    ],
                },
                MainTopic {
                    id: "main-2".to_string(),
                    title: format!("Applied {}", subject),
                    subtopics: vec![
                        Subtopic::new("main-2-1", "Practical Applications"),
                        Subtopic::new("main-2-2", "Advanced Topics"),
                    ],
                },
            ],
        })
    }
}
