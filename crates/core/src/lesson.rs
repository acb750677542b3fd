//! Lesson content generation for a single subtopic.

use crate::{
    error::PipelineError,
    gate::ConcurrencyGate,
    llm_client::{Completion, CompletionRequest},
    retry::CompletionClient,
    storage::{OutputStore, RecordKind},
    topic::{MainTopic, Subtopic},
};
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const DESCRIPTION_MARKER: &str = "DESCRIPTION:";
const CONTENT_MARKER: &str = "CONTENT:";

const SYSTEM_PROMPT: &str = "You are an expert educator creating high-quality, comprehensive learning materials.

Your task is to create detailed lesson content for a specific topic. The content should be:

1. Educational and informative with accurate information
2. Well-structured with clear sections
3. Engaging and accessible to learners
4. Practical with real-world applications or examples
5. Comprehensive, covering key aspects of the topic";

/// The lesson attached to one subtopic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonContent {
    pub description: String,
    pub content: String,
}

impl LessonContent {
    /// The record used when every attempt failed.
    pub fn fallback(main_topic: &MainTopic, subtopic: &Subtopic) -> Self {
        Self {
            description: default_description(main_topic, subtopic),
            content: format!(
                "Content generation failed for {}. Please try regenerating this content.",
                subtopic.title
            ),
        }
    }
}

fn default_description(main_topic: &MainTopic, subtopic: &Subtopic) -> String {
    subtopic.description.clone().unwrap_or_else(|| {
        format!(
            "An overview of {} within {}.",
            subtopic.title, main_topic.title
        )
    })
}

/// Generates lesson prose with a free-text completion.
#[derive(Clone)]
pub struct LessonGenerator {
    client: CompletionClient,
    gate: ConcurrencyGate,
    store: OutputStore,
}

impl LessonGenerator {
    pub fn new(client: CompletionClient, gate: ConcurrencyGate, store: OutputStore) -> Self {
        Self {
            client,
            gate,
            store,
        }
    }

    /// Produces the lesson for `subtopic`, falling back to a placeholder when
    /// the model cannot be reached. The record is persisted in the background.
    ///
    /// Only a closed gate is reported as an error.
    pub async fn generate(
        &self,
        subject: &str,
        main_topic: &MainTopic,
        subtopic: &Subtopic,
    ) -> Result<LessonContent, PipelineError> {
        info!(subtopic = %subtopic.title, "Generating lesson content");
        let request = CompletionRequest::free_text(
            SYSTEM_PROMPT,
            user_prompt(subject, main_topic, subtopic),
        );

        let outcome = {
            let _permit = self.gate.acquire().await?;
            self.client
                .complete_with(&subtopic.id, request, |completion| {
                    parse_lesson(completion, main_topic, subtopic)
                })
                .await
        };

        let lesson = outcome.unwrap_or_else(|exhausted| {
            warn!(
                subtopic = %subtopic.title,
                attempts = exhausted.attempts,
                "Using fallback lesson content"
            );
            LessonContent::fallback(main_topic, subtopic)
        });

        self.store.persist_detached(
            self.store
                .record_path(subject, &main_topic.id, &subtopic.id, RecordKind::Lesson),
            &lesson,
        );
        Ok(lesson)
    }
}

fn user_prompt(subject: &str, main_topic: &MainTopic, subtopic: &Subtopic) -> String {
    let existing = subtopic
        .description
        .as_ref()
        .map(|d| format!("\nExisting summary of this subtopic: {}\n", d))
        .unwrap_or_default();

    format!(
        "Create a detailed lesson on the subtopic \"{sub}\" within the main topic \"{main}\" for the subject \"{subject}\".
{existing}
Your lesson should include:

1. A clear introduction that defines the concept and its importance
2. Core principles and key components explained thoroughly
3. Real-world applications or examples that illustrate the concept
4. Common challenges or misconceptions addressed
5. Best practices or tips when applicable
6. Code examples or technical details if relevant to the subject
7. Connections to related concepts within the field
8. A brief summary that reinforces the key takeaways

The content should be approximately 300-500 words, technically accurate, and written at an appropriate level for someone learning this subject.

Format your answer as:
{DESCRIPTION_MARKER} <a concise 1-2 sentence summary of the subtopic>
{CONTENT_MARKER}
<the lesson>",
        sub = subtopic.title,
        main = main_topic.title,
    )
}

fn parse_lesson(
    completion: Completion,
    main_topic: &MainTopic,
    subtopic: &Subtopic,
) -> Result<LessonContent> {
    let text = completion.into_text()?;
    let (generated_description, content) = split_lesson_text(&text);
    if content.is_empty() {
        bail!("Lesson body was empty");
    }

    let description = match (&subtopic.description, generated_description) {
        (Some(existing), _) => existing.clone(),
        (None, Some(generated)) => generated,
        (None, None) => default_description(main_topic, subtopic),
    };
    Ok(LessonContent {
        description,
        content,
    })
}

/// Splits a free-text reply into an optional summary line and the body.
fn split_lesson_text(text: &str) -> (Option<String>, String) {
    let mut rest = text.trim();
    let mut description = None;

    if let Some(after) = strip_marker(rest, DESCRIPTION_MARKER) {
        let (line, remainder) = after.split_once('\n').unwrap_or((after, ""));
        let line = line.trim();
        if !line.is_empty() {
            description = Some(line.to_string());
        }
        rest = remainder.trim_start();
    }
    if let Some(after) = strip_marker(rest, CONTENT_MARKER) {
        rest = after;
    }
    (description, rest.trim().to_string())
}

/// Strips `marker` from the start of `text`, allowing markdown emphasis or a
/// heading prefix around it (`**CONTENT:**`, `## DESCRIPTION:`).
fn strip_marker<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    let is_decoration = |c: char| matches!(c, '*' | '_' | '#');
    let after = text
        .trim_start_matches(|c: char| is_decoration(c) || c == ' ')
        .strip_prefix(marker)?;
    Some(after.trim_start_matches(is_decoration))
}
