use crate::error::PipelineError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The skeleton of a subject: main topics, each with ordered subtopics.
///
/// Produced once by the topic-structure stage and read-only afterwards. The
/// set and order of subtopic ids fixed here is what every later stage mirrors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TopicStructure {
    /// Main topics that represent major domains or categories of the subject.
    pub topics: Vec<MainTopic>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MainTopic {
    /// Unique identifier for the main topic (`main-1`, `main-2`, ...).
    pub id: String,
    /// Title of the main topic.
    pub title: String,
    /// Subtopics of this main topic, in teaching order.
    pub subtopics: Vec<Subtopic>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Subtopic {
    /// Unique identifier for the subtopic (`main-1-1`, `main-1-2`, ...).
    pub id: String,
    /// Title of the subtopic; a specific concept, term, or method.
    pub title: String,
    /// Optional summary supplied upstream. Kept verbatim by lesson generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Subtopic {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
        }
    }
}

impl TopicStructure {
    pub fn subtopic_count(&self) -> usize {
        self.topics.iter().map(|t| t.subtopics.len()).sum()
    }

    /// Checks that the tree is non-empty and every id is globally unique.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.topics.is_empty() {
            return Err(PipelineError::InvalidStructure(
                "no main topics".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let ids = self.topics.iter().flat_map(|main| {
            std::iter::once(&main.id).chain(main.subtopics.iter().map(|s| &s.id))
        });
        for id in ids {
            if id.trim().is_empty() {
                return Err(PipelineError::InvalidStructure("empty id".to_string()));
            }
            if !seen.insert(id.as_str()) {
                return Err(PipelineError::InvalidStructure(format!(
                    "duplicate id '{}'",
                    id
                )));
            }
        }
        Ok(())
    }
}
