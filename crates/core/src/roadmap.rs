//! Output documents: the lesson-content aggregate and the final roadmap tree.

use crate::{
    assessment::{Assessment, Flashcard, QuizQuestion},
    lesson::LessonContent,
    topic::{MainTopic, Subtopic},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Lessons for a whole subject, keyed by main-topic id then subtopic id.
///
/// Key order follows the topic structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LessonTree {
    pub main_topics: IndexMap<String, MainTopicLessons>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainTopicLessons {
    pub title: String,
    pub subtopics: IndexMap<String, SubtopicLesson>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtopicLesson {
    pub title: String,
    pub description: String,
    pub content: String,
}

impl SubtopicLesson {
    pub fn new(subtopic: &Subtopic, lesson: LessonContent) -> Self {
        Self {
            title: subtopic.title.clone(),
            description: lesson.description,
            content: lesson.content,
        }
    }

    pub fn lesson(&self) -> LessonContent {
        LessonContent {
            description: self.description.clone(),
            content: self.content.clone(),
        }
    }
}

impl LessonTree {
    pub fn get(&self, main_topic_id: &str, subtopic_id: &str) -> Option<&SubtopicLesson> {
        self.main_topics
            .get(main_topic_id)
            .and_then(|main| main.subtopics.get(subtopic_id))
    }

    pub fn subtopic_count(&self) -> usize {
        self.main_topics.values().map(|m| m.subtopics.len()).sum()
    }
}

/// The terminal artifact handed to the front-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roadmap {
    pub roadmap: Vec<RoadmapNode>,
}

/// A node of the roadmap tree, tagged by `type` in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoadmapNode {
    MainTopic(MainTopicNode),
    Topic(TopicNode),
    Flashcards(FlashcardsNode),
    Quiz(QuizNode),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainTopicNode {
    pub id: String,
    pub title: String,
    pub description: String,
    pub children: Vec<RoadmapNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicNode {
    pub id: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub children: Vec<RoadmapNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardsNode {
    pub id: String,
    pub title: String,
    pub cards: Vec<Flashcard>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizNode {
    pub id: String,
    pub title: String,
    pub questions: Vec<QuizQuestion>,
}

impl RoadmapNode {
    /// A main-topic node holding the given topic nodes in order.
    pub fn main_topic(main_topic: &MainTopic, children: Vec<RoadmapNode>) -> Self {
        RoadmapNode::MainTopic(MainTopicNode {
            id: main_topic.id.clone(),
            title: main_topic.title.clone(),
            description: format!("Study guide for {}", main_topic.title),
            children,
        })
    }

    /// A topic node with its flashcards child followed by its quiz child.
    pub fn topic(subtopic: &Subtopic, lesson: &SubtopicLesson, assessment: Assessment) -> Self {
        RoadmapNode::Topic(TopicNode {
            id: subtopic.id.clone(),
            title: subtopic.title.clone(),
            description: lesson.description.clone(),
            content: lesson.content.clone(),
            children: vec![
                RoadmapNode::Flashcards(FlashcardsNode {
                    id: format!("{}-1", subtopic.id),
                    title: "Flashcards".to_string(),
                    cards: assessment.flashcards,
                }),
                RoadmapNode::Quiz(QuizNode {
                    id: format!("{}-2", subtopic.id),
                    title: "Quiz".to_string(),
                    questions: assessment.quiz,
                }),
            ],
        })
    }

    pub fn id(&self) -> &str {
        match self {
            RoadmapNode::MainTopic(node) => &node.id,
            RoadmapNode::Topic(node) => &node.id,
            RoadmapNode::Flashcards(node) => &node.id,
            RoadmapNode::Quiz(node) => &node.id,
        }
    }

    pub fn children(&self) -> &[RoadmapNode] {
        match self {
            RoadmapNode::MainTopic(node) => &node.children,
            RoadmapNode::Topic(node) => &node.children,
            RoadmapNode::Flashcards(_) | RoadmapNode::Quiz(_) => &[],
        }
    }
}

impl Roadmap {
    /// Number of `topic` nodes across every main topic.
    pub fn topic_count(&self) -> usize {
        self.roadmap.iter().map(|main| main.children().len()).sum()
    }
}
