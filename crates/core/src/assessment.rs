//! Flashcard and quiz generation grounded in a subtopic's lesson.

use crate::{
    error::PipelineError,
    gate::ConcurrencyGate,
    lesson::LessonContent,
    llm_client::{Completion, CompletionRequest, FunctionSchema},
    retry::CompletionClient,
    storage::{OutputStore, RecordKind},
    topic::{MainTopic, Subtopic},
};
use anyhow::{Result, bail};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const FUNCTION_NAME: &str = "generate_assessments";
const FUNCTION_DESCRIPTION: &str =
    "Generates flashcards and quiz questions based on a lesson's content";

const SYSTEM_PROMPT: &str = "You are an expert educator specializing in creating high-quality assessment materials.

Your task is to create flashcards and quiz questions that:
1. Test key concepts and information directly from the lesson content
2. Cover the most important points from the lesson
3. Range from basic recall to application of concepts
4. Are clear, unambiguous, and properly formatted
5. Have accurate answers that match the information in the lesson";

/// Flashcards and quiz questions for one subtopic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Assessment {
    /// A set of flashcards with questions and answers based on the lesson content.
    pub flashcards: Vec<Flashcard>,
    /// A set of multiple choice questions based on the lesson content.
    pub quiz: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Flashcard {
    /// A question about a key concept from the lesson.
    pub question: String,
    /// A clear, accurate answer to the question.
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QuizQuestion {
    /// A question testing understanding of the lesson content.
    pub question: String,
    /// Four possible answer options labeled A through D.
    pub options: [String; 4],
    /// The letter of the correct answer.
    pub correct: AnswerKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum AnswerKey {
    A,
    B,
    C,
    D,
}

impl Assessment {
    /// Generic cards and one generic question, used when every attempt failed.
    pub fn fallback(main_topic: &MainTopic, subtopic: &Subtopic) -> Self {
        let title = &subtopic.title;
        Self {
            flashcards: vec![
                Flashcard {
                    question: format!("What is {}?", title),
                    answer: format!("See lesson content for details on {}.", title),
                },
                Flashcard {
                    question: format!("Why is {} important?", title),
                    answer: format!("It's a key concept in {}.", main_topic.title),
                },
            ],
            quiz: vec![QuizQuestion {
                question: format!("Which of the following best describes {}?", title),
                options: [
                    "A specific concept in the subject".to_string(),
                    "Unrelated to the subject".to_string(),
                    "Too broad to define".to_string(),
                    "None of the above".to_string(),
                ],
                correct: AnswerKey::A,
            }],
        }
    }

    fn from_completion(completion: Completion) -> Result<Self> {
        let assessment: Assessment = serde_json::from_value(completion.into_arguments()?)?;
        if assessment.flashcards.is_empty() {
            bail!("Assessment contained no flashcards");
        }
        if assessment.quiz.is_empty() {
            bail!("Assessment contained no quiz questions");
        }
        Ok(assessment)
    }
}

/// Generates assessments with a schema-constrained completion.
#[derive(Clone)]
pub struct AssessmentGenerator {
    client: CompletionClient,
    gate: ConcurrencyGate,
    store: OutputStore,
    schema: FunctionSchema,
}

impl AssessmentGenerator {
    pub fn new(
        client: CompletionClient,
        gate: ConcurrencyGate,
        store: OutputStore,
    ) -> Result<Self> {
        Ok(Self {
            client,
            gate,
            store,
            schema: FunctionSchema::for_type::<Assessment>(FUNCTION_NAME, FUNCTION_DESCRIPTION)?,
        })
    }

    /// Produces the assessment for `subtopic` from its lesson, falling back to
    /// generic material when the model cannot be reached. The record is
    /// persisted in the background.
    pub async fn generate(
        &self,
        subject: &str,
        main_topic: &MainTopic,
        subtopic: &Subtopic,
        lesson: &LessonContent,
    ) -> Result<Assessment, PipelineError> {
        info!(subtopic = %subtopic.title, "Generating assessments");
        let request = CompletionRequest::structured(
            SYSTEM_PROMPT,
            user_prompt(subtopic, lesson),
            self.schema.clone(),
        );

        let outcome = {
            let _permit = self.gate.acquire().await?;
            self.client
                .complete_with(&subtopic.id, request, Assessment::from_completion)
                .await
        };

        let assessment = outcome.unwrap_or_else(|exhausted| {
            warn!(
                subtopic = %subtopic.title,
                attempts = exhausted.attempts,
                "Using fallback assessments"
            );
            Assessment::fallback(main_topic, subtopic)
        });
        info!(
            subtopic = %subtopic.title,
            flashcards = assessment.flashcards.len(),
            questions = assessment.quiz.len(),
            "Assessments ready"
        );

        self.store.persist_detached(
            self.store.record_path(
                subject,
                &main_topic.id,
                &subtopic.id,
                RecordKind::Assessments,
            ),
            &assessment,
        );
        Ok(assessment)
    }
}

fn user_prompt(subtopic: &Subtopic, lesson: &LessonContent) -> String {
    format!(
        "Create flashcards and quiz questions based specifically on this lesson content about \"{title}\":

LESSON DESCRIPTION:
{description}

LESSON CONTENT:
{content}

Create:
1. 3-5 flashcards with questions and answers - these should test recall of key definitions, concepts, and facts presented in the lesson
2. 2-3 multiple choice questions - these should test deeper understanding and application of the material

IMPORTANT:
- Only include information that appears in the lesson content
- Questions should match the level and terminology used in the lesson
- For multiple choice questions, ensure one option is clearly correct while the others are plausible but incorrect
- Make the incorrect options realistic but clearly wrong to someone who understood the lesson
- Format multiple choice options as complete sentences that grammatically complete the question stem",
        title = subtopic.title,
        description = lesson.description,
        content = lesson.content,
    )
}
