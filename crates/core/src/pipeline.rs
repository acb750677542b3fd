//! Tree fan-out orchestration.
//!
//! Each pass spawns one task per subtopic onto a [`JoinSet`], waits for all of
//! them, and only then writes its aggregate. Tasks carry the position of their
//! subtopic (main-topic index, subtopic index) and fill a pre-sized slot, so
//! output order is the input order regardless of completion order.
//!
//! A task that dies (panic, closed gate) does not stop its siblings: the pass
//! drains every task first and reports the first failure afterwards.

use crate::{
    assessment::AssessmentGenerator,
    curriculum::CurriculumService,
    error::PipelineError,
    gate::ConcurrencyGate,
    lesson::LessonGenerator,
    llm_client::LLMClient,
    retry::{CompletionClient, RetryPolicy},
    roadmap::{LessonTree, MainTopicLessons, Roadmap, RoadmapNode, SubtopicLesson},
    storage::OutputStore,
    topic::TopicStructure,
};
use anyhow::Result;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

type Slots<T> = Vec<Vec<Option<T>>>;

fn slots_for<T>(structure: &TopicStructure) -> Slots<T> {
    structure
        .topics
        .iter()
        .map(|main| (0..main.subtopics.len()).map(|_| None).collect())
        .collect()
}

/// Runs the three generation stages for a subject.
#[derive(Clone)]
pub struct RoadmapPipeline {
    curriculum: Arc<dyn CurriculumService>,
    lessons: LessonGenerator,
    assessments: AssessmentGenerator,
    gate: ConcurrencyGate,
    store: OutputStore,
}

impl RoadmapPipeline {
    /// Builds a pipeline whose generators share one `client`, `gate` and `store`.
    pub fn new(
        curriculum: Arc<dyn CurriculumService>,
        client: Arc<dyn LLMClient>,
        policy: RetryPolicy,
        gate: ConcurrencyGate,
        store: OutputStore,
    ) -> Result<Self> {
        let client = CompletionClient::new(client, policy);
        Ok(Self {
            curriculum,
            lessons: LessonGenerator::new(client.clone(), gate.clone(), store.clone()),
            assessments: AssessmentGenerator::new(client, gate.clone(), store.clone())?,
            gate,
            store,
        })
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    pub fn store(&self) -> &OutputStore {
        &self.store
    }

    /// Structure, then lessons, then assessments. Never returns a partial roadmap.
    pub async fn generate_roadmap(&self, subject: &str) -> Result<Roadmap, PipelineError> {
        let structure = self.generate_structure(subject).await?;
        let lessons = self.generate_content(subject, &structure).await?;
        self.generate_assessments(subject, &structure, &lessons).await
    }

    /// Produces, validates and persists the topic structure.
    pub async fn generate_structure(&self, subject: &str) -> Result<TopicStructure, PipelineError> {
        info!(subject, "Generating topic structure");
        let structure = self
            .curriculum
            .generate_structure(subject)
            .await
            .map_err(|source| PipelineError::Structure {
                subject: subject.to_string(),
                source,
            })?;
        structure.validate()?;

        info!(
            subject,
            main_topics = structure.topics.len(),
            subtopics = structure.subtopic_count(),
            "Topic structure ready"
        );
        self.store
            .persist(&self.store.structure_path(subject), &structure)
            .await;
        Ok(structure)
    }

    /// Content pass: one lesson per subtopic, then the aggregate lesson tree.
    pub async fn generate_content(
        &self,
        subject: &str,
        structure: &TopicStructure,
    ) -> Result<LessonTree, PipelineError> {
        info!(subject, subtopics = structure.subtopic_count(), "Starting content pass");
        let shared = Arc::new(structure.clone());
        let subject: Arc<str> = Arc::from(subject);
        let mut tasks = JoinSet::new();

        for (mi, main) in structure.topics.iter().enumerate() {
            for si in 0..main.subtopics.len() {
                let generator = self.lessons.clone();
                let structure = shared.clone();
                let subject = subject.clone();
                tasks.spawn(async move {
                    let main = &structure.topics[mi];
                    let subtopic = &main.subtopics[si];
                    let lesson = generator.generate(&subject, main, subtopic).await;
                    (mi, si, lesson.map(|l| SubtopicLesson::new(subtopic, l)))
                });
            }
        }

        let mut slots = slots_for::<SubtopicLesson>(structure);
        let drained = drain(&mut tasks, &mut slots).await;
        self.store.flush().await;
        drained?;

        let mut tree = LessonTree::default();
        for (main, row) in structure.topics.iter().zip(slots) {
            let subtopics = main
                .subtopics
                .iter()
                .zip(row)
                .filter_map(|(sub, slot)| slot.map(|lesson| (sub.id.clone(), lesson)))
                .collect();
            tree.main_topics.insert(
                main.id.clone(),
                MainTopicLessons {
                    title: main.title.clone(),
                    subtopics,
                },
            );
        }

        let path = self.store.content_path(&subject);
        self.store.persist(&path, &tree).await;
        info!(subject = %subject, path = %path.display(), "Content pass complete");
        Ok(tree)
    }

    /// Assessment pass: one assessment per subtopic with lesson content, then
    /// the final roadmap.
    pub async fn generate_assessments(
        &self,
        subject: &str,
        structure: &TopicStructure,
        lessons: &LessonTree,
    ) -> Result<Roadmap, PipelineError> {
        info!(subject, subtopics = structure.subtopic_count(), "Starting assessment pass");
        let shared = Arc::new(structure.clone());
        let subject: Arc<str> = Arc::from(subject);
        let mut tasks = JoinSet::new();

        for (mi, main) in structure.topics.iter().enumerate() {
            for (si, subtopic) in main.subtopics.iter().enumerate() {
                let Some(lesson) = lessons.get(&main.id, &subtopic.id).cloned() else {
                    warn!(
                        subtopic = %subtopic.title,
                        "No lesson content found, skipping assessments"
                    );
                    continue;
                };
                let generator = self.assessments.clone();
                let structure = shared.clone();
                let subject = subject.clone();
                tasks.spawn(async move {
                    let main = &structure.topics[mi];
                    let subtopic = &main.subtopics[si];
                    let node = generator
                        .generate(&subject, main, subtopic, &lesson.lesson())
                        .await
                        .map(|assessment| RoadmapNode::topic(subtopic, &lesson, assessment));
                    (mi, si, node)
                });
            }
        }

        let mut slots = slots_for::<RoadmapNode>(structure);
        let drained = drain(&mut tasks, &mut slots).await;
        self.store.flush().await;
        drained?;

        let roadmap = Roadmap {
            roadmap: structure
                .topics
                .iter()
                .zip(slots)
                .map(|(main, row)| RoadmapNode::main_topic(main, row.into_iter().flatten().collect()))
                .collect(),
        };

        let path = self.store.roadmap_path(&subject);
        self.store.persist(&path, &roadmap).await;
        info!(subject = %subject, path = %path.display(), "Roadmap complete");
        Ok(roadmap)
    }
}

/// Awaits every task, filling `slots` from the successful ones.
///
/// Returns the first failure only after the whole set has finished.
async fn drain<T: Send + 'static>(
    tasks: &mut JoinSet<(usize, usize, Result<T, PipelineError>)>,
    slots: &mut Slots<T>,
) -> Result<(), PipelineError> {
    let mut first_failure = None;
    while let Some(joined) = tasks.join_next().await {
        let failure = match joined {
            Ok((mi, si, Ok(value))) => {
                slots[mi][si] = Some(value);
                continue;
            }
            Ok((_, _, Err(e))) => e,
            Err(e) => PipelineError::Task(e),
        };
        error!(error = %failure, "Subtopic task failed");
        first_failure.get_or_insert(failure);
    }
    match first_failure {
        Some(failure) => Err(failure),
        None => Ok(()),
    }
}
