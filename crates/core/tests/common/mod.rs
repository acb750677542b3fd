#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use roadmap_core::{
    curriculum::MockCurriculumService,
    gate::{ConcurrencyGate, GATE_CAPACITY},
    llm_client::{Completion, CompletionRequest, LLMClient, ResponseMode},
    pipeline::RoadmapPipeline,
    retry::RetryPolicy,
    storage::OutputStore,
    topic::{MainTopic, Subtopic, TopicStructure},
};
use serde_json::json;
use std::{
    collections::HashMap,
    path::Path,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

/// Which stage a request belongs to, with the subtopic title it is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Lesson(String),
    Assessment(String),
}

impl Call {
    pub fn title(&self) -> &str {
        match self {
            Call::Lesson(title) | Call::Assessment(title) => title,
        }
    }

    fn of(request: &CompletionRequest) -> Call {
        match &request.mode {
            ResponseMode::FreeText => {
                Call::Lesson(quoted_after(&request.user_prompt, "the subtopic \""))
            }
            ResponseMode::Structured(_) => {
                Call::Assessment(quoted_after(&request.user_prompt, "lesson content about \""))
            }
        }
    }
}

fn quoted_after(prompt: &str, marker: &str) -> String {
    prompt
        .split_once(marker)
        .and_then(|(_, rest)| rest.split_once('"'))
        .map(|(title, _)| title.to_string())
        .unwrap_or_default()
}

type Behavior = dyn Fn(&Call, u32) -> Result<Completion> + Send + Sync;
type Delay = dyn Fn(&Call) -> Duration + Send + Sync;

/// A scripted `LLMClient` that records what it sees.
pub struct StubClient {
    behavior: Box<Behavior>,
    delay: Box<Delay>,
    attempts: Mutex<HashMap<String, u32>>,
    finished: Mutex<Vec<Call>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl StubClient {
    /// `behavior` receives the call and its 1-based attempt number for that call.
    pub fn new(behavior: impl Fn(&Call, u32) -> Result<Completion> + Send + Sync + 'static) -> Self {
        Self {
            behavior: Box::new(behavior),
            delay: Box::new(|_| Duration::ZERO),
            attempts: Mutex::new(HashMap::new()),
            finished: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(|call, _| Ok(stub_completion(call)))
    }

    pub fn failing() -> Self {
        Self::new(|_, _| Err(anyhow!("service unavailable")))
    }

    pub fn with_delay(mut self, delay: impl Fn(&Call) -> Duration + Send + Sync + 'static) -> Self {
        self.delay = Box::new(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Calls in the order they returned.
    pub fn finished(&self) -> Vec<Call> {
        self.finished.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMClient for StubClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        let call = Call::of(&request);
        self.calls.fetch_add(1, Ordering::SeqCst);
        let attempt = {
            let key = format!("{:?}", call);
            let mut attempts = self.attempts.lock().unwrap();
            let entry = attempts.entry(key).or_insert(0);
            *entry += 1;
            *entry
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep((self.delay)(&call)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let result = (self.behavior)(&call, attempt);
        self.finished.lock().unwrap().push(call);
        result
    }
}

/// Deterministic content derived from the subtopic title.
pub fn stub_completion(call: &Call) -> Completion {
    match call {
        Call::Lesson(title) => Completion::Text(format!(
            "DESCRIPTION: Stub summary of {title}.\nCONTENT:\nStub lesson about {title}."
        )),
        Call::Assessment(title) => Completion::Arguments(json!({
            "flashcards": [
                { "question": format!("Stub card 1 on {title}?"), "answer": "Yes." },
                { "question": format!("Stub card 2 on {title}?"), "answer": "No." },
                { "question": format!("Stub card 3 on {title}?"), "answer": "Maybe." }
            ],
            "quiz": [{
                "question": format!("Stub question on {title}?"),
                "options": ["one", "two", "three", "four"],
                "correct": "C"
            }, {
                "question": format!("Second stub question on {title}?"),
                "options": ["one", "two", "three", "four"],
                "correct": "D"
            }]
        })),
    }
}

/// The Collections example: one main topic with ArrayList and HashMap.
pub fn java_structure() -> TopicStructure {
    TopicStructure {
        topics: vec![MainTopic {
            id: "main-1".to_string(),
            title: "Collections".to_string(),
            subtopics: vec![
                Subtopic::new("main-1-1", "ArrayList"),
                Subtopic::new("main-1-2", "HashMap"),
            ],
        }],
    }
}

/// A structure whose main topic `i` has `shape[i]` subtopics.
pub fn structure_with_shape(shape: &[usize]) -> TopicStructure {
    TopicStructure {
        topics: shape
            .iter()
            .enumerate()
            .map(|(i, &count)| MainTopic {
                id: format!("main-{}", i + 1),
                title: format!("Topic {}", i + 1),
                subtopics: (0..count)
                    .map(|j| {
                        Subtopic::new(
                            format!("main-{}-{}", i + 1, j + 1),
                            format!("Concept {}.{}", i + 1, j + 1),
                        )
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// Default policy with instant backoff, for tests that run on a real clock.
pub fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        backoff: Duration::ZERO,
        ..RetryPolicy::default()
    }
}

pub fn pipeline(
    structure: TopicStructure,
    client: Arc<StubClient>,
    policy: RetryPolicy,
    output: &Path,
) -> RoadmapPipeline {
    RoadmapPipeline::new(
        Arc::new(MockCurriculumService::with_structure(structure)),
        client,
        policy,
        ConcurrencyGate::new(GATE_CAPACITY),
        OutputStore::new(output),
    )
    .unwrap()
}
