//! Command-line entrypoint: generate one roadmap and report where it was written.
//!
//! Reads provider settings from the environment (see `roadmap_core::config`).

use anyhow::{Context, Result, bail};
use clap::Parser;
use roadmap_core::{
    RoadmapPipeline,
    config::Config,
    curriculum::LLMCurriculumService,
    gate::ConcurrencyGate,
    llm_client::{LLMClient, OpenAICompatibleClient},
    retry::{CompletionClient, RetryPolicy},
    storage::OutputStore,
};
use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::Arc,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "roadmap", version)]
#[command(about = "Generate a study roadmap with lessons, flashcards and quizzes for a subject")]
struct Args {
    /// Subject to build the roadmap for (e.g. Java). Prompted for when omitted.
    #[arg(long, short)]
    topic: Option<String>,

    /// Directory for generated files. Overrides OUTPUT_DIR.
    #[arg(long, short)]
    output_dir: Option<PathBuf>,
}

fn prompt_for_topic() -> Result<String> {
    print!("Enter a subject for your study roadmap: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read subject from stdin")?;
    Ok(line)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(io::stderr)
        .init();

    let topic = match args.topic {
        Some(topic) => topic,
        None => prompt_for_topic()?,
    };
    let topic = topic.trim();
    if topic.is_empty() {
        bail!("A subject is required");
    }

    let llm_client: Arc<dyn LLMClient> = Arc::new(OpenAICompatibleClient::new(
        config.openai_config(),
        config.chat_model.clone(),
    ));
    let policy = RetryPolicy::default();
    let curriculum = Arc::new(LLMCurriculumService::new(CompletionClient::new(
        llm_client.clone(),
        policy,
    ))?);
    let store = OutputStore::new(config.output_dir.clone());
    let pipeline = RoadmapPipeline::new(
        curriculum,
        llm_client,
        policy,
        ConcurrencyGate::default(),
        store.clone(),
    )?;

    info!(
        provider = ?config.provider,
        model = %config.chat_model,
        topic,
        "Generating roadmap"
    );
    let roadmap = pipeline
        .generate_roadmap(topic)
        .await
        .with_context(|| format!("Failed to generate roadmap for {topic}"))?;

    println!(
        "Roadmap with {} main topics and {} topics saved to {}",
        roadmap.roadmap.len(),
        roadmap.topic_count(),
        store.roadmap_path(topic).display()
    );
    Ok(())
}
