use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use hackmate_engine::client::{GeminiClient, GeminiEmbedder};
use hackmate_engine::config::EngineConfig;
use hackmate_engine::domain::store::StateStore;
use hackmate_engine::orchestrator::{Orchestrator, roadmap_path};
use hackmate_engine::retrieval::ContextRetriever;
use hackmate_engine::specialists::{analytics, ideas, recommendation, roadmap, team_formation};

#[derive(Parser, Debug)]
#[command(version, about = "Intent-routed hackathon assistant", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full chat pipeline on a message.
    Chat {
        message: String,
        /// Student id; a missing or non-numeric value uses the demo id.
        #[arg(long)]
        student: Option<String>,
    },
    /// Structured personalized recommendations.
    Recommend { student_id: i64 },
    /// Narrative team pairing suggestion.
    Team { student_id: i64 },
    /// Project ideas for a theme and tech stack.
    Ideas {
        theme: String,
        #[arg(long, default_value = "React, Python")]
        stack: String,
    },
    /// Department analytics summary.
    Analytics,
    /// 5-step roadmap plus its visualization path.
    Roadmap { student_id: i64, hackathon_id: i64 },
    /// Rebuild the similarity index from the current catalog.
    Reindex,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = EngineConfig::from_env()?;

    let model = GeminiClient::new(config.api_key.clone()).with_model(config.model.clone());
    let embedder =
        GeminiEmbedder::new(config.api_key.clone()).with_model(config.embed_model.clone());
    let store = StateStore::new(&config.database_url).await?;
    let retriever = ContextRetriever::new(Arc::new(embedder), config.retrieval_k);

    match args.command {
        Command::Chat { message, student } => {
            let orch = Orchestrator::new(model, store, retriever);
            let (intent, output) = orch.handle(&message, student.as_deref()).await?;
            println!("[{}]\n{}", intent, output);
        }
        Command::Recommend { student_id } => {
            let recs = recommendation::personalized(&model, &store, student_id).await?;
            println!("{}", serde_json::to_string_pretty(&recs)?);
        }
        Command::Team { student_id } => {
            println!("{}", team_formation::suggest(&model, &store, student_id).await?);
        }
        Command::Ideas { theme, stack } => {
            println!("{}", ideas::generate(&model, &theme, &stack).await?);
        }
        Command::Analytics => {
            println!("{}", analytics::department(&model, &store).await?);
        }
        Command::Roadmap {
            student_id,
            hackathon_id,
        } => {
            let steps = roadmap::generate(&model, &store, student_id, hackathon_id).await?;
            if steps.is_empty() {
                println!("unknown student or hackathon");
            } else {
                println!("{}", serde_json::to_string_pretty(&steps)?);
                println!("path: {}", roadmap_path(&steps));
            }
        }
        Command::Reindex => {
            let listings = store.hackathons_all().await?;
            let indexed = retriever.reindex(&store, &listings).await?;
            println!("indexed {} passages", indexed);
        }
    }

    Ok(())
}
