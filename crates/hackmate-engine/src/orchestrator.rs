//! Two-stage pipeline: classify + retrieve, then dispatch to the matching
//! specialist. This is the single entry point the HTTP layer consumes.

use tracing::{debug, info};

use crate::client::ModelClient;
use crate::domain::store::StateStore;
use crate::domain::types::RoadmapStep;
use crate::error::Result;
use crate::intent::{self, Intent};
use crate::retrieval::ContextRetriever;
use crate::specialists::{analytics, ideas, recommendation, team_formation};

/// Demo-only default used when the caller supplies no usable student id.
pub const DEMO_STUDENT_ID: i64 = 1;

/// Tech stack assumed for the idea-generation default branch of the chat
/// dispatcher, where no explicit stack is supplied.
const DEFAULT_TECH_STACK: &str = "React, Python";

pub struct Orchestrator<M: ModelClient> {
    model: M,
    store: StateStore,
    retriever: ContextRetriever,
}

impl<M: ModelClient> Orchestrator<M> {
    pub fn new(model: M, store: StateStore, retriever: ContextRetriever) -> Self {
        Self {
            model,
            store,
            retriever,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn retriever(&self) -> &ContextRetriever {
        &self.retriever
    }

    /// Stage 1: classification and retrieval. The two are independent; they
    /// run sequentially here, and both complete before dispatch.
    pub async fn classify_and_retrieve(&self, message: &str) -> Result<(String, String)> {
        let label = intent::classify(&self.model, message).await?;
        let context = self.retriever.retrieve_joined(&self.store, message).await?;
        debug!(%label, context_chars = context.len(), "stage 1 complete");
        Ok((label, context))
    }

    /// Stage 2: priority-ordered dispatch to exactly one specialist. The
    /// raw label goes through [`Intent::resolve`], so unexpected classifier
    /// output lands on the idea-generation default rather than failing.
    pub async fn dispatch(&self, label: &str, context: &str, student_id: i64) -> Result<String> {
        let intent = Intent::resolve(label);
        info!(%label, ?intent, student_id, "dispatching");

        match intent {
            Intent::Recommendation => {
                recommendation::narrative(&self.model, &self.store, student_id, context).await
            }
            Intent::TeamMatching => {
                team_formation::suggest(&self.model, &self.store, student_id).await
            }
            Intent::Analytics => analytics::department(&self.model, &self.store).await,
            Intent::IdeaGen => ideas::generate(&self.model, context, DEFAULT_TECH_STACK).await,
        }
    }

    /// The full chat pipeline. A missing or non-numeric student id falls
    /// back to [`DEMO_STUDENT_ID`]. Returns the raw classifier label along
    /// with the specialist output.
    pub async fn handle(&self, message: &str, student_id: Option<&str>) -> Result<(String, String)> {
        let student_id = parse_student_id(student_id);
        let (label, context) = self.classify_and_retrieve(message).await?;
        let output = self.dispatch(&label, &context, student_id).await?;
        Ok((label, output))
    }
}

pub fn parse_student_id(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(DEMO_STUDENT_ID)
}

/// Joins roadmap steps, in ascending id order, into a move-to/line-to path
/// description for the caller's visualization layer.
pub fn roadmap_path(steps: &[RoadmapStep]) -> String {
    let mut ordered: Vec<&RoadmapStep> = steps.iter().collect();
    ordered.sort_by_key(|s| s.id);

    let points: Vec<String> = ordered.iter().map(|s| format!("{} {}", s.x, s.y)).collect();
    match points.split_first() {
        Some((first, rest)) if !rest.is_empty() => format!("M {} L {}", first, rest.join(" L ")),
        Some((first, _)) => format!("M {}", first),
        None => String::new(),
    }
}
