use tracing::debug;

use crate::client::ModelClient;
use crate::error::Result;

const CLASSIFY_PROMPT: &str = "Classify this hackathon query into exactly one category: \
RECOMMENDATION, TEAM_MATCHING, IDEA_GEN, ANALYTICS. \
Reply with the category label only. Query: ";

/// Asks the model to label the query. The reply is trimmed and upper-cased
/// verbatim; it is not checked against the known labels here. Resolution
/// to a closed intent happens in [`Intent::resolve`].
pub async fn classify<M: ModelClient + ?Sized>(model: &M, query: &str) -> Result<String> {
    let raw = model
        .complete(&format!("{}{}", CLASSIFY_PROMPT, query))
        .await?;
    let label = raw.trim().to_uppercase();
    debug!(%label, "query classified");
    Ok(label)
}

/// The closed set of intents the dispatcher can act on. Classifier output
/// is free text, so resolution is substring matching in a fixed priority
/// order; anything unrecognized falls through to idea generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Recommendation,
    TeamMatching,
    Analytics,
    IdeaGen,
}

impl Intent {
    /// Total, ordered resolution: a label containing several keywords goes
    /// to the first matching branch.
    pub fn resolve(label: &str) -> Intent {
        let upper = label.to_uppercase();
        if upper.contains("RECOMMENDATION") {
            Intent::Recommendation
        } else if upper.contains("TEAM") {
            Intent::TeamMatching
        } else if upper.contains("ANALYTICS") {
            Intent::Analytics
        } else {
            Intent::IdeaGen
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Intent::Recommendation => "RECOMMENDATION",
            Intent::TeamMatching => "TEAM_MATCHING",
            Intent::Analytics => "ANALYTICS",
            Intent::IdeaGen => "IDEA_GEN",
        };
        write!(f, "{}", s)
    }
}
