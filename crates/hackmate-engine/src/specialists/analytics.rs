use tracing::debug;

use crate::client::ModelClient;
use crate::domain::store::StateStore;
use crate::error::Result;

const ANALYTICS_PROMPT: &str = "You are a Departmental Innovation Analyst.
Analyze the current participation data and provide a concise innovation summary.

Data: {data}

Provide:
1. Participation Rate
2. Top Trending Skills
3. Innovation Score (0-100) based on project complexity.";

/// Narrative department summary over two scalar counts. No fallback;
/// upstream failures propagate.
pub async fn department<M: ModelClient + ?Sized>(model: &M, store: &StateStore) -> Result<String> {
    let total_students = store.count_students().await?;
    let total_participations = store.count_participations().await?;
    debug!(total_students, total_participations, "analytics aggregates");

    let data = format!(
        "Total Students: {}, Total Participations: {}",
        total_students, total_participations
    );
    model
        .complete(&ANALYTICS_PROMPT.replace("{data}", &data))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mocks::MockModelClient;
    use crate::error::EngineError;

    #[tokio::test]
    async fn summarizes_counts() {
        let store = StateStore::in_memory().await.unwrap();
        let model = MockModelClient::new(vec!["Participation rate: 0%".to_string()]);
        let report = department(&model, &store).await.unwrap();
        assert!(report.contains("Participation"));
    }

    #[tokio::test]
    async fn propagates_model_failure() {
        let store = StateStore::in_memory().await.unwrap();
        let model = MockModelClient::failing();
        let err = department(&model, &store).await.unwrap_err();
        assert!(matches!(err, EngineError::UpstreamModel(_)));
    }
}
