use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::ModelClient;
use crate::domain::store::StateStore;
use crate::domain::types::{HackathonListing, RecommendationResult, StudentProfile};
use crate::error::{EngineError, Result};
use crate::structured;

/// Reason attached to every fallback entry.
pub const UNAVAILABLE_REASON: &str = "Recommendation temporarily unavailable";

const MAX_RESULTS: usize = 3;

const PERSONALIZED_PROMPT: &str = "You are a Hackathon Recommendation Agent.
Recommend the top 3 hackathons based on student skills, interests, and experience level.

Student Profile: {profile}
Active Hackathons: {hackathons}

Output MUST be a valid JSON array of objects with these keys:
\"hackathon_id\", \"name\", \"description\", \"match_score\" (0-100), \"reason\" (brief explanation).
ONLY return the JSON.";

const NARRATIVE_PROMPT: &str = "You are a Hackathon Recommendation Agent.
Recommend hackathons based on the student profile.

Student Profile: {profile}
Active Hackathons: {hackathons}
Context: {context}

Provide helpful text-based recommendations.";

const RECOMMENDATION_SCHEMA: &str = r#"{
    "type": "array",
    "items": {
        "type": "object",
        "required": ["name", "description", "match_score", "reason"],
        "properties": {
            "hackathon_id": { "type": ["integer", "number", "string", "null"] },
            "name": { "type": "string" },
            "description": { "type": "string" },
            "match_score": { "type": "number", "minimum": 0, "maximum": 100 },
            "reason": { "type": "string" }
        }
    }
}"#;

/// A recommendation as the model emitted it, before id resolution.
#[derive(Debug, Deserialize)]
struct RawRecommendation {
    #[serde(default)]
    hackathon_id: Option<Value>,
    name: String,
    description: String,
    match_score: f64,
    reason: String,
}

/// Structured recommendations for the dashboard path. Model and parse
/// failures are absorbed: the caller always gets up to three entries whose
/// ids exist in the catalog. An unknown student yields an empty list.
pub async fn personalized<M: ModelClient + ?Sized>(
    model: &M,
    store: &StateStore,
    student_id: i64,
) -> Result<Vec<RecommendationResult>> {
    let Some(student) = store.student(student_id).await? else {
        return Ok(Vec::new());
    };
    let catalog = store.hackathons_all().await?;

    match generate(model, &student, &catalog).await {
        Ok(recs) => Ok(recs),
        Err(e) if e.is_upstream() => {
            warn!(error = %e, "recommendation fell back to plain catalog entries");
            Ok(fallback(&catalog))
        }
        Err(e) => Err(e),
    }
}

async fn generate<M: ModelClient + ?Sized>(
    model: &M,
    student: &StudentProfile,
    catalog: &[HackathonListing],
) -> Result<Vec<RecommendationResult>> {
    let profile = format!(
        "Skills: {}, Interests: {}, Experience: {}",
        student.skills.join(", "),
        student.interests.join(", "),
        student.experience_level
    );
    let hackathons = catalog
        .iter()
        .map(|h| {
            format!(
                "- ID: {}, Name: {}: {} (Skills Required: {})",
                h.hackathon_id,
                h.name,
                h.description,
                h.skills_required.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = PERSONALIZED_PROMPT
        .replace("{profile}", &profile)
        .replace("{hackathons}", &hackathons);

    let response = model.complete(&prompt).await?;
    let raw: Vec<RawRecommendation> = structured::parse_array(&response, RECOMMENDATION_SCHEMA)?;

    let resolved: Vec<RecommendationResult> = raw
        .into_iter()
        .filter_map(|rec| resolve(rec, catalog))
        .take(MAX_RESULTS)
        .collect();
    debug!(returned = resolved.len(), "recommendations resolved");
    Ok(resolved)
}

/// Resolves the model's `hackathon_id` against the live catalog. A numeric
/// id must exist in the catalog; otherwise resolution falls back to a
/// case-insensitive exact name match. Entries that resolve to nothing are
/// dropped, not defaulted.
fn resolve(rec: RawRecommendation, catalog: &[HackathonListing]) -> Option<RecommendationResult> {
    let claimed = rec.hackathon_id.as_ref().and_then(|v| match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    });

    let id = claimed
        .filter(|id| catalog.iter().any(|h| h.hackathon_id == *id))
        .or_else(|| {
            catalog
                .iter()
                .find(|h| h.name.eq_ignore_ascii_case(&rec.name))
                .map(|h| h.hackathon_id)
        })?;

    Some(RecommendationResult {
        hackathon_id: id,
        name: rec.name,
        description: rec.description,
        match_score: rec.match_score.round().clamp(0.0, 100.0) as u8,
        reason: rec.reason,
    })
}

fn fallback(catalog: &[HackathonListing]) -> Vec<RecommendationResult> {
    catalog
        .iter()
        .take(MAX_RESULTS)
        .map(|h| RecommendationResult {
            hackathon_id: h.hackathon_id,
            name: h.name.clone(),
            description: h.description.clone(),
            match_score: 0,
            reason: UNAVAILABLE_REASON.to_string(),
        })
        .collect()
}

/// Free-text variant used by the chat path. No validation, no fallback;
/// upstream failures propagate.
pub async fn narrative<M: ModelClient + ?Sized>(
    model: &M,
    store: &StateStore,
    student_id: i64,
    context: &str,
) -> Result<String> {
    let student = store
        .student(student_id)
        .await?
        .ok_or(EngineError::NotFound {
            kind: "student",
            id: student_id,
        })?;
    let catalog = store.hackathons_all().await?;

    let profile = format!(
        "Name: {}, Skills: {}, Department: {}, Interests: {}, Experience Level: {}",
        student.name,
        student.skills.join(", "),
        student.department,
        student.interests.join(", "),
        student.experience_level
    );
    let hackathons = catalog
        .iter()
        .map(|h| {
            format!(
                "- {}: {} (Skills: {}, Deadline: {})",
                h.name,
                h.description,
                h.skills_required.join(", "),
                h.deadline.format("%Y-%m-%d")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = NARRATIVE_PROMPT
        .replace("{profile}", &profile)
        .replace("{hackathons}", &hackathons)
        .replace("{context}", context);

    model.complete(&prompt).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mocks::MockModelClient;
    use crate::domain::types::ExperienceLevel;
    use chrono::{TimeZone, Utc};

    async fn seeded_store() -> StateStore {
        let store = StateStore::in_memory().await.unwrap();
        store
            .insert_student(
                "Asha",
                "CSE",
                ExperienceLevel::Expert,
                &["Python".into()],
                &["AI".into()],
            )
            .await
            .unwrap();
        for (name, desc) in [
            ("AI Innovation Challenge", "ML for social good"),
            ("Web3 Jam", "decentralized apps"),
            ("Data Sprint", "analytics marathon"),
            ("Robo Rumble", "robotics"),
        ] {
            store
                .insert_hackathon(
                    name,
                    desc,
                    &["Python".into()],
                    Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
                )
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn resolves_name_only_ids_and_drops_unresolvable_entries() {
        let store = seeded_store().await;
        let model = MockModelClient::new(vec![
            r#"```json
[
  {"hackathon_id": "N/A", "name": "AI INNOVATION CHALLENGE", "description": "ML", "match_score": 95, "reason": "skills match"},
  {"hackathon_id": "nope", "name": "Ghost Hack", "description": "does not exist", "match_score": 80, "reason": "-"},
  {"hackathon_id": 2, "name": "Web3 Jam", "description": "dapps", "match_score": 70, "reason": "interests"}
]
```"#
                .to_string(),
        ]);

        let recs = personalized(&model, &store, 1).await.unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].hackathon_id, 1);
        assert_eq!(recs[0].match_score, 95);
        assert_eq!(recs[1].hackathon_id, 2);
    }

    #[tokio::test]
    async fn caps_results_at_three() {
        let store = seeded_store().await;
        let entries: Vec<String> = (1..=4)
            .map(|id| {
                format!(
                    r#"{{"hackathon_id": {id}, "name": "H{id}", "description": "d", "match_score": 50, "reason": "-"}}"#
                )
            })
            .collect();
        let model = MockModelClient::new(vec![format!("[{}]", entries.join(","))]);

        let recs = personalized(&model, &store, 1).await.unwrap();
        assert_eq!(recs.len(), 3);
    }

    #[tokio::test]
    async fn malformed_output_falls_back_to_catalog() {
        let store = seeded_store().await;
        let model = MockModelClient::new(vec!["I'd love to, but no JSON today".to_string()]);

        let recs = personalized(&model, &store, 1).await.unwrap();
        assert_eq!(recs.len(), 3);
        for rec in &recs {
            assert_eq!(rec.match_score, 0);
            assert_eq!(rec.reason, UNAVAILABLE_REASON);
        }
    }

    #[tokio::test]
    async fn model_failure_falls_back_too() {
        let store = seeded_store().await;
        let model = MockModelClient::failing();

        let recs = personalized(&model, &store, 1).await.unwrap();
        assert_eq!(recs.len(), 3);
        assert!(recs.iter().all(|r| r.reason == UNAVAILABLE_REASON));
    }

    #[tokio::test]
    async fn unknown_student_yields_empty_list() {
        let store = seeded_store().await;
        let model = MockModelClient::new(vec![]);
        let recs = personalized(&model, &store, 42).await.unwrap();
        assert!(recs.is_empty());
    }

    #[tokio::test]
    async fn narrative_propagates_model_failure() {
        let store = seeded_store().await;
        let model = MockModelClient::failing();
        let err = narrative(&model, &store, 1, "some context").await.unwrap_err();
        assert!(matches!(err, EngineError::UpstreamModel(_)));
    }
}
