use crate::client::ModelClient;
use crate::domain::store::StateStore;
use crate::error::{EngineError, Result};

const TEAM_PROMPT: &str = "You are a Team Formation Agent. Suggest teams based on complementary skills.
Match the user with collaborators who fill their skill gaps.

User: {user}
Potential Collaborators: {pool}

Output format:
Team Suggestion:
[User Name] - [Core Skill]
[Collaborator 1 Name] - [Matching Skill]
[Collaborator 2 Name] - [Matching Skill]

Explain the logic of this team composition.";

/// Narrative pairing suggestion for the requesting student against the pool
/// of all other students. Free text; upstream failures propagate.
pub async fn suggest<M: ModelClient + ?Sized>(
    model: &M,
    store: &StateStore,
    student_id: i64,
) -> Result<String> {
    let user = store
        .student(student_id)
        .await?
        .ok_or(EngineError::NotFound {
            kind: "student",
            id: student_id,
        })?;
    let others = store.students_except(student_id).await?;

    let user_summary = format!(
        "{} (Skills: {}, Experience: {})",
        user.name,
        user.skills.join(", "),
        user.experience_level
    );
    let pool = others
        .iter()
        .map(|s| {
            format!(
                "- {} (Skills: {}, Experience: {})",
                s.name,
                s.skills.join(", "),
                s.experience_level
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = TEAM_PROMPT
        .replace("{user}", &user_summary)
        .replace("{pool}", &pool);

    model.complete(&prompt).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mocks::MockModelClient;
    use crate::domain::types::ExperienceLevel;

    #[tokio::test]
    async fn suggests_for_known_student() {
        let store = StateStore::in_memory().await.unwrap();
        store
            .insert_student("Asha", "CSE", ExperienceLevel::Expert, &["Rust".into()], &[])
            .await
            .unwrap();
        store
            .insert_student("Ben", "ECE", ExperienceLevel::Beginner, &["Design".into()], &[])
            .await
            .unwrap();

        let model = MockModelClient::new(vec!["Team Suggestion: Asha + Ben".to_string()]);
        let text = suggest(&model, &store, 1).await.unwrap();
        assert!(text.contains("Asha"));
    }

    #[tokio::test]
    async fn unknown_student_is_not_found() {
        let store = StateStore::in_memory().await.unwrap();
        let model = MockModelClient::new(vec![]);
        let err = suggest(&model, &store, 7).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound { id: 7, .. }));
    }
}
