use tracing::warn;

use crate::client::ModelClient;
use crate::domain::store::StateStore;
use crate::domain::types::{HackathonListing, RoadmapStep, StudentProfile};
use crate::error::{EngineError, Result};
use crate::structured;

pub const STEP_COUNT: usize = 5;

const ROADMAP_PROMPT: &str = "You are a Strategic Hackathon Roadmap Designer.
Generate a strictly structured 5-step roadmap for a student participating in a specific hackathon.
The roadmap must be tailored to the hackathon's theme and the student's skills.

Student Skills: {skills}
Hackathon: {hack_name}
Mission Objective: {hack_description}
Required Skills: {required_skills}

Output MUST be a valid JSON array of 5 objects with these exact keys:
\"id\" (1-5), \"title\" (short), \"description\" (brief actionable step), \"x\" (coordinate for visualization 100-700), \"y\" (coordinate 50-300).
ONLY return the JSON.";

const ROADMAP_SCHEMA: &str = r#"{
    "type": "array",
    "minItems": 5,
    "maxItems": 5,
    "items": {
        "type": "object",
        "required": ["id", "title", "description", "x", "y"],
        "properties": {
            "id": { "type": "integer", "minimum": 1, "maximum": 5 },
            "title": { "type": "string" },
            "description": { "type": "string" },
            "x": { "type": "integer", "minimum": 100, "maximum": 700 },
            "y": { "type": "integer", "minimum": 50, "maximum": 300 }
        }
    }
}"#;

/// The canonical default roadmap, substituted whenever the model's output
/// cannot be validated. Every caller that needs a default uses this one.
pub fn fallback_steps() -> Vec<RoadmapStep> {
    let canonical = [
        (1, "Research", "Analyze hackathon theme", 100, 150),
        (2, "Prototype", "Build core MVP", 250, 250),
        (3, "Refine", "Add advanced features", 400, 150),
        (4, "Test", "Final verification", 550, 250),
        (5, "Deploy", "Submit to judges", 700, 150),
    ];
    canonical
        .into_iter()
        .map(|(id, title, description, x, y)| RoadmapStep {
            id,
            title: title.to_string(),
            description: description.to_string(),
            x,
            y,
        })
        .collect()
}

/// Tailored 5-step roadmap for a (student, hackathon) pair. An unknown
/// student or hackathon yields an empty sequence, not an error; model and
/// parse failures yield the canonical fallback.
pub async fn generate<M: ModelClient + ?Sized>(
    model: &M,
    store: &StateStore,
    student_id: i64,
    hackathon_id: i64,
) -> Result<Vec<RoadmapStep>> {
    let (Some(student), Some(hackathon)) = (
        store.student(student_id).await?,
        store.hackathon(hackathon_id).await?,
    ) else {
        return Ok(Vec::new());
    };

    match generate_steps(model, &student, &hackathon).await {
        Ok(steps) => Ok(steps),
        Err(e) if e.is_upstream() => {
            warn!(error = %e, "roadmap fell back to canonical steps");
            Ok(fallback_steps())
        }
        Err(e) => Err(e),
    }
}

async fn generate_steps<M: ModelClient + ?Sized>(
    model: &M,
    student: &StudentProfile,
    hackathon: &HackathonListing,
) -> Result<Vec<RoadmapStep>> {
    let skills = if student.skills.is_empty() {
        "Not specified".to_string()
    } else {
        student.skills.join(", ")
    };
    let required = if hackathon.skills_required.is_empty() {
        "General".to_string()
    } else {
        hackathon.skills_required.join(", ")
    };

    let prompt = ROADMAP_PROMPT
        .replace("{skills}", &skills)
        .replace("{hack_name}", &hackathon.name)
        .replace("{hack_description}", &hackathon.description)
        .replace("{required_skills}", &required);

    let response = model.complete(&prompt).await?;
    let steps: Vec<RoadmapStep> = structured::parse_array(&response, ROADMAP_SCHEMA)?;

    // The schema bounds each id but cannot express pairwise uniqueness.
    let mut ids: Vec<u8> = steps.iter().map(|s| s.id).collect();
    ids.sort_unstable();
    if ids != [1, 2, 3, 4, 5] {
        return Err(EngineError::UpstreamParse(format!(
            "step ids must be exactly 1..5, got {:?}",
            ids
        )));
    }

    Ok(steps)
}
