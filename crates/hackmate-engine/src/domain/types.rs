use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Expert,
}

impl std::fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl ExperienceLevel {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Beginner" => Some(Self::Beginner),
            "Intermediate" => Some(Self::Intermediate),
            "Expert" => Some(Self::Expert),
            _ => None,
        }
    }
}

/// Created at registration, filled in once at onboarding, read by every
/// specialist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentProfile {
    pub student_id: i64,
    pub name: String,
    pub department: String,
    pub experience_level: ExperienceLevel,
    pub skills: Vec<String>,
    pub interests: Vec<String>,
}

/// Produced by the external ingestion pipeline; immutable to the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HackathonListing {
    pub hackathon_id: i64,
    pub name: String,
    pub description: String,
    pub skills_required: Vec<String>,
    pub deadline: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub team_id: i64,
    pub hackathon_id: i64,
    pub team_name: String,
    /// 6-character alphanumeric code; unique by generator pre-check only.
    pub team_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Leader,
    Member,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Leader" => Some(Self::Leader),
            "Member" => Some(Self::Member),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipationStatus {
    Registered,
    InProgress,
    Submitted,
    Won,
    Lost,
}

impl std::fmt::Display for ParticipationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Registered => "Registered",
            Self::InProgress => "In Progress",
            Self::Submitted => "Submitted",
            Self::Won => "Won",
            Self::Lost => "Lost",
        };
        write!(f, "{}", s)
    }
}

impl ParticipationStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Registered" => Some(Self::Registered),
            "In Progress" => Some(Self::InProgress),
            "Submitted" => Some(Self::Submitted),
            "Won" => Some(Self::Won),
            "Lost" => Some(Self::Lost),
            _ => None,
        }
    }
}

/// Links a student to a hackathon and optionally a team. At most one per
/// (student, hackathon) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participation {
    pub participation_id: i64,
    pub student_id: i64,
    pub hackathon_id: i64,
    pub team_id: Option<i64>,
    pub role: Role,
    pub status: ParticipationStatus,
}

/// A single validated recommendation. `hackathon_id` is always resolved
/// against the live catalog before this type is constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub hackathon_id: i64,
    pub name: String,
    pub description: String,
    /// Match score in [0, 100].
    pub match_score: u8,
    pub reason: String,
}

/// One of exactly five roadmap steps. Coordinates feed the caller-facing
/// visualization path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapStep {
    pub id: u8,
    pub title: String,
    pub description: String,
    /// Visualization coordinate in [100, 700].
    pub x: i32,
    /// Visualization coordinate in [50, 300].
    pub y: i32,
}
