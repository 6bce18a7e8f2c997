use chrono::{DateTime, Utc};
use sqlx::{
    Pool, Sqlite,
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
};
use std::path::Path;

use crate::domain::types::{
    ExperienceLevel, HackathonListing, Participation, ParticipationStatus, Role, StudentProfile,
    Team,
};
use crate::error::{EngineError, Result};

/// Relational store for students, hackathons, teams, participations and the
/// passage table backing the similarity index. Connections are pooled;
/// every operation draws one for its own scope and releases it on return.
pub struct StateStore {
    pool: Pool<Sqlite>,
}

impl StateStore {
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options).await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Single-connection in-memory store, used by tests.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS students (
                student_id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                department TEXT,
                experience_level TEXT,
                skills TEXT,
                interests TEXT
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS hackathons (
                hackathon_id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                skills_required TEXT NOT NULL,
                deadline TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        // No UNIQUE constraint on team_code: uniqueness is the generator's
        // pre-check only, so the accepted concurrent-commit race stays
        // observable rather than silently prevented.
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS teams (
                team_id INTEGER PRIMARY KEY,
                hackathon_id INTEGER NOT NULL,
                team_name TEXT NOT NULL,
                team_code TEXT NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (hackathon_id) REFERENCES hackathons(hackathon_id)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS participation (
                participation_id INTEGER PRIMARY KEY,
                student_id INTEGER NOT NULL,
                hackathon_id INTEGER NOT NULL,
                team_id INTEGER,
                role TEXT NOT NULL,
                status TEXT NOT NULL,
                FOREIGN KEY (student_id) REFERENCES students(student_id),
                FOREIGN KEY (hackathon_id) REFERENCES hackathons(hackathon_id)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS passages (
                passage_id INTEGER PRIMARY KEY,
                content TEXT NOT NULL,
                embedding TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // --- students ---

    pub async fn insert_student(
        &self,
        name: &str,
        department: &str,
        experience_level: ExperienceLevel,
        skills: &[String],
        interests: &[String],
    ) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO students (name, department, experience_level, skills, interests)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(name)
        .bind(department)
        .bind(experience_level.to_string())
        .bind(serde_json::to_string(skills)?)
        .bind(serde_json::to_string(interests)?)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn student(&self, student_id: i64) -> Result<Option<StudentProfile>> {
        let row: Option<(i64, String, Option<String>, Option<String>, Option<String>, Option<String>)> =
            sqlx::query_as(
                "SELECT student_id, name, department, experience_level, skills, interests
                 FROM students WHERE student_id = ?1",
            )
            .bind(student_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::decode_student).transpose()
    }

    /// Everyone except the requester; the team-formation candidate pool.
    pub async fn students_except(&self, student_id: i64) -> Result<Vec<StudentProfile>> {
        let rows: Vec<(i64, String, Option<String>, Option<String>, Option<String>, Option<String>)> =
            sqlx::query_as(
                "SELECT student_id, name, department, experience_level, skills, interests
                 FROM students WHERE student_id != ?1",
            )
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Self::decode_student).collect()
    }

    pub async fn count_students(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM students")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    fn decode_student(
        row: (i64, String, Option<String>, Option<String>, Option<String>, Option<String>),
    ) -> Result<StudentProfile> {
        let (student_id, name, department, experience, skills, interests) = row;
        Ok(StudentProfile {
            student_id,
            name,
            department: department.unwrap_or_default(),
            experience_level: experience
                .as_deref()
                .and_then(ExperienceLevel::parse)
                .unwrap_or(ExperienceLevel::Beginner),
            skills: decode_string_list(skills)?,
            interests: decode_string_list(interests)?,
        })
    }

    // --- hackathons ---

    pub async fn insert_hackathon(
        &self,
        name: &str,
        description: &str,
        skills_required: &[String],
        deadline: DateTime<Utc>,
    ) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO hackathons (name, description, skills_required, deadline)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(name)
        .bind(description)
        .bind(serde_json::to_string(skills_required)?)
        .bind(deadline.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn hackathon(&self, hackathon_id: i64) -> Result<Option<HackathonListing>> {
        let row: Option<(i64, String, String, String, String)> = sqlx::query_as(
            "SELECT hackathon_id, name, description, skills_required, deadline
             FROM hackathons WHERE hackathon_id = ?1",
        )
        .bind(hackathon_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::decode_hackathon).transpose()
    }

    pub async fn hackathon_by_name(&self, name: &str) -> Result<Option<HackathonListing>> {
        let row: Option<(i64, String, String, String, String)> = sqlx::query_as(
            "SELECT hackathon_id, name, description, skills_required, deadline
             FROM hackathons WHERE name = ?1 COLLATE NOCASE",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::decode_hackathon).transpose()
    }

    pub async fn hackathons_all(&self) -> Result<Vec<HackathonListing>> {
        let rows: Vec<(i64, String, String, String, String)> = sqlx::query_as(
            "SELECT hackathon_id, name, description, skills_required, deadline FROM hackathons",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::decode_hackathon).collect()
    }

    /// Listings whose deadline has not passed.
    pub async fn hackathons_active(&self, now: DateTime<Utc>) -> Result<Vec<HackathonListing>> {
        let rows: Vec<(i64, String, String, String, String)> = sqlx::query_as(
            "SELECT hackathon_id, name, description, skills_required, deadline
             FROM hackathons WHERE deadline >= ?1",
        )
        .bind(now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::decode_hackathon).collect()
    }

    fn decode_hackathon(row: (i64, String, String, String, String)) -> Result<HackathonListing> {
        let (hackathon_id, name, description, skills, deadline) = row;
        Ok(HackathonListing {
            hackathon_id,
            name,
            description,
            skills_required: decode_string_list(Some(skills))?,
            deadline: DateTime::parse_from_rfc3339(&deadline)
                .map_err(|e| EngineError::Decode(format!("bad deadline {:?}: {}", deadline, e)))?
                .with_timezone(&Utc),
        })
    }

    // --- teams ---

    pub async fn team_code_exists(&self, code: &str) -> Result<bool> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM teams WHERE team_code = ?1")
            .bind(code)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0 > 0)
    }

    pub async fn insert_team(
        &self,
        hackathon_id: i64,
        team_name: &str,
        team_code: &str,
    ) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO teams (hackathon_id, team_name, team_code) VALUES (?1, ?2, ?3)",
        )
        .bind(hackathon_id)
        .bind(team_name)
        .bind(team_code)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn team_by_code(&self, code: &str) -> Result<Option<Team>> {
        let row: Option<(i64, i64, String, String)> = sqlx::query_as(
            "SELECT team_id, hackathon_id, team_name, team_code FROM teams WHERE team_code = ?1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(team_id, hackathon_id, team_name, team_code)| Team {
            team_id,
            hackathon_id,
            team_name,
            team_code,
        }))
    }

    // --- participations ---

    /// Registers a student for a hackathon. At most one participation per
    /// (student, hackathon) pair; a second registration is a conflict.
    pub async fn insert_participation(
        &self,
        student_id: i64,
        hackathon_id: i64,
        team_id: Option<i64>,
        role: Role,
        status: ParticipationStatus,
    ) -> Result<i64> {
        if self.participation_for(student_id, hackathon_id).await?.is_some() {
            return Err(EngineError::Conflict(format!(
                "student {} is already registered for hackathon {}",
                student_id, hackathon_id
            )));
        }

        let result = sqlx::query(
            "INSERT INTO participation (student_id, hackathon_id, team_id, role, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(student_id)
        .bind(hackathon_id)
        .bind(team_id)
        .bind(role.to_string())
        .bind(status.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn participation_for(
        &self,
        student_id: i64,
        hackathon_id: i64,
    ) -> Result<Option<Participation>> {
        let row: Option<(i64, i64, i64, Option<i64>, String, String)> = sqlx::query_as(
            "SELECT participation_id, student_id, hackathon_id, team_id, role, status
             FROM participation WHERE student_id = ?1 AND hackathon_id = ?2",
        )
        .bind(student_id)
        .bind(hackathon_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(
            |(participation_id, student_id, hackathon_id, team_id, role, status)| Participation {
                participation_id,
                student_id,
                hackathon_id,
                team_id,
                role: Role::parse(&role).unwrap_or(Role::Member),
                status: ParticipationStatus::parse(&status)
                    .unwrap_or(ParticipationStatus::Registered),
            },
        ))
    }

    pub async fn count_participations(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM participation")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    // --- passages (similarity index) ---

    /// Replaces the whole passage table; the external bulk re-index path.
    pub async fn replace_passages(&self, passages: &[(String, Vec<f32>)]) -> Result<()> {
        sqlx::query("DELETE FROM passages").execute(&self.pool).await?;
        for (content, embedding) in passages {
            sqlx::query("INSERT INTO passages (content, embedding) VALUES (?1, ?2)")
                .bind(content)
                .bind(serde_json::to_string(embedding)?)
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    pub async fn passages_all(&self) -> Result<Vec<(String, Vec<f32>)>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT content, embedding FROM passages")
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter()
            .map(|(content, embedding)| Ok((content, serde_json::from_str(&embedding)?)))
            .collect()
    }
}

fn decode_string_list(raw: Option<String>) -> Result<Vec<String>> {
    match raw {
        Some(s) if !s.is_empty() => Ok(serde_json::from_str(&s)?),
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    async fn seeded_store() -> StateStore {
        let store = StateStore::in_memory().await.unwrap();
        store
            .insert_student(
                "Asha",
                "CSE",
                ExperienceLevel::Intermediate,
                &["Rust".into(), "Python".into()],
                &["AI".into()],
            )
            .await
            .unwrap();
        store
            .insert_hackathon(
                "AI Innovation Challenge",
                "Build something with ML",
                &["Python".into()],
                Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn on_disk_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hackmate.db");

        let store = StateStore::new(&path).await.unwrap();
        store
            .insert_student(
                "Asha",
                "CSE",
                ExperienceLevel::Intermediate,
                &["Rust".into()],
                &["AI".into()],
            )
            .await
            .unwrap();
        drop(store);

        let reopened = StateStore::new(&path).await.unwrap();
        let student = reopened.student(1).await.unwrap().unwrap();
        assert_eq!(student.name, "Asha");
    }

    #[tokio::test]
    async fn student_round_trip() {
        let store = seeded_store().await;
        let student = store.student(1).await.unwrap().unwrap();
        assert_eq!(student.name, "Asha");
        assert_eq!(student.skills, vec!["Rust", "Python"]);
        assert_eq!(student.experience_level, ExperienceLevel::Intermediate);
        assert!(store.student(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn hackathon_lookup_and_deadline_filter() {
        let store = seeded_store().await;
        store
            .insert_hackathon(
                "Legacy Jam",
                "already over",
                &[],
                Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(store.hackathons_all().await.unwrap().len(), 2);
        let active = store.hackathons_active(Utc::now()).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "AI Innovation Challenge");
    }

    #[tokio::test]
    async fn duplicate_registration_is_a_conflict() {
        let store = seeded_store().await;
        store
            .insert_participation(1, 1, None, Role::Leader, ParticipationStatus::Registered)
            .await
            .unwrap();

        let second = store
            .insert_participation(1, 1, None, Role::Member, ParticipationStatus::Registered)
            .await;
        assert!(matches!(second, Err(EngineError::Conflict(_))));
        assert_eq!(store.count_participations().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn team_code_race_is_not_prevented_by_the_schema() {
        // Two requests can both pass the exists check before either commits;
        // the schema deliberately lets both rows land.
        let store = seeded_store().await;
        assert!(!store.team_code_exists("AB12CD").await.unwrap());
        store.insert_team(1, "alpha", "AB12CD").await.unwrap();
        store.insert_team(1, "beta", "AB12CD").await.unwrap();
        assert!(store.team_code_exists("AB12CD").await.unwrap());
    }

    #[tokio::test]
    async fn lookups_by_code_and_name() {
        let store = seeded_store().await;
        store.insert_team(1, "alpha", "XY99ZZ").await.unwrap();

        let team = store.team_by_code("XY99ZZ").await.unwrap().unwrap();
        assert_eq!(team.team_name, "alpha");
        assert!(store.team_by_code("nope").await.unwrap().is_none());

        let hack = store
            .hackathon_by_name("AI Innovation Challenge")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hack.hackathon_id, 1);

        // Model output does not always preserve catalog casing.
        let hack = store
            .hackathon_by_name("ai innovation challenge")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hack.hackathon_id, 1);
    }

    #[tokio::test]
    async fn passages_round_trip() {
        let store = seeded_store().await;
        store
            .replace_passages(&[("chunk one".into(), vec![0.1, 0.2]), ("chunk two".into(), vec![0.3, 0.4])])
            .await
            .unwrap();
        let passages = store.passages_all().await.unwrap();
        assert_eq!(passages.len(), 2);
        assert_eq!(passages[0].0, "chunk one");
        assert_eq!(passages[1].1, vec![0.3, 0.4]);
    }
}
