use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EngineConfig {
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_embed_model")]
    pub embed_model: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Number of passages pulled from the similarity index per query.
    #[serde(default = "default_retrieval_k")]
    pub retrieval_k: usize,
}

pub fn default_model() -> String {
    "gemini-2.5-flash-lite".to_string()
}

pub fn default_embed_model() -> String {
    "models/embedding-001".to_string()
}

pub fn default_database_url() -> String {
    "hackmate.db".to_string()
}

pub fn default_retrieval_k() -> usize {
    3
}

impl EngineConfig {
    /// Reads configuration from the environment. `GEMINI_API_KEY` is the
    /// only required variable; everything else has a deployment default.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| EngineError::Config("GEMINI_API_KEY is not set".into()))?;

        let config = Self {
            api_key,
            model: std::env::var("HACKMATE_MODEL").unwrap_or_else(|_| default_model()),
            embed_model: std::env::var("HACKMATE_EMBED_MODEL")
                .unwrap_or_else(|_| default_embed_model()),
            database_url: std::env::var("HACKMATE_DB").unwrap_or_else(|_| default_database_url()),
            retrieval_k: std::env::var("HACKMATE_RETRIEVAL_K")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_retrieval_k),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(EngineError::Config("empty API key".into()));
        }
        if self.model.trim().is_empty() || self.embed_model.trim().is_empty() {
            return Err(EngineError::Config("empty model name".into()));
        }
        if self.retrieval_k == 0 {
            return Err(EngineError::Config(
                "retrieval_k must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
