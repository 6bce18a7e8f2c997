use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{EngineError, Result};

const GENAI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Abstract interface to the generative text model. Constructed explicitly
/// and passed in so tests can substitute a canned double.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Sends a prompt to the model and returns the raw response text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Abstract interface to the embedding model used by the similarity index.
/// The same function must be used at ingestion and at query time.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// REST client for the Google Generative Language API.
#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    http: Client,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            model: "gemini-2.5-flash-lite".to_string(),
            http: Client::new(),
        }
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            GENAI_BASE, self.model, self.api_key
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::UpstreamModel(e.to_string()))?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(EngineError::UpstreamModel("model quota exhausted".into()));
        }
        if !response.status().is_success() {
            return Err(EngineError::UpstreamModel(format!(
                "model endpoint returned {}",
                response.status()
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| EngineError::UpstreamModel(e.to_string()))?;

        let text = payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| {
                EngineError::UpstreamModel("response contained no candidate text".into())
            })?
            .to_string();

        debug!(model = %self.model, chars = text.len(), "model response received");
        Ok(text)
    }
}

/// REST client for the `embedContent` endpoint.
#[derive(Clone)]
pub struct GeminiEmbedder {
    api_key: String,
    model: String,
    http: Client,
}

impl GeminiEmbedder {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            model: "models/embedding-001".to_string(),
            http: Client::new(),
        }
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!(
            "{}/{}:embedContent?key={}",
            GENAI_BASE, self.model, self.api_key
        );
        let body = json!({
            "model": self.model,
            "content": { "parts": [{ "text": text }] }
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::UpstreamModel(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EngineError::UpstreamModel(format!(
                "embedding endpoint returned {}",
                response.status()
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| EngineError::UpstreamModel(e.to_string()))?;

        let values = payload["embedding"]["values"]
            .as_array()
            .ok_or_else(|| EngineError::UpstreamModel("response contained no embedding".into()))?;

        Ok(values
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect())
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Canned-response model double for tests.
    #[derive(Clone)]
    pub struct MockModelClient {
        pub responses: Arc<Mutex<VecDeque<Result<String>>>>,
    }

    impl MockModelClient {
        pub fn new(responses: Vec<String>) -> Self {
            Self {
                responses: Arc::new(Mutex::new(responses.into_iter().map(Ok).collect())),
            }
        }

        /// A double whose every call fails like a quota-limited endpoint.
        pub fn failing() -> Self {
            Self {
                responses: Arc::new(Mutex::new(VecDeque::new())),
            }
        }

        pub fn push_err(&self, message: &str) {
            self.responses
                .lock()
                .unwrap()
                .push_back(Err(EngineError::UpstreamModel(message.to_string())));
        }
    }

    #[async_trait]
    impl ModelClient for MockModelClient {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            let mut guard = self.responses.lock().unwrap();
            match guard.pop_front() {
                Some(res) => res,
                None => Err(EngineError::UpstreamModel("mock exhausted".into())),
            }
        }
    }

    /// Deterministic embedder: hashes characters into a small fixed-width
    /// vector so similar strings land near each other only by construction
    /// of the test data.
    #[derive(Clone)]
    pub struct MockEmbedder;

    #[async_trait]
    impl Embedder for MockEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let mut v = vec![0.0f32; 8];
            for (i, b) in text.bytes().enumerate() {
                v[i % 8] += (b as f32) / 255.0;
            }
            Ok(v)
        }
    }
}
